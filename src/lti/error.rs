//! Error types for LTI system construction, realization and embedding.

use std::fmt;

/// Result type for LTI operations.
pub type LtiResult<T> = Result<T, LtiError>;

/// Errors that can occur while building or transforming LTI systems.
#[derive(Debug, Clone)]
pub enum LtiError {
    /// Malformed or improper system description (leading denominator zero,
    /// numerator order above denominator order, mismatched matrix shapes).
    DegenerateSystem { context: String },

    /// The system is not controllable and observable, or a realization
    /// transform is numerically singular.
    NonMinimalSystem { context: String },

    /// A delay approximant of the requested order would not be strictly
    /// stable.
    UnstableApproximant {
        theta: f64,
        p: usize,
        q: usize,
        context: String,
    },

    /// The synapse cannot host the requested dynamics.
    IncompatibleSynapse { context: String },

    /// The operation requires an asymptotically stable system.
    UnstableSystem { context: String },

    /// Invalid input array size or dimensions.
    InvalidInput { context: String },

    /// Invalid parameter value.
    InvalidParameter { parameter: String, message: String },

    /// Error from underlying numr operation.
    NumrError(String),
}

impl fmt::Display for LtiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DegenerateSystem { context } => {
                write!(f, "Degenerate system: {}", context)
            }
            Self::NonMinimalSystem { context } => {
                write!(f, "Non-minimal system: {}", context)
            }
            Self::UnstableApproximant {
                theta,
                p,
                q,
                context,
            } => {
                write!(
                    f,
                    "Unstable [{}/{}] delay approximant for theta = {:.6}: {}",
                    p, q, theta, context
                )
            }
            Self::IncompatibleSynapse { context } => {
                write!(f, "Incompatible synapse: {}", context)
            }
            Self::UnstableSystem { context } => {
                write!(f, "Unstable system: {}", context)
            }
            Self::InvalidInput { context } => {
                write!(f, "Invalid input: {}", context)
            }
            Self::InvalidParameter { parameter, message } => {
                write!(f, "Invalid parameter '{}': {}", parameter, message)
            }
            Self::NumrError(msg) => {
                write!(f, "numr error: {}", msg)
            }
        }
    }
}

impl std::error::Error for LtiError {}

impl From<numr::error::Error> for LtiError {
    fn from(err: numr::error::Error) -> Self {
        Self::NumrError(err.to_string())
    }
}
