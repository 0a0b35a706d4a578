//! Error types for decoder solvers.

use std::fmt;

/// Result type for decoder operations.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Errors that can occur while solving for decoders.
#[derive(Debug, Clone)]
pub enum DecodeError {
    /// The target is not polynomial on some integration interval.
    NonPolynomialTarget { context: String },

    /// Inconsistent or out-of-range population parameters.
    InvalidPopulation { context: String },

    /// Invalid parameter value.
    InvalidParameter { parameter: String, message: String },

    /// The regularised Gram matrix could not be Cholesky-factored.
    NotPositiveDefinite { context: String },

    /// Error from underlying numr operation.
    NumrError(String),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPolynomialTarget { context } => {
                write!(f, "Target is not piecewise polynomial: {}", context)
            }
            Self::InvalidPopulation { context } => {
                write!(f, "Invalid population: {}", context)
            }
            Self::InvalidParameter { parameter, message } => {
                write!(f, "Invalid parameter '{}': {}", parameter, message)
            }
            Self::NotPositiveDefinite { context } => {
                write!(f, "Gram matrix is not positive definite: {}", context)
            }
            Self::NumrError(msg) => {
                write!(f, "numr error: {}", msg)
            }
        }
    }
}

impl std::error::Error for DecodeError {}

impl From<numr::error::Error> for DecodeError {
    fn from(err: numr::error::Error) -> Self {
        Self::NumrError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DecodeError::NonPolynomialTarget {
            context: "neuron 3, segment [0.1, 0.2]".to_string(),
        };
        assert!(err.to_string().contains("piecewise polynomial"));
        assert!(err.to_string().contains("neuron 3"));

        let err = DecodeError::InvalidParameter {
            parameter: "max_segments".to_string(),
            message: "must be at least 1".to_string(),
        };
        assert!(err.to_string().contains("'max_segments'"));
    }
}
