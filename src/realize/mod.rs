//! State-space realizations.
//!
//! A transfer function has infinitely many state-space realizations related by
//! x' = T x. The choice of T matters once the state is represented by
//! something with finite precision or bounded range (e.g. neural
//! populations): it decides how large each state gets and how much each one
//! contributes to the output.
//!
//! # Realizers
//!
//! | Realizer | Transform |
//! |----------|-----------|
//! | [`Realizer::Identity`] | T = I |
//! | [`Realizer::Balanced`] (default) | both gramians equal diag(σ) |
//! | [`Realizer::H2Norm`] | each state has unit H2 norm |
//! | [`Realizer::L1Norm`] | each state's impulse response has unit L1 norm |
//! | [`Realizer::ControllableCanonical`] | companion form |
//!
//! # Example
//!
//! ```ignore
//! use lindyn::realize::{RealizationAlgorithms, Realizer};
//!
//! let real = client.realize(&sys, Realizer::Balanced)?;
//! let hsv = client.hankel_singular_values(&sys)?;
//! ```

mod cpu;
pub mod traits;
pub mod types;

pub(crate) use cpu::realize::{realize_data, RealizedData};

pub use traits::RealizationAlgorithms;
pub use types::{BalancedTransform, L1Norm, L1NormOptions, Realization, Realizer};
