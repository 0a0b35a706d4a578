//! Realization types.

use crate::lti::types::LtiSystem;
use numr::runtime::Runtime;
use numr::tensor::Tensor;

/// Criterion used to choose a state basis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Realizer {
    /// Keep the given basis (T = I).
    Identity,
    /// Balanced realization: both gramians equal diag(σ), the Hankel
    /// singular values.
    #[default]
    Balanced,
    /// Scale each state to unit H2 norm (unit-variance response to white
    /// noise).
    H2Norm,
    /// Scale each state so its impulse response has unit L1 norm (the state
    /// never exceeds 1 in magnitude for inputs bounded by 1).
    L1Norm,
    /// Controllable canonical (companion) form.
    ControllableCanonical,
}

/// A system expressed in a new basis, with the transform back to the
/// reference system.
///
/// With reference (A, B, C, D) and x' = T x:
/// ```text
/// A' = T A T⁻¹,   B' = T B,   C' = C T⁻¹,   D' = D
/// ```
#[derive(Debug, Clone)]
pub struct Realization<R: Runtime> {
    /// The realized system.
    pub system: LtiSystem<R>,
    /// T (d × d).
    pub transform: Tensor<R>,
    /// T⁻¹ (d × d).
    pub inverse: Tensor<R>,
    /// Criterion that produced this realization.
    pub realizer: Realizer,
    /// 2-norm condition number of T.
    pub condition: f64,
}

/// Output of the balancing computation.
#[derive(Debug, Clone)]
pub struct BalancedTransform<R: Runtime> {
    /// T (d × d).
    pub transform: Tensor<R>,
    /// T⁻¹ (d × d).
    pub inverse: Tensor<R>,
    /// Hankel singular values, descending [d].
    pub hankel: Tensor<R>,
}

/// Options for L1-norm estimation.
#[derive(Debug, Clone)]
pub struct L1NormOptions {
    /// Target relative half-width of the certified bracket, (upper − lower) / 2 lower
    /// (default: 1e-6).
    pub rtol: f64,
    /// Largest number of impulse samples per refinement (default: 2^18).
    pub max_length: usize,
}

impl Default for L1NormOptions {
    fn default() -> Self {
        Self {
            rtol: 1e-6,
            max_length: 1 << 18,
        }
    }
}

/// L1 norm estimate with certified bounds.
///
/// The true value ∫|h(t)| dt + |D| always lies in `[lower, upper]`.
#[derive(Debug, Clone, Copy)]
pub struct L1Norm {
    /// Midpoint of the bracket.
    pub norm: f64,
    /// (upper − lower) / 2 relative to the impulse part of `lower`.
    pub rel_err: f64,
    /// Certified lower bound.
    pub lower: f64,
    /// Certified upper bound.
    pub upper: f64,
}
