//! Realization algorithm traits.

use crate::lti::error::LtiResult;
use crate::lti::types::{DiscreteLtiSystem, LtiSystem};
use crate::realize::types::{BalancedTransform, L1Norm, L1NormOptions, Realization, Realizer};
use numr::runtime::Runtime;
use numr::tensor::Tensor;

/// Gramians, norms and change-of-basis transforms.
pub trait RealizationAlgorithms<R: Runtime> {
    /// Re-express `sys` in the basis chosen by `realizer`.
    ///
    /// The realized system has the same transfer function. Transforms whose
    /// condition number exceeds 1e12 are rejected with `NonMinimalSystem`.
    /// `Balanced`, `H2Norm` and `L1Norm` require an asymptotically stable
    /// system (`UnstableSystem` otherwise); `Balanced` also requires a
    /// minimal one.
    fn realize(&self, sys: &LtiSystem<R>, realizer: Realizer) -> LtiResult<Realization<R>>;

    /// Apply a caller-supplied transform x' = T x.
    fn realize_with(&self, sys: &LtiSystem<R>, transform: &Tensor<R>) -> LtiResult<Realization<R>>;

    /// Controllability gramian P: A P + P Aᵀ + B Bᵀ = 0.
    fn control_gram(&self, sys: &LtiSystem<R>) -> LtiResult<Tensor<R>>;

    /// Observability gramian Q: Aᵀ Q + Q A + Cᵀ C = 0.
    fn observe_gram(&self, sys: &LtiSystem<R>) -> LtiResult<Tensor<R>>;

    /// Hankel singular values, descending.
    fn hankel_singular_values(&self, sys: &LtiSystem<R>) -> LtiResult<Tensor<R>>;

    /// Balancing transform.
    ///
    /// # Algorithm
    ///
    /// With P = Lr Lrᵀ and Q = Lo Loᵀ (Cholesky) and the SVD
    /// Loᵀ Lr = U Σ Vᵀ:
    /// ```text
    /// T   = Σ^{-1/2} Uᵀ Loᵀ
    /// T⁻¹ = Lr V Σ^{-1/2}
    /// ```
    /// so that T P Tᵀ = T⁻ᵀ Q T⁻¹ = Σ.
    fn balanced_transformation(&self, sys: &LtiSystem<R>) -> LtiResult<BalancedTransform<R>>;

    /// H2 norm of each state's impulse response: sqrt(diag P).
    fn state_norm(&self, sys: &LtiSystem<R>) -> LtiResult<Tensor<R>>;

    /// Discrete-time counterpart of [`state_norm`](Self::state_norm), from
    /// A P Aᵀ − P + B Bᵀ = 0.
    fn state_norm_discrete(&self, sys: &DiscreteLtiSystem<R>) -> LtiResult<Tensor<R>>;

    /// L1 norm of the output impulse response.
    ///
    /// Exact interval integrals of the sampled impulse response give a lower
    /// bound; a per-interval sign test with Cauchy-Schwarz on the remaining
    /// intervals, plus an exponentially weighted tail bound, gives an upper
    /// one. Sampling is refined until the bracket meets `options.rtol` or the
    /// sample count would exceed `options.max_length`.
    fn l1_norm(&self, sys: &LtiSystem<R>, options: &L1NormOptions) -> LtiResult<L1Norm>;

    /// L1 norm of each state's impulse response (bracket midpoints).
    fn state_l1_norm(&self, sys: &LtiSystem<R>, options: &L1NormOptions) -> LtiResult<Tensor<R>>;
}
