//! Window basis functions of a delay system.

use crate::delay::types::{BasisSet, PadeDelay, WindowDecoding};
use crate::lti::error::LtiResult;
use crate::realize::types::Realization;
use numr::runtime::Runtime;
use numr::tensor::Tensor;

/// Representing and decoding functions of the last θ seconds of input.
///
/// A delay system of order d summarises its input window u(t − rθ),
/// r ∈ [0, 1], in d numbers. These operations expose that summary: which
/// readout recovers a given point of the window, which window shapes the
/// state spans, and how to turn a function of the window into a function of
/// the state.
pub trait WindowBasisAlgorithms<R: Runtime> {
    /// Output row C(r) `[1, d]` with C(r) x(t) ≈ u(t − rθ), in the basis of
    /// `delay.system`.
    ///
    /// `C(1)` equals the system's own output matrix. Requires a strictly
    /// proper delay and 0 ≤ r ≤ 1.
    fn delay_readout(&self, delay: &PadeDelay<R>, r: f64) -> LtiResult<Tensor<R>>;

    /// Sample the readouts of the realized system at rᵢ = i/(n_samples − 1).
    ///
    /// `realization` must be a realization of `delay.system`; the basis is
    /// expressed in its state coordinates, `basis = B_canonical · T⁻¹`, so
    /// changing the realization moves the basis with it.
    fn window_basis(
        &self,
        delay: &PadeDelay<R>,
        realization: &Realization<R>,
        n_samples: usize,
    ) -> LtiResult<BasisSet<R>>;

    /// Project each window onto the state and evaluate `target` on it.
    ///
    /// * `windows` - `[m, n_samples]`, sampled at `basis.points` (column 0 is
    ///   the current input, the last column the input θ seconds ago)
    ///
    /// The result pairs each state `x = B⁺ w` with `target(w)`, ready to be
    /// handed to a decoder solver as evaluation points and targets.
    fn decode<F>(
        &self,
        basis: &BasisSet<R>,
        windows: &Tensor<R>,
        target: F,
    ) -> LtiResult<WindowDecoding<R>>
    where
        F: Fn(&[f64]) -> f64;

    /// State readout `[1, d]` for the linear functional Σ wᵢ u(t − rᵢθ).
    fn functional_readout(&self, basis: &BasisSet<R>, weights: &Tensor<R>) -> LtiResult<Tensor<R>>;

    /// States `[m, d]` that best represent each window `[m, n_samples]`.
    fn project_window(&self, basis: &BasisSet<R>, windows: &Tensor<R>) -> LtiResult<Tensor<R>>;

    /// Windows `[m, n_samples]` represented by each state `[m, d]`.
    fn reconstruct_window(&self, basis: &BasisSet<R>, states: &Tensor<R>) -> LtiResult<Tensor<R>>;
}
