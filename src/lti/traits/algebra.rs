//! Algebra and analysis of continuous-time LTI systems.

use crate::lti::error::LtiResult;
use crate::lti::types::LtiSystem;
use num_complex::Complex64;
use numr::algorithm::polynomial::types::PolynomialRoots;
use numr::runtime::Runtime;

/// Composition and analysis of LTI systems.
///
/// Compositions never drop modes: when the result is not minimal (a pole
/// cancels a zero), a warning is logged and the full system is returned.
pub trait LtiAlgebra<R: Runtime> {
    /// Series composition: the input passes through `first`, then `second`.
    ///
    /// The transfer function is `second(s) · first(s)`. States are stacked as
    /// `[x_first; x_second]`, giving the block lower-triangular matrix
    /// ```text
    /// A = | A₁      0  |    B = | B₁    |
    ///     | B₂C₁    A₂ |        | B₂D₁  |
    ///
    /// C = | D₂C₁   C₂ |     D = D₂D₁
    /// ```
    fn series(&self, first: &LtiSystem<R>, second: &LtiSystem<R>) -> LtiResult<LtiSystem<R>>;

    /// Parallel composition: both systems see the same input and their
    /// outputs are summed. Block-diagonal state augmentation.
    fn parallel(&self, lhs: &LtiSystem<R>, rhs: &LtiSystem<R>) -> LtiResult<LtiSystem<R>>;

    /// Poles: roots of det(sI − A).
    fn poles(&self, sys: &LtiSystem<R>) -> LtiResult<PolynomialRoots<R>>;

    /// Transmission zeros: roots of the transfer-function numerator.
    fn zeros(&self, sys: &LtiSystem<R>) -> LtiResult<PolynomialRoots<R>>;

    /// True when every pole lies strictly in the open left half-plane.
    ///
    /// Decided by the Lyapunov criterion rather than by root finding, which
    /// stays reliable for the high-order delay systems.
    fn is_stable(&self, sys: &LtiSystem<R>) -> LtiResult<bool>;

    /// True when (A, B) is controllable and (A, C) is observable.
    ///
    /// Ranks are read from orthonormalised Krylov sequences.
    fn is_minimal(&self, sys: &LtiSystem<R>) -> LtiResult<bool>;

    /// Frequency response H(jω) = C (jωI − A)⁻¹ B + D at each ω in rad/s.
    fn freqresp(&self, sys: &LtiSystem<R>, omegas: &[f64]) -> LtiResult<Vec<Complex64>>;

    /// Steady-state gain H(0) = D − C A⁻¹ B.
    ///
    /// Fails with `UnstableSystem` when A is singular (a pole at the origin).
    fn dc_gain(&self, sys: &LtiSystem<R>) -> LtiResult<f64>;
}
