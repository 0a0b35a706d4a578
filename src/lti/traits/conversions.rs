//! State-space / transfer-function conversion traits.

use crate::lti::error::LtiResult;
use crate::lti::types::{LtiSystem, TransferFunction};
use numr::runtime::Runtime;

/// Conversions between transfer-function and state-space descriptions.
///
/// All backends implementing these conversions MUST use the same algorithms
/// so that round trips agree bit-for-bit across runtimes.
pub trait StateSpaceConversions<R: Runtime> {
    /// Convert a transfer function to controllable canonical form.
    ///
    /// # Algorithm
    ///
    /// With the denominator normalised to s^n + a₁s^{n-1} + ... + aₙ and the
    /// numerator split as D·den(s) + r(s), deg r < n:
    /// ```text
    /// A = | 0   1   0  ...  0  |     B = | 0 |
    ///     | :   :   :   ⋱   :  |         | : |
    ///     | 0   0   0  ...  1  |         | 0 |
    ///     |-aₙ -aₙ₋₁   ... -a₁ |         | 1 |
    ///
    /// C = | r₀  r₁  ...  rₙ₋₁ |          D = b₀ / a₀
    /// ```
    /// where rₖ is the coefficient of s^k in r(s).
    fn tf2ss(&self, tf: &TransferFunction<R>) -> LtiResult<LtiSystem<R>>;

    /// Convert state-space to a transfer function.
    ///
    /// # Algorithm
    ///
    /// The denominator is det(sI − A) (Faddeev-LeVerrier). The numerator uses
    /// the rank-one determinant identity
    /// ```text
    /// C adj(sI − A) B = det(sI − A + BC) − det(sI − A)
    /// ```
    /// so num(s) = det(sI − (A − BC)) + (D − 1)·det(sI − A).
    fn ss2tf(&self, sys: &LtiSystem<R>) -> LtiResult<TransferFunction<R>>;
}
