//! Padé approximation of a pure delay.

use crate::delay::types::PadeDelay;
use crate::lti::error::LtiResult;
use numr::runtime::Runtime;
use numr::tensor::Tensor;

/// Rational approximants of e^{−θs}.
pub trait DelayApproximation<R: Runtime> {
    /// Strictly proper [order−1 / order] Padé approximant in the
    /// shifted-Legendre basis.
    ///
    /// # Algorithm
    ///
    /// ```text
    /// A_ij = (2i+1)/θ · { −1           i < j
    ///                   { (−1)^(i−j+1)  i ≥ j
    /// B_i  = (2i+1)(−1)^i / θ
    /// C_i  = 1,   D = 0
    /// ```
    /// The basis keeps the state matrix well conditioned for orders where
    /// the companion form is not.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` for θ ≤ 0 or order 0, `UnstableApproximant` if the
    /// resulting system fails the Hurwitz test.
    fn pade_delay(&self, theta: f64, order: usize) -> LtiResult<PadeDelay<R>>;

    /// General [p/q] Padé approximant (p ≤ q) in time-normalised
    /// controllable canonical form.
    ///
    /// # Algorithm
    ///
    /// With σ = θs, ascending coefficients
    /// ```text
    /// num_k = (−1)^k p! (p+q−k)! / ((p+q)! k! (p−k)!)
    /// den_k =        q! (p+q−k)! / ((p+q)! k! (q−k)!)
    /// ```
    /// are realized in companion form and A, B are scaled by 1/θ.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` for θ ≤ 0, q = 0 or p > q, `UnstableApproximant`
    /// when the denominator is not Hurwitz.
    fn pade_delay_pq(&self, theta: f64, p: usize, q: usize) -> LtiResult<PadeDelay<R>>;

    /// |H(jω) − e^{−jωθ}| of the [order−1 / order] approximant.
    ///
    /// The error depends on ω and θ only through their product, so
    /// `theta_times_freq` holds the values of θω `[n]`.
    fn pade_delay_error(&self, theta_times_freq: &Tensor<R>, order: usize) -> LtiResult<Tensor<R>>;
}
