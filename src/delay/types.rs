//! Delay approximation and window basis types.

use crate::lti::types::LtiSystem;
use numr::runtime::Runtime;
use numr::tensor::Tensor;

/// State basis of a Padé delay system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayForm {
    /// Shifted-Legendre basis: state i carries the projection of the last θ
    /// seconds of input onto the i-th shifted Legendre polynomial.
    Legendre,
    /// Time-normalised controllable canonical form: the companion form of
    /// H(θs), with A and B scaled by 1/θ.
    Controllable,
}

/// A [p/q] Padé approximant of the pure delay e^{−θs}.
///
/// # Order Tradeoff
///
/// The approximant matches the first p + q + 1 Taylor coefficients of
/// e^{−θs}. Its error stays small for frequencies up to roughly
/// ω ≈ (p + q) / (2θ) and grows quickly beyond that; a higher order widens
/// that band and sharpens the impulse response around θ, at the price of q
/// states and a stiffer A (eigenvalues scale like q²/θ).
#[derive(Debug, Clone)]
pub struct PadeDelay<R: Runtime> {
    /// The approximating system (order q).
    pub system: LtiSystem<R>,
    /// Delay length in seconds.
    pub theta: f64,
    /// Numerator degree.
    pub p: usize,
    /// Denominator degree (the system order).
    pub q: usize,
    /// State basis of `system`.
    pub form: DelayForm,
}

impl<R: Runtime> PadeDelay<R> {
    /// True when the approximant has no feedthrough (p < q).
    pub fn is_strictly_proper(&self) -> bool {
        self.p < self.q
    }
}

/// Sampled basis functions of a delay system's state over the window.
///
/// Row i of `basis` is the readout that recovers u(t − rᵢθ) from the
/// realized state, so a window w sampled at the points `points` satisfies
/// w ≈ basis · x.
#[derive(Debug, Clone)]
pub struct BasisSet<R: Runtime> {
    /// Basis functions `[n_samples, d]`.
    pub basis: Tensor<R>,
    /// Moore-Penrose pseudo-inverse `[d, n_samples]`; `inverse · basis ≈ I`.
    pub inverse: Tensor<R>,
    /// Relative delays rᵢ ∈ [0, 1] `[n_samples]`.
    pub points: Tensor<R>,
}

impl<R: Runtime> BasisSet<R> {
    /// Number of window samples.
    pub fn n_samples(&self) -> usize {
        self.basis.shape()[0]
    }

    /// State dimension.
    pub fn dimensions(&self) -> usize {
        self.basis.shape()[1]
    }
}

/// Training data for decoding a function of the window from the state.
#[derive(Debug, Clone)]
pub struct WindowDecoding<R: Runtime> {
    /// State vectors representing each window `[m, d]`.
    pub eval_points: Tensor<R>,
    /// Target function evaluated on each window `[m]`.
    pub targets: Tensor<R>,
}
