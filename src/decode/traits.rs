//! Geometric decoder solver trait.

use crate::decode::error::DecodeResult;
use crate::decode::piecewise::PiecewisePolynomialApprox;
use crate::decode::target::TargetFunction;
use crate::decode::types::{Decoder, GeometricSolverOptions, Population};
use numr::runtime::Runtime;
use numr::tensor::Tensor;

/// Decoders from exact integrals over the population's tuning curves.
pub trait GeometricDecoderAlgorithms<R: Runtime> {
    /// Piecewise-quadratic approximation of every neuron's response curve.
    ///
    /// The active domain of a neuron is the part of [−1, 1] (normalised
    /// units) where its drive exceeds the firing threshold; it ends at the
    /// intercept on one side and at the saturation point ±1 on the other.
    /// The domain is cut into
    /// `min(max_segments, max(1, ⌊width / min_segment_width⌋))` equal
    /// segments and each segment carries the second-order Taylor
    /// polynomial of the response at its midpoint.
    fn piecewise_approximations(
        &self,
        population: &Population<R>,
        options: &GeometricSolverOptions,
    ) -> DecodeResult<Vec<PiecewisePolynomialApprox>>;

    /// Regularised least-squares decoders for `target`.
    ///
    /// # Algorithm
    ///
    /// With pᵢ the piecewise approximations and L = 2 · radius:
    /// ```text
    /// Gᵢⱼ = (n_samples / L) ∫ pᵢ pⱼ dx + δᵢⱼ n_samples (regularization · max_rate)²
    /// Uᵢ  = (n_samples / L) ∫ pᵢ f dx
    /// G d = U   (Cholesky)
    /// ```
    /// which is what a sampled solver with `n_samples` uniform evaluation
    /// points converges to. Gram entries are exact integrals over segment
    /// overlaps. Polynomial targets are integrated exactly; smooth targets
    /// by Gauss–Legendre quadrature on each segment.
    ///
    /// # Accuracy
    ///
    /// The Taylor pieces are least accurate in the first segment past each
    /// neuron's threshold, where the response of threshold-type families
    /// bends sharply. That bias replaces the sampling noise of a sampled
    /// solver; refine with a smaller `min_segment_width`.
    ///
    /// # Errors
    ///
    /// - `NonPolynomialTarget` when a piecewise target does not cover the
    ///   represented interval, or a smooth target is not locally polynomial
    ///   on some segment (8- and 12-point rules disagree beyond
    ///   `local_rtol`).
    /// - `NotPositiveDefinite` when the regularised Gram matrix cannot be
    ///   factored (e.g. a silent neuron with `regularization` = 0).
    fn solve_geometric(
        &self,
        population: &Population<R>,
        target: &TargetFunction,
        options: &GeometricSolverOptions,
    ) -> DecodeResult<Decoder<R>>;

    /// Decoded estimate Σᵢ dᵢ aᵢ(x) (+ bias) at `points` `[m]`, using the
    /// exact rates.
    fn predict(
        &self,
        population: &Population<R>,
        decoder: &Decoder<R>,
        points: &Tensor<R>,
    ) -> DecodeResult<Tensor<R>>;
}
