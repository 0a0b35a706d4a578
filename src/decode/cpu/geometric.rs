//! CPU implementation of the geometric decoder solver.
//!
//! # Why CPU-Only?
//!
//! The work is a sweep over a few thousand quadratic pieces; only the final
//! n_neurons × n_neurons Cholesky solve goes through numr.

use crate::common::linalg;
use crate::common::polynomial;
use crate::common::quadrature::GaussLegendre;
use crate::decode::error::{DecodeError, DecodeResult};
use crate::decode::neurons::NeuronType;
use crate::decode::piecewise::{overlap_integral, PiecewisePolynomialApprox, PolySegment};
use crate::decode::target::TargetFunction;
use crate::decode::traits::GeometricDecoderAlgorithms;
use crate::decode::types::{Decoder, GeometricSolverOptions, Population};
use crate::lti::host_tensor;
use numr::runtime::cpu::{CpuClient, CpuRuntime};
use numr::tensor::Tensor;

/// Gauss–Legendre rule sizes compared on each segment for smooth targets.
const COARSE_RULE: usize = 8;
const FINE_RULE: usize = 12;

impl GeometricDecoderAlgorithms<CpuRuntime> for CpuClient {
    fn piecewise_approximations(
        &self,
        population: &Population<CpuRuntime>,
        options: &GeometricSolverOptions,
    ) -> DecodeResult<Vec<PiecewisePolynomialApprox>> {
        validate_options(options)?;
        let data = PopulationData::new(population)?;
        Ok(build_approximations(&data, options))
    }

    fn solve_geometric(
        &self,
        population: &Population<CpuRuntime>,
        target: &TargetFunction,
        options: &GeometricSolverOptions,
    ) -> DecodeResult<Decoder<CpuRuntime>> {
        validate_options(options)?;
        let data = PopulationData::new(population)?;
        let n = data.len();

        let max_rate = data.max_rate();
        if !(max_rate > 0.0) || !max_rate.is_finite() {
            return Err(DecodeError::InvalidPopulation {
                context: "no neuron fires on the represented interval".to_string(),
            });
        }

        let mut units: Vec<Vec<PolySegment>> = build_approximations(&data, options)
            .into_iter()
            .map(|a| a.segments)
            .collect();
        if options.with_bias {
            units.push(constant_unit(max_rate, options));
        }
        let k = units.len();

        let scale = options.n_samples as f64 / 2.0;
        let mut gram = vec![0.0; k * k];
        for i in 0..k {
            for j in i..k {
                let g = scale * overlap_integral(&units[i], &units[j]);
                gram[i * k + j] = g;
                gram[j * k + i] = g;
            }
        }
        let ridge = options.n_samples as f64 * (options.regularization * max_rate).powi(2);
        for i in 0..k {
            gram[i * k + i] += ridge;
        }

        let projection: Vec<f64> = match target.normalized_pieces(options.radius)? {
            Some(pieces) => units.iter().map(|u| overlap_integral(u, &pieces)).collect(),
            None => smooth_projection(
                &units,
                |u| target.eval(options.radius * u),
                options.local_rtol,
            )?,
        };
        let rhs: Vec<f64> = projection.iter().map(|v| v * scale).collect();

        let l = linalg::cholesky(self, &gram, k).map_err(|_| DecodeError::NotPositiveDefinite {
            context: format!(
                "{} units with regularization {}; a unit may be silent on the whole interval",
                k, options.regularization
            ),
        })?;
        let mut weights = linalg::cholesky_solve(self, &l, &rhs, k)?;

        let bias = if options.with_bias {
            weights.pop().map(|w| w * max_rate)
        } else {
            None
        };

        tracing::debug!(
            neurons = n,
            segments = units.iter().map(Vec::len).sum::<usize>(),
            regularization = options.regularization,
            max_rate,
            with_bias = options.with_bias,
            "geometric decoder solve"
        );

        Ok(Decoder {
            weights: host_tensor(&weights, &[n], population.gains.device()),
            bias,
            radius: options.radius,
        })
    }

    fn predict(
        &self,
        population: &Population<CpuRuntime>,
        decoder: &Decoder<CpuRuntime>,
        points: &Tensor<CpuRuntime>,
    ) -> DecodeResult<Tensor<CpuRuntime>> {
        let data = PopulationData::new(population)?;
        let w: Vec<f64> = decoder.weights.to_vec();
        if decoder.weights.shape() != [data.len()] {
            return Err(DecodeError::InvalidPopulation {
                context: format!(
                    "decoder has shape {:?} but the population has {} neurons",
                    decoder.weights.shape(),
                    data.len()
                ),
            });
        }
        if !(decoder.radius > 0.0) || !decoder.radius.is_finite() {
            return Err(DecodeError::InvalidParameter {
                parameter: "radius".to_string(),
                message: format!("must be positive and finite, got {}", decoder.radius),
            });
        }
        if points.shape().len() != 1 {
            return Err(DecodeError::InvalidParameter {
                parameter: "points".to_string(),
                message: format!("must be one-dimensional, got shape {:?}", points.shape()),
            });
        }

        let x: Vec<f64> = points.to_vec();
        let offset = decoder.bias.unwrap_or(0.0);
        let y: Vec<f64> = x
            .iter()
            .map(|&x| {
                let u = x / decoder.radius;
                (0..data.len())
                    .map(|i| w[i] * data.neuron.rate(data.drive(i, u)))
                    .sum::<f64>()
                    + offset
            })
            .collect();
        Ok(host_tensor(&y, &[y.len()], points.device()))
    }
}

// ============================================================================
// Implementation Functions (CPU-only, not generic)
// ============================================================================

/// Host copy of a population.
struct PopulationData {
    neuron: NeuronType,
    gains: Vec<f64>,
    biases: Vec<f64>,
    encoders: Vec<f64>,
}

impl PopulationData {
    fn new(population: &Population<CpuRuntime>) -> DecodeResult<Self> {
        // Fields are public, so re-run the constructor checks.
        let checked = Population::new(
            population.neuron,
            population.gains.clone(),
            population.biases.clone(),
            population.encoders.clone(),
        )?;
        Ok(Self {
            neuron: checked.neuron,
            gains: checked.gains.to_vec(),
            biases: checked.biases.to_vec(),
            encoders: checked.encoders.to_vec(),
        })
    }

    fn len(&self) -> usize {
        self.gains.len()
    }

    fn drive(&self, i: usize, u: f64) -> f64 {
        self.gains[i] * self.encoders[i] * u + self.biases[i]
    }

    /// Largest rate on [−1, 1]; every family is non-decreasing in its
    /// drive, so each neuron peaks at u = encoder.
    fn max_rate(&self) -> f64 {
        (0..self.len())
            .map(|i| self.neuron.rate(self.drive(i, self.encoders[i])))
            .fold(0.0, f64::max)
    }

    /// Part of [−1, 1] where neuron i fires, or `None` if it never does.
    fn active_domain(&self, i: usize) -> Option<(f64, f64)> {
        let threshold = match self.neuron.threshold() {
            Some(th) => th,
            None => return Some((-1.0, 1.0)),
        };
        let intercept = (threshold - self.biases[i]) / self.gains[i];
        let (lo, hi) = if self.encoders[i] > 0.0 {
            (intercept.max(-1.0), 1.0)
        } else {
            (-1.0, (-intercept).min(1.0))
        };
        (hi > lo).then_some((lo, hi))
    }
}

fn validate_options(options: &GeometricSolverOptions) -> DecodeResult<()> {
    let invalid = |parameter: &str, message: String| {
        Err(DecodeError::InvalidParameter {
            parameter: parameter.to_string(),
            message,
        })
    };
    if !(options.regularization >= 0.0) || !options.regularization.is_finite() {
        return invalid(
            "regularization",
            format!("must be non-negative, got {}", options.regularization),
        );
    }
    if options.n_samples == 0 {
        return invalid("n_samples", "must be at least 1".to_string());
    }
    if options.max_segments == 0 {
        return invalid("max_segments", "must be at least 1".to_string());
    }
    if !(options.min_segment_width > 0.0) {
        return invalid(
            "min_segment_width",
            format!("must be positive, got {}", options.min_segment_width),
        );
    }
    if !(options.radius > 0.0) || !options.radius.is_finite() {
        return invalid(
            "radius",
            format!("must be positive and finite, got {}", options.radius),
        );
    }
    if !(options.local_rtol > 0.0) {
        return invalid(
            "local_rtol",
            format!("must be positive, got {}", options.local_rtol),
        );
    }
    Ok(())
}

/// Equal-width cuts of [lo, hi], bounded by the option thresholds.
fn segment_bounds(lo: f64, hi: f64, options: &GeometricSolverOptions) -> Vec<(f64, f64)> {
    let count = ((hi - lo) / options.min_segment_width).floor() as usize;
    let count = count.clamp(1, options.max_segments);
    let width = (hi - lo) / count as f64;
    (0..count)
        .map(|s| {
            let a = lo + s as f64 * width;
            let b = if s + 1 == count {
                hi
            } else {
                lo + (s + 1) as f64 * width
            };
            (a, b)
        })
        .collect()
}

fn build_approximations(
    data: &PopulationData,
    options: &GeometricSolverOptions,
) -> Vec<PiecewisePolynomialApprox> {
    (0..data.len())
        .map(|i| {
            let (gain, encoder) = (data.gains[i], data.encoders[i]);
            let Some((lo, hi)) = data.active_domain(i) else {
                tracing::trace!(neuron = i, "silent on the represented interval");
                return PiecewisePolynomialApprox {
                    encoder,
                    lo: 1.0,
                    hi: 1.0,
                    segments: Vec::new(),
                };
            };

            let segments: Vec<PolySegment> = segment_bounds(lo, hi, options)
                .into_iter()
                .map(|(a, b)| {
                    let m = 0.5 * (a + b);
                    let (g, d1, d2) = data.neuron.rate_derivatives(data.drive(i, m));
                    PolySegment {
                        lo: a,
                        hi: b,
                        coeffs: polynomial::taylor_quadratic(
                            g,
                            d1 * gain * encoder,
                            d2 * gain * gain,
                            m,
                        ),
                    }
                })
                .collect();
            tracing::trace!(neuron = i, lo, hi, segments = segments.len(), "piecewise response");

            PiecewisePolynomialApprox {
                encoder,
                lo,
                hi,
                segments,
            }
        })
        .collect()
}

/// Bias unit: constant `value` over [−1, 1], cut like a neuron.
fn constant_unit(value: f64, options: &GeometricSolverOptions) -> Vec<PolySegment> {
    segment_bounds(-1.0, 1.0, options)
        .into_iter()
        .map(|(lo, hi)| PolySegment {
            lo,
            hi,
            coeffs: [value, 0.0, 0.0],
        })
        .collect()
}

/// ∫ pᵢ f du for a non-polynomial f, checked per segment.
fn smooth_projection<F>(units: &[Vec<PolySegment>], f: F, rtol: f64) -> DecodeResult<Vec<f64>>
where
    F: Fn(f64) -> f64,
{
    let coarse = GaussLegendre::new(COARSE_RULE);
    let fine = GaussLegendre::new(FINE_RULE);
    units
        .iter()
        .enumerate()
        .map(|(i, segments)| {
            segments.iter().try_fold(0.0, |acc, s| {
                let integrand = |u: f64| s.eval(u) * f(u);
                let rough = coarse.integrate(integrand, s.lo, s.hi);
                let precise = fine.integrate(integrand, s.lo, s.hi);
                let magnitude = fine.integrate(|u| integrand(u).abs(), s.lo, s.hi);
                let gap = (rough - precise).abs();
                if gap <= rtol * magnitude {
                    Ok(acc + precise)
                } else {
                    Err(DecodeError::NonPolynomialTarget {
                        context: format!(
                            "unit {}, segment [{:.4}, {:.4}]: quadrature rules differ by {:.3e}",
                            i, s.lo, s.hi, gap
                        ),
                    })
                }
            })
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::dense;
    use numr::runtime::cpu::CpuDevice;

    fn setup() -> (CpuClient, CpuDevice) {
        let device = CpuDevice::new();
        let client = CpuClient::new(device.clone());
        (client, device)
    }

    const RELU: NeuronType = NeuronType::RectifiedLinear { amplitude: 1.0 };
    const LIF: NeuronType = NeuronType::LifRate {
        tau_rc: 0.02,
        tau_ref: 0.002,
    };

    fn exact_options() -> GeometricSolverOptions {
        GeometricSolverOptions {
            regularization: 0.0,
            ..Default::default()
        }
    }

    fn lif_population(device: &CpuDevice) -> Population<CpuRuntime> {
        let n = 12;
        let intercepts: Vec<f64> = (0..n).map(|i| -0.9 + 1.7 * i as f64 / (n - 1) as f64).collect();
        let rates: Vec<f64> = (0..n).map(|i| 200.0 + 15.0 * i as f64).collect();
        let encoders: Vec<f64> = (0..n).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        Population::from_tuning(LIF, &rates, &intercepts, &encoders, device).unwrap()
    }

    fn points(device: &CpuDevice, xs: &[f64]) -> Tensor<CpuRuntime> {
        Tensor::<CpuRuntime>::from_slice(xs, &[xs.len()], device)
    }

    #[test]
    fn test_relu_pieces_are_exact() {
        let (client, device) = setup();

        let pop = Population::from_tuning(
            RELU,
            &[100.0, 150.0],
            &[-0.6, 0.15],
            &[1.0, -1.0],
            &device,
        )
        .unwrap();
        let opts = GeometricSolverOptions {
            min_segment_width: 0.25,
            ..Default::default()
        };
        let approx = client.piecewise_approximations(&pop, &opts).unwrap();
        assert_eq!(approx[0].n_segments(), 6);
        assert_eq!(approx[1].n_segments(), 3);

        let gains: Vec<f64> = pop.gains.to_vec();
        let biases: Vec<f64> = pop.biases.to_vec();
        for k in 0..=40 {
            let u = -1.0 + k as f64 / 20.0;
            for (i, e) in [1.0, -1.0].iter().enumerate() {
                let exact = RELU.rate(gains[i] * e * u + biases[i]);
                assert!((approx[i].eval(u) - exact).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_active_domain_follows_encoder() {
        let (client, device) = setup();

        let pop =
            Population::from_tuning(LIF, &[300.0, 300.0], &[0.2, 0.2], &[1.0, -1.0], &device)
                .unwrap();
        let approx = client
            .piecewise_approximations(&pop, &GeometricSolverOptions::default())
            .unwrap();

        assert!((approx[0].lo - 0.2).abs() < 1e-12);
        assert_eq!(approx[0].hi, 1.0);
        assert_eq!(approx[1].lo, -1.0);
        assert!((approx[1].hi + 0.2).abs() < 1e-12);
        assert_eq!(approx[0].eval(0.1), 0.0);
        assert_eq!(approx[1].eval(-0.1), 0.0);

        let capped = GeometricSolverOptions {
            max_segments: 4,
            ..Default::default()
        };
        let approx = client.piecewise_approximations(&pop, &capped).unwrap();
        assert!(approx.iter().all(|a| a.n_segments() == 4));
    }

    #[test]
    fn test_lif_pieces_track_rates_past_the_threshold_segment() {
        let (client, device) = setup();

        let pop = lif_population(&device);
        let approx = client
            .piecewise_approximations(&pop, &GeometricSolverOptions::default())
            .unwrap();
        let gains: Vec<f64> = pop.gains.to_vec();
        let biases: Vec<f64> = pop.biases.to_vec();

        for (i, a) in approx.iter().enumerate() {
            let max_rate = LIF.rate(gains[i] + biases[i]);
            let n = a.n_segments();
            // The segment touching the threshold is the least accurate one.
            let skip = if a.encoder > 0.0 { 0 } else { n - 1 };
            for (s, seg) in a.segments.iter().enumerate() {
                if s == skip {
                    continue;
                }
                for k in 0..=10 {
                    let u = seg.lo + (seg.hi - seg.lo) * k as f64 / 10.0;
                    let exact = LIF.rate(gains[i] * a.encoder * u + biases[i]);
                    assert!((seg.eval(u) - exact).abs() < 5e-3 * max_rate);
                }
            }
        }
    }

    #[test]
    fn test_linear_span_decoded_exactly() {
        let (client, device) = setup();

        // k(1 + u) and k(1 − u) span every linear function.
        let pop = Population::from_tuning(
            RELU,
            &[200.0, 200.0],
            &[-1.0, -1.0],
            &[1.0, -1.0],
            &device,
        )
        .unwrap();
        let opts = GeometricSolverOptions {
            radius: 2.0,
            ..exact_options()
        };
        let dec = client
            .solve_geometric(&pop, &TargetFunction::identity(), &opts)
            .unwrap();
        assert_eq!(dec.radius, 2.0);
        assert!(dec.bias.is_none());

        let xs = [-2.0, -0.5, 0.0, 1.5, 2.0];
        let y: Vec<f64> = client.predict(&pop, &dec, &points(&device, &xs)).unwrap().to_vec();
        for (x, y) in xs.iter().zip(&y) {
            assert!((x - y).abs() < 1e-9);
        }
    }

    #[test]
    fn test_piecewise_target() {
        let (client, device) = setup();

        let pop = Population::from_tuning(
            RELU,
            &[100.0, 100.0],
            &[0.0, 0.0],
            &[1.0, -1.0],
            &device,
        )
        .unwrap();
        let abs = TargetFunction::PiecewisePolynomial {
            breakpoints: vec![-1.0, 0.0, 1.0],
            pieces: vec![vec![0.0, -1.0], vec![0.0, 1.0]],
        };
        let dec = client.solve_geometric(&pop, &abs, &exact_options()).unwrap();

        let xs = [-0.7, -0.1, 0.4, 1.0];
        let y: Vec<f64> = client.predict(&pop, &dec, &points(&device, &xs)).unwrap().to_vec();
        for (x, y) in xs.iter().zip(&y) {
            assert!((x.abs() - y).abs() < 1e-9);
        }
    }

    #[test]
    fn test_polynomial_and_smooth_targets_agree() {
        let (client, device) = setup();

        let pop = lif_population(&device);
        let opts = GeometricSolverOptions::default();
        let poly = client
            .solve_geometric(&pop, &TargetFunction::Polynomial(vec![0.1, 0.0, 1.0]), &opts)
            .unwrap();
        let smooth = client
            .solve_geometric(&pop, &TargetFunction::smooth(|x| 0.1 + x * x), &opts)
            .unwrap();

        let a: Vec<f64> = poly.weights.to_vec();
        let b: Vec<f64> = smooth.weights.to_vec();
        let scale = a.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        for (x, y) in a.iter().zip(&b) {
            assert!((x - y).abs() < 1e-9 * scale);
        }
    }

    #[test]
    fn test_discontinuous_target_rejected() {
        let (client, device) = setup();

        // Domain [−0.33, 1] is cut into segments of width ~0.051, one of
        // which straddles the jump at 0.
        let pop = Population::from_tuning(RELU, &[100.0], &[-0.33], &[1.0], &device).unwrap();
        let sign = TargetFunction::smooth(|x: f64| if x < 0.0 { -1.0 } else { 1.0 });
        match client.solve_geometric(&pop, &sign, &GeometricSolverOptions::default()) {
            Err(DecodeError::NonPolynomialTarget { context }) => {
                assert!(context.contains("unit 0"));
            }
            other => panic!("expected NonPolynomialTarget, got {:?}", other),
        }

        let short = TargetFunction::PiecewisePolynomial {
            breakpoints: vec![-0.5, 1.0],
            pieces: vec![vec![1.0]],
        };
        assert!(matches!(
            client.solve_geometric(&pop, &short, &GeometricSolverOptions::default()),
            Err(DecodeError::NonPolynomialTarget { .. })
        ));
    }

    #[test]
    fn test_bias_unit() {
        let (client, device) = setup();

        let pop = Population::from_tuning(RELU, &[100.0], &[-1.0], &[1.0], &device).unwrap();
        let opts = GeometricSolverOptions {
            with_bias: true,
            ..exact_options()
        };
        // 3 + 2x = w · 50(1 + x) + b  ⇒  b = 1
        let dec = client
            .solve_geometric(&pop, &TargetFunction::Polynomial(vec![3.0, 2.0]), &opts)
            .unwrap();
        assert_eq!(dec.weights.shape(), &[1]);
        assert!((dec.bias.unwrap() - 1.0).abs() < 1e-9);

        let y: Vec<f64> = client
            .predict(&pop, &dec, &points(&device, &[0.5]))
            .unwrap()
            .to_vec();
        assert!((y[0] - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_regularization_shrinks_decoders() {
        let (client, device) = setup();

        let pop = lif_population(&device);
        let norm = |reg: f64| {
            let opts = GeometricSolverOptions {
                regularization: reg,
                ..Default::default()
            };
            let w: Vec<f64> = client
                .solve_geometric(&pop, &TargetFunction::identity(), &opts)
                .unwrap()
                .weights
                .to_vec();
            dense::dot(&w, &w).sqrt()
        };
        assert!(norm(0.2) < norm(0.05));
        assert!(norm(0.05) < norm(0.01));
    }

    #[test]
    fn test_invalid_inputs() {
        let (client, device) = setup();

        let pop = lif_population(&device);
        let target = TargetFunction::identity();
        for opts in [
            GeometricSolverOptions {
                max_segments: 0,
                ..Default::default()
            },
            GeometricSolverOptions {
                radius: -1.0,
                ..Default::default()
            },
            GeometricSolverOptions {
                min_segment_width: 0.0,
                ..Default::default()
            },
            GeometricSolverOptions {
                regularization: f64::NAN,
                ..Default::default()
            },
        ] {
            assert!(matches!(
                client.solve_geometric(&pop, &target, &opts),
                Err(DecodeError::InvalidParameter { .. })
            ));
        }

        // Drive 0.5u + 0.4 never reaches the LIF threshold.
        let silent = Population::new(
            LIF,
            Tensor::<CpuRuntime>::from_slice(&[0.5, 2.0], &[2], &device),
            Tensor::<CpuRuntime>::from_slice(&[0.4, 1.5], &[2], &device),
            Tensor::<CpuRuntime>::from_slice(&[1.0, 1.0], &[2], &device),
        )
        .unwrap();
        assert!(matches!(
            client.solve_geometric(&silent, &target, &exact_options()),
            Err(DecodeError::NotPositiveDefinite { .. })
        ));
        let dec = client
            .solve_geometric(&silent, &target, &GeometricSolverOptions::default())
            .unwrap();
        let w: Vec<f64> = dec.weights.to_vec();
        assert_eq!(w[0], 0.0);

        let other = lif_population(&device);
        let wrong = Decoder {
            weights: Tensor::<CpuRuntime>::from_slice(&[1.0, 2.0], &[2], &device),
            bias: None,
            radius: 1.0,
        };
        assert!(matches!(
            client.predict(&other, &wrong, &points(&device, &[0.0])),
            Err(DecodeError::InvalidPopulation { .. })
        ));
    }

    #[test]
    fn test_population_rejects_non_finite_bias() {
        let (client, device) = setup();

        let gains = Tensor::<CpuRuntime>::from_slice(&[1.0, 2.0], &[2], &device);
        let encoders = Tensor::<CpuRuntime>::from_slice(&[1.0, -1.0], &[2], &device);
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let biases = Tensor::<CpuRuntime>::from_slice(&[0.5, bad], &[2], &device);
            assert!(matches!(
                Population::new(LIF, gains.clone(), biases, encoders.clone()),
                Err(DecodeError::InvalidPopulation { .. })
            ));
        }

        // Public fields are re-checked before solving.
        let mut pop = lif_population(&device);
        let n = pop.biases.shape()[0];
        pop.biases = Tensor::<CpuRuntime>::from_slice(&vec![f64::NAN; n], &[n], &device);
        let target = TargetFunction::identity();
        assert!(matches!(
            client.solve_geometric(&pop, &target, &GeometricSolverOptions::default()),
            Err(DecodeError::InvalidPopulation { .. })
        ));
    }
}
