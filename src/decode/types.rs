//! Decoder solver types.

use crate::decode::error::{DecodeError, DecodeResult};
use crate::decode::neurons::NeuronType;
use numr::runtime::Runtime;
use numr::tensor::Tensor;

/// A one-dimensional population of rate neurons of one family.
///
/// Neuron i responds to a represented value x ∈ [−radius, radius] with
/// G(gainᵢ · eᵢ · x / radius + biasᵢ), eᵢ = ±1.
#[derive(Debug, Clone)]
pub struct Population<R: Runtime> {
    /// Response family shared by every neuron.
    pub neuron: NeuronType,
    /// Gains `[n_neurons]`.
    pub gains: Tensor<R>,
    /// Biases `[n_neurons]`.
    pub biases: Tensor<R>,
    /// Encoders `[n_neurons]`, each +1 or −1.
    pub encoders: Tensor<R>,
}

impl<R: Runtime> Population<R> {
    /// Create a population from explicit gains and biases.
    pub fn new(
        neuron: NeuronType,
        gains: Tensor<R>,
        biases: Tensor<R>,
        encoders: Tensor<R>,
    ) -> DecodeResult<Self> {
        neuron.validate()?;
        let n = gains.shape().first().copied().unwrap_or(0);
        for (name, t) in [("gains", &gains), ("biases", &biases), ("encoders", &encoders)] {
            if t.shape() != [n] {
                return Err(DecodeError::InvalidPopulation {
                    context: format!("{} must have shape [{}], got {:?}", name, n, t.shape()),
                });
            }
        }
        if n == 0 {
            return Err(DecodeError::InvalidPopulation {
                context: "population has no neurons".to_string(),
            });
        }
        let g: Vec<f64> = gains.to_vec();
        if let Some(i) = g.iter().position(|v| !(*v > 0.0) || !v.is_finite()) {
            return Err(DecodeError::InvalidPopulation {
                context: format!("gain of neuron {} must be positive, got {}", i, g[i]),
            });
        }
        let b: Vec<f64> = biases.to_vec();
        if let Some(i) = b.iter().position(|v| !v.is_finite()) {
            return Err(DecodeError::InvalidPopulation {
                context: format!("bias of neuron {} must be finite, got {}", i, b[i]),
            });
        }
        let e: Vec<f64> = encoders.to_vec();
        if let Some(i) = e.iter().position(|v| *v != 1.0 && *v != -1.0) {
            return Err(DecodeError::InvalidPopulation {
                context: format!("encoder of neuron {} must be +1 or -1, got {}", i, e[i]),
            });
        }
        Ok(Self {
            neuron,
            gains,
            biases,
            encoders,
        })
    }

    /// Create a population from maximum rates and intercepts (both in
    /// normalised units, along each neuron's encoder).
    pub fn from_tuning(
        neuron: NeuronType,
        max_rates: &[f64],
        intercepts: &[f64],
        encoders: &[f64],
        device: &R::Device,
    ) -> DecodeResult<Self> {
        let n = max_rates.len();
        if intercepts.len() != n || encoders.len() != n {
            return Err(DecodeError::InvalidPopulation {
                context: format!(
                    "tuning lengths differ: {} max rates, {} intercepts, {} encoders",
                    n,
                    intercepts.len(),
                    encoders.len()
                ),
            });
        }
        let (gains, biases): (Vec<f64>, Vec<f64>) = max_rates
            .iter()
            .zip(intercepts)
            .map(|(&m, &i)| neuron.gain_bias(m, i))
            .collect::<DecodeResult<Vec<_>>>()?
            .into_iter()
            .unzip();
        Self::new(
            neuron,
            Tensor::from_slice(&gains, &[n], device),
            Tensor::from_slice(&biases, &[n], device),
            Tensor::from_slice(encoders, &[n], device),
        )
    }

    /// Number of neurons.
    pub fn len(&self) -> usize {
        self.gains.shape()[0]
    }

    /// True when there are no neurons.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Options for the geometric decoder solver.
#[derive(Debug, Clone)]
pub struct GeometricSolverOptions {
    /// Regularisation relative to the largest rate, as in the sampled L2
    /// solver (default: 0.1).
    pub regularization: f64,
    /// Number of evaluation points of the sampled solver this solve should
    /// be comparable to (default: 750).
    pub n_samples: usize,
    /// Upper bound on segments per neuron (default: 32).
    pub max_segments: usize,
    /// Lower bound on segment width in normalised units (default: 0.05).
    pub min_segment_width: f64,
    /// Radius of the represented interval (default: 1.0).
    pub radius: f64,
    /// Add a constant unit and return its weight as a decoded bias
    /// (default: false).
    pub with_bias: bool,
    /// Relative disagreement between the 8- and 12-point Gauss rules above
    /// which a smooth target is rejected on a segment (default: 1e-6).
    pub local_rtol: f64,
}

impl Default for GeometricSolverOptions {
    fn default() -> Self {
        Self {
            regularization: 0.1,
            n_samples: 750,
            max_segments: 32,
            min_segment_width: 0.05,
            radius: 1.0,
            with_bias: false,
            local_rtol: 1e-6,
        }
    }
}

/// Readout weights of a population.
#[derive(Debug, Clone)]
pub struct Decoder<R: Runtime> {
    /// One weight per neuron `[n_neurons]`.
    pub weights: Tensor<R>,
    /// Decoded constant offset, when solved with a bias unit.
    pub bias: Option<f64>,
    /// Radius of the represented interval the decoder was solved on.
    pub radius: f64,
}
