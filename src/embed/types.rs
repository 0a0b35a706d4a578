//! Synapse embedding types.

use crate::lti::types::LtiSystem;
use crate::realize::types::{Realization, Realizer};
use numr::runtime::Runtime;
use numr::tensor::Tensor;

/// Options for [`SynapseEmbedding`](crate::embed::SynapseEmbedding).
#[derive(Debug, Clone)]
pub struct EmbeddingOptions {
    /// State basis the target is realized in before mapping (default: balanced).
    pub realizer: Realizer,
    /// Highest synapse order accepted (default: 2).
    pub max_synapse_order: usize,
}

impl Default for EmbeddingOptions {
    fn default() -> Self {
        Self {
            realizer: Realizer::Balanced,
            max_synapse_order: 2,
        }
    }
}

/// Weights that make a synapse-filtered population realize a target system.
///
/// Each of the d state dimensions is routed through its own copy of the
/// synapse. Its input is
/// ```text
/// v = recurrent · x + input · u + Σ_k input_derivatives[k] · u^(k+1)
/// ```
/// where u^(k) is the k-th derivative of the input (continuous time) or the
/// input k samples ahead (discrete time), and the target output is
/// `readout · x + feedthrough · u`.
#[derive(Debug, Clone)]
pub struct WeightMapping<R: Runtime> {
    /// W_rec (d × d).
    pub recurrent: Tensor<R>,
    /// W_in (d × 1).
    pub input: Tensor<R>,
    /// Higher input taps (d × 1 each), empty for first-order synapses.
    pub input_derivatives: Vec<Tensor<R>>,
    /// Output matrix of the realized target (1 × d).
    pub readout: Tensor<R>,
    /// Feedthrough of the target.
    pub feedthrough: f64,
    /// Realization of the target the weights refer to.
    pub realization: Realization<R>,
    /// The synapse the weights were computed for.
    pub synapse: LtiSystem<R>,
    /// Simulation step for discrete-time mappings, `None` in continuous time.
    pub dt: Option<f64>,
}

impl<R: Runtime> WeightMapping<R> {
    /// Number of state dimensions d.
    pub fn dimensions(&self) -> usize {
        self.recurrent.shape()[0]
    }

    /// True when the mapping needs nothing but the input itself.
    pub fn is_first_order(&self) -> bool {
        self.input_derivatives.is_empty()
    }
}
