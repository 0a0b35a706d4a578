//! Synapse embedding trait.

use crate::embed::types::{EmbeddingOptions, WeightMapping};
use crate::lti::error::LtiResult;
use crate::lti::types::LtiSystem;
use numr::runtime::Runtime;

/// Map LTI dynamics onto populations driven through a synapse.
pub trait SynapseEmbedding<R: Runtime> {
    /// Weights that make `synapse`-filtered feedback realize `target`.
    ///
    /// # Algorithm
    ///
    /// The target is realized with `options.realizer` to (A, B, C, D). For a
    /// synapse 1 / Σᵢ cᵢ sⁱ of order m:
    /// ```text
    /// W_rec = Σᵢ cᵢ Aⁱ
    /// B_k   = Σ_{i>k} cᵢ A^(i−1−k) B,   k = 0..m−1
    /// ```
    /// with W_in = B_0 and B_1.. weighting the input derivatives. A lowpass
    /// 1/(τs + 1) gives W_rec = τA + I and W_in = τB.
    ///
    /// # Errors
    ///
    /// `IncompatibleSynapse` when the synapse is of order 0 or above
    /// `options.max_synapse_order`, is not strictly stable, has finite
    /// zeros, or when the feedback loop would have an unstable mode the
    /// target does not have.
    fn embed(
        &self,
        target: &LtiSystem<R>,
        synapse: &LtiSystem<R>,
        options: &EmbeddingOptions,
    ) -> LtiResult<WeightMapping<R>>;

    /// Discrete-time counterpart of [`embed`](Self::embed) for a simulator
    /// stepping at `dt`.
    ///
    /// Both the realized target and the synapse are discretized by
    /// zero-order hold and the mapping is solved in z: with the synapse
    /// 1 / Σᵢ c̄ᵢ zⁱ, W_rec = Σᵢ c̄ᵢ Adⁱ and B_k = Σ_{i>k} c̄ᵢ Ad^(i−1−k) Bd.
    /// A lowpass with pole a = e^{−dt/τ} gives W_rec = (Ad − aI)/(1 − a)
    /// and W_in = Bd/(1 − a).
    ///
    /// Zero-order hold gives higher-order synapses a zero, so in practice
    /// only first-order synapses embed exactly in discrete time.
    fn embed_discrete(
        &self,
        target: &LtiSystem<R>,
        synapse: &LtiSystem<R>,
        dt: f64,
        options: &EmbeddingOptions,
    ) -> LtiResult<WeightMapping<R>>;
}
