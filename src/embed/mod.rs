//! Embedding LTI dynamics into synapse-filtered populations.
//!
//! A population whose input reaches it through a synapse H(s) cannot simply
//! integrate: every signal it feeds back is filtered by H first. Given a
//! target system and the synapse, [`SynapseEmbedding`] solves for the
//! recurrent and input weights under which "synapse with feedback" has
//! exactly the target's transfer function.
//!
//! # Example
//!
//! ```ignore
//! use lindyn::delay::DelayApproximation;
//! use lindyn::embed::{EmbeddingOptions, SynapseEmbedding};
//! use lindyn::lti::synapses;
//!
//! let delay = client.pade_delay(0.1, 4)?;
//! let tau = synapses::lowpass(0.02, &device)?;
//! let mapping = client.embed(&delay.system, &tau, &EmbeddingOptions::default())?;
//! ```

mod cpu;
pub mod traits;
pub mod types;

pub use traits::SynapseEmbedding;
pub use types::{EmbeddingOptions, WeightMapping};
