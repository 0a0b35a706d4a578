//! Linear dynamical systems for neural populations.
//!
//! lindyn maps continuous-time LTI systems onto recurrently connected,
//! synapse-filtered populations and solves for readout weights of those
//! populations analytically.
//!
//! # Modules
//!
//! - [`lti`] - State-space and transfer-function systems, their algebra and
//!   simulation
//! - [`realize`] - Changes of state basis (balanced, H2/L1-normalised,
//!   controllable canonical) plus Gramians and system norms
//! - [`delay`] - Padé approximants of a pure delay and the window basis that
//!   decodes functions of the delayed history
//! - [`embed`] - Recurrent and input weights that realize a target system
//!   through a synapse
//! - [`decode`] - Geometric decoder solver over piecewise-quadratic tuning
//!   curves
//!
//! # Architecture
//!
//! Every concern is a trait generic over a `numr` [`Runtime`](numr::runtime::Runtime)
//! and implemented for [`CpuClient`](numr::runtime::cpu::CpuClient). Matrices
//! cross the API as row-major `f64` tensors; all results are immutable values
//! and no operation keeps state between calls.
//!
//! ```ignore
//! use lindyn::delay::DelayApproximation;
//! use lindyn::embed::{EmbeddingOptions, SynapseEmbedding};
//! use lindyn::lti::synapses;
//! use numr::runtime::cpu::{CpuClient, CpuDevice};
//!
//! let device = CpuDevice::new();
//! let client = CpuClient::new(device.clone());
//!
//! let delay = client.pade_delay(0.1, 4)?;
//! let synapse = synapses::lowpass(0.02, &device)?;
//! let mapping = client.embed(&delay.system, &synapse, &EmbeddingOptions::default())?;
//! ```

pub(crate) mod common;
pub mod decode;
pub mod delay;
pub mod embed;
pub mod lti;
pub mod realize;
