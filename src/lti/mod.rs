//! Continuous-time linear time-invariant systems.
//!
//! # Representations
//!
//! - [`LtiSystem`]: state-space quadruple (A, B, C, D), the canonical form
//! - [`TransferFunction`]: numerator/denominator polynomials in s
//! - [`DiscreteLtiSystem`]: zero-order-hold discretization
//!
//! # Algebra
//!
//! Via [`LtiAlgebra`]:
//! - [`series`](LtiAlgebra::series), [`parallel`](LtiAlgebra::parallel) - composition by state augmentation
//! - [`poles`](LtiAlgebra::poles), [`zeros`](LtiAlgebra::zeros), [`is_stable`](LtiAlgebra::is_stable), [`is_minimal`](LtiAlgebra::is_minimal)
//! - [`freqresp`](LtiAlgebra::freqresp), [`dc_gain`](LtiAlgebra::dc_gain)
//!
//! # Simulation
//!
//! Via [`LtiSimulation`]: `discretize`, `dlsim`, `filter`, `impulse_response`,
//! `step_response`. Independent per-channel filtering lives in [`FilterBank`].
//!
//! # Example
//!
//! ```ignore
//! use lindyn::lti::{synapses, LtiAlgebra, LtiSimulation};
//! use numr::runtime::cpu::{CpuClient, CpuDevice};
//!
//! let device = CpuDevice::new();
//! let client = CpuClient::new(device.clone());
//!
//! let fast = synapses::lowpass(0.005, &device)?;
//! let slow = synapses::lowpass(0.1, &device)?;
//! let cascade = client.series(&fast, &slow)?;
//! let h = client.impulse_response(&cascade, 1000, 1e-3)?;
//! ```

mod cpu;
pub mod error;
pub mod filter_bank;
pub mod synapses;
pub mod traits;
pub mod types;

pub(crate) use cpu::algebra::{evaluate_at, is_minimal_data};
pub(crate) use cpu::helpers::{host_tensor, transfer_coefficients, DiscreteData, StateSpaceData};

pub use error::{LtiError, LtiResult};
pub use filter_bank::FilterBank;
pub use traits::{LtiAlgebra, LtiSimulation, StateSpaceConversions};
pub use types::{DiscreteLtiSystem, FilterResult, LtiSystem, TransferFunction};
