//! Independent per-channel filtering.
//!
//! Each channel owns its own discretized filter and state slot; channels never
//! interact, so a bank of heterogeneous synapses (one per neuron, say) is an
//! array of slots rather than one coupled multi-channel system.

use crate::lti::cpu::helpers::{host_tensor, DiscreteData, StateSpaceData};
use crate::lti::error::{LtiError, LtiResult};
use crate::lti::types::LtiSystem;
use numr::runtime::cpu::{CpuDevice, CpuRuntime};
use numr::runtime::Runtime;
use numr::tensor::Tensor;

/// One channel: a discretized filter and its current state.
#[derive(Debug, Clone)]
struct FilterSlot {
    filter: DiscreteData,
    state: Vec<f64>,
}

/// Array of independent discretized filters stepped in lockstep.
///
/// # Example
///
/// ```ignore
/// use lindyn::lti::{synapses, FilterBank};
///
/// let synapses = vec![synapses::lowpass(0.005, &device)?, synapses::lowpass(0.02, &device)?];
/// let mut bank = FilterBank::new(&synapses, 1e-3)?;
/// let y = bank.step(&[1.0, 1.0])?;
/// ```
#[derive(Debug, Clone)]
pub struct FilterBank {
    slots: Vec<FilterSlot>,
    dt: f64,
}

impl FilterBank {
    /// Discretize every channel's filter at `dt` with zeroed state.
    pub fn new(filters: &[LtiSystem<CpuRuntime>], dt: f64) -> LtiResult<Self> {
        let slots = filters
            .iter()
            .map(|sys| {
                let client = CpuRuntime::default_client(sys.a.device());
                let filter = DiscreteData::zoh(&client, &StateSpaceData::from_system(sys), dt)?;
                let state = vec![0.0; filter.n];
                Ok(FilterSlot { filter, state })
            })
            .collect::<LtiResult<Vec<_>>>()?;
        Ok(Self { slots, dt })
    }

    /// The same filter replicated over `n_channels` channels.
    pub fn uniform(filter: &LtiSystem<CpuRuntime>, n_channels: usize, dt: f64) -> LtiResult<Self> {
        let client = CpuRuntime::default_client(filter.a.device());
        let discrete = DiscreteData::zoh(&client, &StateSpaceData::from_system(filter), dt)?;
        let slots = (0..n_channels)
            .map(|_| FilterSlot {
                state: vec![0.0; discrete.n],
                filter: discrete.clone(),
            })
            .collect();
        Ok(Self { slots, dt })
    }

    /// Number of channels.
    pub fn num_channels(&self) -> usize {
        self.slots.len()
    }

    /// Sampling period shared by all channels.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Zero every channel's state.
    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            slot.state.iter_mut().for_each(|x| *x = 0.0);
        }
    }

    /// Current C·x of every channel, excluding feedthrough.
    ///
    /// For strictly proper filters this is the output the next [`step`]
    /// will emit before the input arrives, which is what a feedback loop
    /// needs to compute that input.
    ///
    /// [`step`]: Self::step
    pub fn state_output(&self) -> Vec<f64> {
        self.slots
            .iter()
            .map(|slot| slot.filter.state_output(&slot.state))
            .collect()
    }

    /// Feed one sample per channel; returns y[k] and advances every state.
    pub fn step(&mut self, inputs: &[f64]) -> LtiResult<Vec<f64>> {
        if inputs.len() != self.slots.len() {
            return Err(LtiError::InvalidInput {
                context: format!(
                    "filter bank has {} channels, got {} inputs",
                    self.slots.len(),
                    inputs.len()
                ),
            });
        }
        Ok(self
            .slots
            .iter_mut()
            .zip(inputs)
            .map(|(slot, &u)| slot.filter.step(&mut slot.state, u))
            .collect())
    }

    /// Filter a whole block `[n_samples, n_channels]`, continuing from the
    /// current states.
    pub fn run(
        &mut self,
        signals: &Tensor<CpuRuntime>,
        device: &CpuDevice,
    ) -> LtiResult<Tensor<CpuRuntime>> {
        let n_channels = self.slots.len();
        if signals.ndim() != 2 || signals.shape()[1] != n_channels {
            return Err(LtiError::InvalidInput {
                context: format!(
                    "expected signals of shape [n_samples, {}], got {:?}",
                    n_channels,
                    signals.shape()
                ),
            });
        }
        let n_samples = signals.shape()[0];
        let data: Vec<f64> = signals.to_vec();
        let mut out = Vec::with_capacity(data.len());
        for row in data.chunks(n_channels.max(1)).take(n_samples) {
            out.extend(self.step(row)?);
        }
        Ok(host_tensor(&out, &[n_samples, n_channels], device))
    }
}
