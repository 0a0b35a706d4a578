//! CPU implementation of discretization and simulation.
//!
//! # Why CPU-Only?
//!
//! State-space simulation is inherently sequential:
//!
//! ```text
//! x[k+1] = Ad·x[k] + Bd·u[k]
//! y[k]   = C·x[k] + D·u[k]
//! ```
//!
//! Each state depends on the previous one, so there is nothing to
//! parallelise across samples.

use crate::lti::cpu::helpers::{host_tensor, DiscreteData, StateSpaceData};
use crate::lti::error::{LtiError, LtiResult};
use crate::lti::traits::simulation::LtiSimulation;
use crate::lti::types::{DiscreteLtiSystem, FilterResult, LtiSystem};
use numr::runtime::cpu::{CpuClient, CpuDevice, CpuRuntime};
use numr::tensor::Tensor;

impl LtiSimulation<CpuRuntime> for CpuClient {
    fn discretize(
        &self,
        sys: &LtiSystem<CpuRuntime>,
        dt: f64,
    ) -> LtiResult<DiscreteLtiSystem<CpuRuntime>> {
        let data = DiscreteData::zoh(self, &StateSpaceData::from_system(sys), dt)?;
        Ok(data.to_system(sys.a.device()))
    }

    fn dlsim(
        &self,
        sys: &DiscreteLtiSystem<CpuRuntime>,
        u: &Tensor<CpuRuntime>,
        x0: Option<&Tensor<CpuRuntime>>,
    ) -> LtiResult<FilterResult<CpuRuntime>> {
        dlsim_impl(&DiscreteData::from_system(sys), u, x0, sys.a.device())
    }

    fn filter(
        &self,
        sys: &LtiSystem<CpuRuntime>,
        signal: &Tensor<CpuRuntime>,
        dt: f64,
        initial_state: Option<&Tensor<CpuRuntime>>,
    ) -> LtiResult<FilterResult<CpuRuntime>> {
        let data = DiscreteData::zoh(self, &StateSpaceData::from_system(sys), dt)?;
        dlsim_impl(&data, signal, initial_state, sys.a.device())
    }

    fn impulse_response(
        &self,
        sys: &LtiSystem<CpuRuntime>,
        n_steps: usize,
        dt: f64,
    ) -> LtiResult<Tensor<CpuRuntime>> {
        let data = DiscreteData::zoh(self, &StateSpaceData::from_system(sys), dt)?;
        let mut u = vec![0.0; n_steps];
        if let Some(first) = u.first_mut() {
            *first = 1.0 / dt;
        }
        Ok(host_tensor(
            &run(&data, &u, vec![0.0; data.n]),
            &[n_steps],
            sys.a.device(),
        ))
    }

    fn step_response(
        &self,
        sys: &LtiSystem<CpuRuntime>,
        n_steps: usize,
        dt: f64,
    ) -> LtiResult<Tensor<CpuRuntime>> {
        let data = DiscreteData::zoh(self, &StateSpaceData::from_system(sys), dt)?;
        let u = vec![1.0; n_steps];
        Ok(host_tensor(
            &run(&data, &u, vec![0.0; data.n]),
            &[n_steps],
            sys.a.device(),
        ))
    }
}

// ============================================================================
// Implementation Functions (CPU-only, not generic)
// ============================================================================

/// Output sequence only.
fn run(data: &DiscreteData, u: &[f64], mut x: Vec<f64>) -> Vec<f64> {
    u.iter().map(|&uk| data.step(&mut x, uk)).collect()
}

fn dlsim_impl(
    data: &DiscreteData,
    u: &Tensor<CpuRuntime>,
    x0: Option<&Tensor<CpuRuntime>>,
    device: &CpuDevice,
) -> LtiResult<FilterResult<CpuRuntime>> {
    let u_data: Vec<f64> = u.to_vec();
    let n_samples = u_data.len();
    let n_states = data.n;

    if n_samples == 0 {
        return Err(LtiError::InvalidInput {
            context: "input signal cannot be empty".to_string(),
        });
    }

    let mut x = match x0 {
        Some(x0_tensor) => {
            let x0_data: Vec<f64> = x0_tensor.to_vec();
            if x0_data.len() != n_states {
                return Err(LtiError::InvalidInput {
                    context: format!(
                        "initial state must have {} elements, got {}",
                        n_states,
                        x0_data.len()
                    ),
                });
            }
            x0_data
        }
        None => vec![0.0; n_states],
    };

    let mut y_out = Vec::with_capacity(n_samples);
    let mut x_out = Vec::with_capacity(n_samples * n_states);
    for &uk in &u_data {
        x_out.extend_from_slice(&x);
        y_out.push(data.step(&mut x, uk));
    }

    Ok(FilterResult {
        y: host_tensor(&y_out, &[n_samples], device),
        x: host_tensor(&x_out, &[n_samples, n_states], device),
        final_state: host_tensor(&x, &[n_states], device),
    })
}

// ============================================================================
// Tests
// ============================================================================
