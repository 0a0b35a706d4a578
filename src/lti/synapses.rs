//! Standard causal synapse filters.
//!
//! A synapse is a proper, strictly stable, low-order LTI system with unit DC
//! gain. All constructors return controllable-form state-space systems.

use crate::lti::error::{LtiError, LtiResult};
use crate::lti::types::LtiSystem;
use numr::runtime::Runtime;

fn check_tau(name: &str, tau: f64) -> LtiResult<()> {
    if !(tau > 0.0) || !tau.is_finite() {
        return Err(LtiError::InvalidParameter {
            parameter: name.to_string(),
            message: format!("time constant must be positive and finite, got {}", tau),
        });
    }
    Ok(())
}

/// First-order lowpass `1 / (τs + 1)`.
pub fn lowpass<R: Runtime>(tau: f64, device: &R::Device) -> LtiResult<LtiSystem<R>> {
    check_tau("tau", tau)?;
    LtiSystem::from_slices(&[-1.0 / tau], &[1.0 / tau], &[1.0], 0.0, device)
}

/// Alpha synapse `1 / (τs + 1)²`.
pub fn alpha<R: Runtime>(tau: f64, device: &R::Device) -> LtiResult<LtiSystem<R>> {
    double_exp(tau, tau, device)
}

/// Double-exponential synapse `1 / ((τ₁s + 1)(τ₂s + 1))`.
pub fn double_exp<R: Runtime>(tau1: f64, tau2: f64, device: &R::Device) -> LtiResult<LtiSystem<R>> {
    check_tau("tau1", tau1)?;
    check_tau("tau2", tau2)?;
    // s² + (1/τ₁ + 1/τ₂)s + 1/(τ₁τ₂)
    let a1 = 1.0 / tau1 + 1.0 / tau2;
    let a0 = 1.0 / (tau1 * tau2);
    LtiSystem::from_slices(&[0.0, 1.0, -a0, -a1], &[0.0, 1.0], &[a0, 0.0], 0.0, device)
}
