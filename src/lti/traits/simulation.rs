//! Discretization and simulation of LTI systems.

use crate::lti::error::LtiResult;
use crate::lti::types::{DiscreteLtiSystem, FilterResult, LtiSystem};
use numr::runtime::Runtime;
use numr::tensor::Tensor;

/// Zero-order-hold discretization and time-domain simulation.
pub trait LtiSimulation<R: Runtime> {
    /// Zero-order-hold discretization with step `dt`.
    ///
    /// # Algorithm
    ///
    /// ```text
    /// exp( | A  B | · dt ) = | Ad  Bd |
    ///      | 0  0 |          | 0   I  |
    /// ```
    /// The recursion x[k+1] = Ad·x[k] + Bd·u[k] is exact for inputs held
    /// constant over each step.
    fn discretize(&self, sys: &LtiSystem<R>, dt: f64) -> LtiResult<DiscreteLtiSystem<R>>;

    /// Simulate a discretized system.
    ///
    /// * `u` - Input signal `[n_samples]`
    /// * `x0` - Initial state `[d]`, or `None` for the zero state
    fn dlsim(
        &self,
        sys: &DiscreteLtiSystem<R>,
        u: &Tensor<R>,
        x0: Option<&Tensor<R>>,
    ) -> LtiResult<FilterResult<R>>;

    /// Discretize at `dt` and filter `signal`, returning the output sequence
    /// and the final state.
    ///
    /// Filtering is linear: the output equals the convolution of
    /// [`impulse_response`](Self::impulse_response) with the input, scaled by
    /// `dt`.
    fn filter(
        &self,
        sys: &LtiSystem<R>,
        signal: &Tensor<R>,
        dt: f64,
        initial_state: Option<&Tensor<R>>,
    ) -> LtiResult<FilterResult<R>>;

    /// `n_steps` samples of the response to a unit-area impulse.
    ///
    /// The impulse is the discrete pulse u[0] = 1/dt, so `dt · Σ y[k]`
    /// approaches the DC gain for stable systems and a feedthrough term
    /// appears as D/dt at the first sample.
    fn impulse_response(&self, sys: &LtiSystem<R>, n_steps: usize, dt: f64)
        -> LtiResult<Tensor<R>>;

    /// `n_steps` samples of the response to a unit step.
    fn step_response(&self, sys: &LtiSystem<R>, n_steps: usize, dt: f64) -> LtiResult<Tensor<R>>;
}
