//! CPU implementation of window basis functions.
//!
//! # Why CPU-Only?
//!
//! The basis is an n_samples × d matrix with d the delay order; its
//! pseudo-inverse is a single numr `pinverse` call.

use crate::common::{dense, linalg};
use crate::delay::cpu::pade::readout_data;
use crate::delay::traits::window::WindowBasisAlgorithms;
use crate::delay::types::{BasisSet, PadeDelay, WindowDecoding};
use crate::lti::error::{LtiError, LtiResult};
use crate::lti::{host_tensor, StateSpaceData};
use crate::realize::types::Realization;
use numr::runtime::cpu::{CpuClient, CpuRuntime};
use numr::tensor::Tensor;

/// Relative cutoff for singular values in the basis pseudo-inverse.
const PINV_RCOND: f64 = 1e-12;

/// Largest mismatch between T A T⁻¹ and the realized state matrices,
/// relative to their magnitude.
const REALIZATION_RTOL: f64 = 1e-6;

impl WindowBasisAlgorithms<CpuRuntime> for CpuClient {
    fn delay_readout(
        &self,
        delay: &PadeDelay<CpuRuntime>,
        r: f64,
    ) -> LtiResult<Tensor<CpuRuntime>> {
        require_strictly_proper(delay)?;
        if !(0.0..=1.0).contains(&r) {
            return Err(LtiError::InvalidParameter {
                parameter: "r".to_string(),
                message: format!("relative delay must lie in [0, 1], got {}", r),
            });
        }
        let row = readout_data(delay.form, delay.p, delay.q, r);
        Ok(host_tensor(&row, &[1, delay.q], delay.system.a.device()))
    }

    fn window_basis(
        &self,
        delay: &PadeDelay<CpuRuntime>,
        realization: &Realization<CpuRuntime>,
        n_samples: usize,
    ) -> LtiResult<BasisSet<CpuRuntime>> {
        require_strictly_proper(delay)?;
        let d = delay.q;
        if n_samples < d.max(2) {
            return Err(LtiError::InvalidParameter {
                parameter: "n_samples".to_string(),
                message: format!(
                    "need at least max(2, order) = {} window samples, got {}",
                    d.max(2),
                    n_samples
                ),
            });
        }
        let t_inv = require_realization_of(delay, realization)?;

        let points: Vec<f64> = (0..n_samples)
            .map(|i| i as f64 / (n_samples - 1) as f64)
            .collect();
        let canonical: Vec<f64> = points
            .iter()
            .flat_map(|&r| readout_data(delay.form, delay.p, delay.q, r))
            .collect();
        let basis = dense::matmul(&canonical, &t_inv, n_samples, d, d);
        let inverse = linalg::pinv(self, &basis, n_samples, d, PINV_RCOND)?;

        tracing::debug!(
            n_samples,
            order = d,
            realizer = ?realization.realizer,
            "window basis"
        );

        let device = delay.system.a.device();
        Ok(BasisSet {
            basis: host_tensor(&basis, &[n_samples, d], device),
            inverse: host_tensor(&inverse, &[d, n_samples], device),
            points: host_tensor(&points, &[n_samples], device),
        })
    }

    fn decode<F>(
        &self,
        basis: &BasisSet<CpuRuntime>,
        windows: &Tensor<CpuRuntime>,
        target: F,
    ) -> LtiResult<WindowDecoding<CpuRuntime>>
    where
        F: Fn(&[f64]) -> f64,
    {
        let n = basis.n_samples();
        let (m, data) = window_rows(windows, n, "windows")?;
        let states = project_impl(basis, &data, m);
        let targets: Vec<f64> = data.chunks(n).map(&target).collect();

        let device = windows.device();
        Ok(WindowDecoding {
            eval_points: host_tensor(&states, &[m, basis.dimensions()], device),
            targets: host_tensor(&targets, &[m], device),
        })
    }

    fn functional_readout(
        &self,
        basis: &BasisSet<CpuRuntime>,
        weights: &Tensor<CpuRuntime>,
    ) -> LtiResult<Tensor<CpuRuntime>> {
        let n = basis.n_samples();
        let d = basis.dimensions();
        if weights.shape() != [n] {
            return Err(LtiError::InvalidInput {
                context: format!(
                    "weights must have shape [{}], got {:?}",
                    n,
                    weights.shape()
                ),
            });
        }
        let w: Vec<f64> = weights.to_vec();
        let b: Vec<f64> = basis.basis.to_vec();
        let row = dense::matmul(&w, &b, 1, n, d);
        Ok(host_tensor(&row, &[1, d], weights.device()))
    }

    fn project_window(
        &self,
        basis: &BasisSet<CpuRuntime>,
        windows: &Tensor<CpuRuntime>,
    ) -> LtiResult<Tensor<CpuRuntime>> {
        let (m, data) = window_rows(windows, basis.n_samples(), "windows")?;
        let states = project_impl(basis, &data, m);
        Ok(host_tensor(&states, &[m, basis.dimensions()], windows.device()))
    }

    fn reconstruct_window(
        &self,
        basis: &BasisSet<CpuRuntime>,
        states: &Tensor<CpuRuntime>,
    ) -> LtiResult<Tensor<CpuRuntime>> {
        let n = basis.n_samples();
        let d = basis.dimensions();
        let (m, x) = window_rows(states, d, "states")?;
        let b: Vec<f64> = basis.basis.to_vec();
        let windows = dense::matmul(&x, &dense::transpose(&b, n, d), m, d, n);
        Ok(host_tensor(&windows, &[m, n], states.device()))
    }
}

// ============================================================================
// Implementation Functions (CPU-only, not generic)
// ============================================================================

fn require_strictly_proper(delay: &PadeDelay<CpuRuntime>) -> LtiResult<()> {
    if delay.is_strictly_proper() {
        Ok(())
    } else {
        Err(LtiError::InvalidParameter {
            parameter: "delay".to_string(),
            message: format!(
                "window readouts need a strictly proper approximant, got [{}/{}]",
                delay.p, delay.q
            ),
        })
    }
}

/// T⁻¹ of a realization whose system is `delay.system` in the basis x' = T x.
fn require_realization_of(
    delay: &PadeDelay<CpuRuntime>,
    realization: &Realization<CpuRuntime>,
) -> LtiResult<Vec<f64>> {
    let d = delay.q;
    let order = realization.system.order();
    let square = [d, d];
    if order != d || realization.transform.shape() != square || realization.inverse.shape() != square {
        return Err(LtiError::InvalidInput {
            context: format!(
                "realization of order {} does not match delay of order {}",
                order, d
            ),
        });
    }
    let t: Vec<f64> = realization.transform.to_vec();
    let t_inv: Vec<f64> = realization.inverse.to_vec();
    let expected = StateSpaceData::from_system(&delay.system).similarity(&t, &t_inv);
    let actual = StateSpaceData::from_system(&realization.system);

    let scale = expected
        .a
        .iter()
        .chain(&expected.b)
        .fold(1.0_f64, |m, v| m.max(v.abs()));
    let mismatch = expected
        .a
        .iter()
        .zip(&actual.a)
        .chain(expected.b.iter().zip(&actual.b))
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f64::max);
    if !(mismatch <= REALIZATION_RTOL * scale) {
        return Err(LtiError::InvalidInput {
            context: format!(
                "realization does not describe this delay (T A T⁻¹ differs by {:.3e})",
                mismatch
            ),
        });
    }
    Ok(t_inv)
}

/// Row count and data of a `[m, cols]` tensor.
fn window_rows(
    t: &Tensor<CpuRuntime>,
    cols: usize,
    name: &str,
) -> LtiResult<(usize, Vec<f64>)> {
    match t.shape() {
        [m, c] if *c == cols => Ok((*m, t.to_vec())),
        shape => Err(LtiError::InvalidInput {
            context: format!("{} must have shape [m, {}], got {:?}", name, cols, shape),
        }),
    }
}

/// X = W (B⁺)ᵀ
fn project_impl(basis: &BasisSet<CpuRuntime>, windows: &[f64], m: usize) -> Vec<f64> {
    let n = basis.n_samples();
    let d = basis.dimensions();
    let inv: Vec<f64> = basis.inverse.to_vec();
    dense::matmul(windows, &dense::transpose(&inv, d, n), m, n, d)
}

// ============================================================================
// Tests
// ============================================================================
