//! CPU implementation of Padé delay approximants.
//!
//! # Why CPU-Only?
//!
//! Building an approximant is O(q²) scalar work plus a Hurwitz test on a q×q
//! matrix; the systems are handed to the same host-side kernels as every
//! other LTI operation.

use crate::common::linalg;
use crate::delay::traits::pade::DelayApproximation;
use crate::delay::types::{DelayForm, PadeDelay};
use crate::lti::error::{LtiError, LtiResult};
use crate::lti::{host_tensor, StateSpaceData};
use num_complex::Complex64;
use numr::runtime::cpu::{CpuClient, CpuRuntime};
use numr::runtime::RuntimeClient;
use numr::tensor::Tensor;

impl DelayApproximation<CpuRuntime> for CpuClient {
    fn pade_delay(&self, theta: f64, order: usize) -> LtiResult<PadeDelay<CpuRuntime>> {
        check_theta(theta)?;
        if order == 0 {
            return Err(LtiError::InvalidParameter {
                parameter: "order".to_string(),
                message: "delay order must be at least 1".to_string(),
            });
        }
        let ss = legendre_data(theta, order);
        require_hurwitz(self, &ss, theta, order - 1, order)?;
        tracing::debug!(theta, p = order - 1, q = order, "Padé delay (Legendre basis)");
        Ok(PadeDelay {
            system: ss.to_system(self.device())?,
            theta,
            p: order - 1,
            q: order,
            form: DelayForm::Legendre,
        })
    }

    fn pade_delay_pq(&self, theta: f64, p: usize, q: usize) -> LtiResult<PadeDelay<CpuRuntime>> {
        check_theta(theta)?;
        if q == 0 || p > q {
            return Err(LtiError::InvalidParameter {
                parameter: "p, q".to_string(),
                message: format!("need 0 <= p <= q and q >= 1, got p = {}, q = {}", p, q),
            });
        }
        let ss = controllable_data(theta, p, q);
        require_hurwitz(self, &ss, theta, p, q)?;
        tracing::debug!(theta, p, q, "Padé delay (controllable form)");
        Ok(PadeDelay {
            system: ss.to_system(self.device())?,
            theta,
            p,
            q,
            form: DelayForm::Controllable,
        })
    }

    fn pade_delay_error(
        &self,
        theta_times_freq: &Tensor<CpuRuntime>,
        order: usize,
    ) -> LtiResult<Tensor<CpuRuntime>> {
        if order == 0 {
            return Err(LtiError::InvalidParameter {
                parameter: "order".to_string(),
                message: "delay order must be at least 1".to_string(),
            });
        }
        let x: Vec<f64> = theta_times_freq.to_vec();
        let (num, den) = pade_coefficients(order - 1, order);
        let err: Vec<f64> = x
            .iter()
            .map(|&wt| {
                let s = Complex64::new(0.0, wt);
                let h = horner(&num, s) / horner(&den, s);
                (h - Complex64::new(0.0, -wt).exp()).norm()
            })
            .collect();
        Ok(host_tensor(&err, &[err.len()], theta_times_freq.device()))
    }
}

// ============================================================================
// Implementation Functions (CPU-only, not generic)
// ============================================================================

fn check_theta(theta: f64) -> LtiResult<()> {
    if !(theta > 0.0) || !theta.is_finite() {
        return Err(LtiError::InvalidParameter {
            parameter: "theta".to_string(),
            message: format!("delay length must be positive and finite, got {}", theta),
        });
    }
    Ok(())
}

/// Hurwitz test on θA, which is independent of θ up to scaling.
fn require_hurwitz(
    client: &CpuClient,
    ss: &StateSpaceData,
    theta: f64,
    p: usize,
    q: usize,
) -> LtiResult<()> {
    let scaled: Vec<f64> = ss.a.iter().map(|v| v * theta).collect();
    if linalg::is_hurwitz(client, &scaled, ss.n) {
        Ok(())
    } else {
        Err(LtiError::UnstableApproximant {
            theta,
            p,
            q,
            context: "denominator has roots outside the open left half-plane".to_string(),
        })
    }
}

/// Ascending numerator and denominator coefficients of the [p/q] approximant
/// of e^{−σ}, both normalised so the constant term is 1.
pub(crate) fn pade_coefficients(p: usize, q: usize) -> (Vec<f64>, Vec<f64>) {
    let total = (p + q) as f64;
    let mut num = vec![1.0; p + 1];
    for k in 0..p {
        let kf = k as f64;
        num[k + 1] = -num[k] * (p as f64 - kf) / ((total - kf) * (kf + 1.0));
    }
    let mut den = vec![1.0; q + 1];
    for k in 0..q {
        let kf = k as f64;
        den[k + 1] = den[k] * (q as f64 - kf) / ((total - kf) * (kf + 1.0));
    }
    (num, den)
}

/// Ascending monic denominator of the normalised [p/q] approximant.
fn monic_denominator(p: usize, q: usize) -> Vec<f64> {
    let (_, den) = pade_coefficients(p, q);
    let lead = den[q];
    den.iter().map(|v| v / lead).collect()
}

fn horner(asc: &[f64], s: Complex64) -> Complex64 {
    asc.iter()
        .rev()
        .fold(Complex64::new(0.0, 0.0), |acc, &c| acc * s + c)
}

/// Shifted-Legendre realization of the [q−1/q] approximant.
pub(crate) fn legendre_data(theta: f64, q: usize) -> StateSpaceData {
    let mut a = vec![0.0; q * q];
    let mut b = vec![0.0; q];
    for i in 0..q {
        let scale = (2 * i + 1) as f64 / theta;
        for j in 0..q {
            let sign = if i < j || (i - j) % 2 == 0 { -1.0 } else { 1.0 };
            a[i * q + j] = scale * sign;
        }
        b[i] = if i % 2 == 0 { scale } else { -scale };
    }
    StateSpaceData {
        n: q,
        a,
        b,
        c: vec![1.0; q],
        d: 0.0,
    }
}

/// Companion form of H(θs) with A and B scaled by 1/θ.
pub(crate) fn controllable_data(theta: f64, p: usize, q: usize) -> StateSpaceData {
    let (num, den) = pade_coefficients(p, q);
    let lead = den[q];
    let den: Vec<f64> = den.iter().map(|v| v / lead).collect();
    let mut num_pad = vec![0.0; q + 1];
    for (k, v) in num.iter().enumerate() {
        num_pad[k] = v / lead;
    }
    let d = num_pad[q];

    let mut a = vec![0.0; q * q];
    for i in 0..q - 1 {
        a[i * q + i + 1] = 1.0 / theta;
    }
    for j in 0..q {
        a[(q - 1) * q + j] = -den[j] / theta;
    }
    let mut b = vec![0.0; q];
    b[q - 1] = 1.0 / theta;
    let c: Vec<f64> = (0..q).map(|k| num_pad[k] - d * den[k]).collect();

    StateSpaceData { n: q, a, b, c, d }
}

/// C(r) for a strictly proper delay, in the basis of its own system.
pub(crate) fn readout_data(form: DelayForm, p: usize, q: usize, r: f64) -> Vec<f64> {
    match form {
        DelayForm::Legendre => legendre_readout(q, r),
        DelayForm::Controllable => controllable_readout(p, q, r),
    }
}

/// Shifted Legendre polynomials P_i(2r − 1) by Bonnet's recurrence.
fn legendre_readout(q: usize, r: f64) -> Vec<f64> {
    let x = 2.0 * r - 1.0;
    let mut out = Vec::with_capacity(q);
    let (mut prev, mut cur) = (1.0, x);
    for i in 0..q {
        match i {
            0 => out.push(1.0),
            1 => out.push(x),
            _ => {
                let k = (i - 1) as f64;
                let next = ((2.0 * k + 1.0) * x * cur - k * prev) / (k + 1.0);
                prev = cur;
                cur = next;
                out.push(next);
            }
        }
    }
    out
}

/// First q Taylor coefficients of e^{−rσ} D(σ) with D monic.
///
/// The readout transfer function N_r(σ)/D(σ) then matches e^{−rσ} to order
/// q − 1, and N_1 is the approximant's own numerator.
fn controllable_readout(p: usize, q: usize, r: f64) -> Vec<f64> {
    let den = monic_denominator(p, q);
    let mut taylor = vec![1.0; q];
    for k in 1..q {
        taylor[k] = taylor[k - 1] * (-r) / k as f64;
    }
    (0..q)
        .map(|k| (0..=k).map(|j| den[j] * taylor[k - j]).sum())
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
