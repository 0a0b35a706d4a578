//! CPU implementation of gramians, Hankel singular values and state norms.
//!
//! # Why CPU-Only?
//!
//! Gramians come from Lyapunov equations solved in Kronecker form on d²×d²
//! systems, with d the (small) state dimension; L1 norms come from sequential
//! impulse simulations. Neither benefits from device dispatch.

use crate::common::{dense, linalg, polynomial};
use crate::lti::error::{LtiError, LtiResult};
use crate::lti::{transfer_coefficients, DiscreteData, StateSpaceData};
use crate::realize::types::{L1Norm, L1NormOptions};
use numr::algorithm::polynomial::PolynomialAlgorithms;
use numr::runtime::cpu::{CpuClient, CpuRuntime};
use numr::runtime::RuntimeClient;
use numr::tensor::Tensor;

/// Hankel singular values below this fraction of the largest mark a
/// non-minimal system.
const HANKEL_RTOL: f64 = 1e-12;

/// Impulse samples in the first L1 refinement.
const L1_INITIAL_LENGTH: usize = 16;

/// Golden-section tolerance for the tail decay rate, relative to the
/// spectral abscissa.
const TAIL_SIGMA_RTOL: f64 = 1e-4;

pub(crate) fn require_stable(
    client: &CpuClient,
    ss: &StateSpaceData,
    operation: &str,
) -> LtiResult<()> {
    if linalg::is_hurwitz(client, &ss.a, ss.n) {
        Ok(())
    } else {
        Err(LtiError::UnstableSystem {
            context: format!("{} requires all poles in the open left half-plane", operation),
        })
    }
}

/// P with A P + P Aᵀ + B Bᵀ = 0.
pub(crate) fn control_gram_data(client: &CpuClient, ss: &StateSpaceData) -> LtiResult<Vec<f64>> {
    require_stable(client, ss, "control_gram")?;
    let n = ss.n;
    let bbt = dense::matmul(&ss.b, &ss.b, n, 1, n);
    linalg::lyapunov(client, &ss.a, &bbt, n).map_err(|err| LtiError::UnstableSystem {
        context: format!("control_gram: {}", err),
    })
}

/// Q with Aᵀ Q + Q A + Cᵀ C = 0.
pub(crate) fn observe_gram_data(client: &CpuClient, ss: &StateSpaceData) -> LtiResult<Vec<f64>> {
    require_stable(client, ss, "observe_gram")?;
    let n = ss.n;
    let a_t = dense::transpose(&ss.a, n, n);
    let ctc = dense::matmul(&ss.c, &ss.c, n, 1, n);
    linalg::lyapunov(client, &a_t, &ctc, n).map_err(|err| LtiError::UnstableSystem {
        context: format!("observe_gram: {}", err),
    })
}

/// (T, T⁻¹, σ) of the balancing transform.
pub(crate) fn balance_data(
    client: &CpuClient,
    ss: &StateSpaceData,
) -> LtiResult<(Vec<f64>, Vec<f64>, Vec<f64>)> {
    let n = ss.n;
    if n == 0 {
        return Ok((Vec::new(), Vec::new(), Vec::new()));
    }
    let p = control_gram_data(client, ss)?;
    let q = observe_gram_data(client, ss)?;

    let lr = linalg::cholesky(client, &p, n).map_err(|_| LtiError::NonMinimalSystem {
        context: "controllability gramian is not positive definite (uncontrollable mode)"
            .to_string(),
    })?;
    let lo = linalg::cholesky(client, &q, n).map_err(|_| LtiError::NonMinimalSystem {
        context: "observability gramian is not positive definite (unobservable mode)"
            .to_string(),
    })?;

    let lo_t = dense::transpose(&lo, n, n);
    let m = dense::matmul(&lo_t, &lr, n, n, n);
    let dec = linalg::svd(client, &m, n)?;

    let s_max = dec.s[0];
    let s_min = dec.s[n - 1];
    if !(s_min > HANKEL_RTOL * s_max) {
        return Err(LtiError::NonMinimalSystem {
            context: format!(
                "Hankel singular values span {:.3e}..{:.3e}; the system has a (nearly) \
                 uncontrollable or unobservable mode",
                s_max, s_min
            ),
        });
    }
    let inv_sqrt: Vec<f64> = dec.s.iter().map(|s| 1.0 / s.sqrt()).collect();

    // T = Σ^{-1/2} Uᵀ Loᵀ
    let u_t = dense::transpose(&dec.u, n, n);
    let mut t = dense::matmul(&u_t, &lo_t, n, n, n);
    for i in 0..n {
        for j in 0..n {
            t[i * n + j] *= inv_sqrt[i];
        }
    }
    // T⁻¹ = Lr V Σ^{-1/2}
    let mut t_inv = dense::matmul(&lr, &dec.v, n, n, n);
    for i in 0..n {
        for j in 0..n {
            t_inv[i * n + j] *= inv_sqrt[j];
        }
    }

    tracing::debug!(order = n, hankel = ?dec.s, "balanced realization");
    Ok((t, t_inv, dec.s))
}

pub(crate) fn state_norm_data(client: &CpuClient, ss: &StateSpaceData) -> LtiResult<Vec<f64>> {
    let p = control_gram_data(client, ss)?;
    Ok((0..ss.n).map(|i| p[i * ss.n + i].max(0.0).sqrt()).collect())
}

pub(crate) fn state_norm_discrete_data(
    client: &CpuClient,
    dd: &DiscreteData,
) -> LtiResult<Vec<f64>> {
    let n = dd.n;
    if !linalg::is_schur(client, &dd.a, n) {
        return Err(LtiError::UnstableSystem {
            context: "state_norm_discrete requires all poles strictly inside the unit circle"
                .to_string(),
        });
    }
    let bbt = dense::matmul(&dd.b, &dd.b, n, 1, n);
    let p = linalg::discrete_lyapunov(client, &dd.a, &bbt, n).map_err(|err| {
        LtiError::UnstableSystem {
            context: format!("state_norm_discrete: {}", err),
        }
    })?;
    Ok((0..n).map(|i| p[i * n + i].max(0.0).sqrt()).collect())
}

// ============================================================================
// Certified L1 bounds
// ============================================================================

/// Lower and upper bounds on ∫|h(t)| dt for one readout.
#[derive(Debug, Clone, Copy)]
struct L1Bounds {
    lower: f64,
    upper: f64,
}

impl L1Bounds {
    fn rel_err(&self) -> f64 {
        if self.lower > 0.0 {
            0.5 * (self.upper - self.lower) / self.lower
        } else if self.upper > 0.0 {
            f64::INFINITY
        } else {
            0.0
        }
    }

    fn midpoint(&self) -> f64 {
        0.5 * (self.lower + self.upper)
    }
}

/// Largest real part of the eigenvalues of A.
fn spectral_abscissa(client: &CpuClient, ss: &StateSpaceData) -> LtiResult<f64> {
    let (_, den) = transfer_coefficients(ss);
    let ascending = polynomial::to_ascending(&den);
    let coeffs =
        Tensor::<CpuRuntime>::from_slice(&ascending, &[ascending.len()], client.device());
    let roots = client.polyroots(&coeffs)?;
    let real: Vec<f64> = roots.roots_real.to_vec();
    Ok(real.into_iter().fold(f64::NEG_INFINITY, f64::max))
}

/// Quantities shared by every refinement of one readout.
struct ImpulseBounder<'a> {
    client: &'a CpuClient,
    ss: &'a StateSpaceData,
    readout: &'a [f64],
    a_t: Vec<f64>,
    ctc: Vec<f64>,
    alpha: f64,
}

impl ImpulseBounder<'_> {
    fn output(&self, x: &[f64]) -> f64 {
        dense::dot(self.readout, x)
    }

    fn quadratic(&self, w: &[f64], x: &[f64]) -> f64 {
        let n = self.ss.n;
        dense::dot(x, &dense::matvec(w, x, n, n)).max(0.0)
    }

    /// Upper bound on ∫₀^∞ |C e^{At} x| dt.
    ///
    /// For 0 < σ < −α, Cauchy-Schwarz against e^{−σt} gives
    /// sqrt(xᵀ W_σ x / 2σ) with (A + σI)ᵀ W_σ + W_σ (A + σI) = −Cᵀ C; σ is
    /// picked by golden-section search.
    fn tail(&self, x: &[f64]) -> f64 {
        let n = self.ss.n;
        let bound = |sigma: f64| -> f64 {
            let mut shifted = self.a_t.clone();
            for i in 0..n {
                shifted[i * n + i] += sigma;
            }
            match linalg::lyapunov(self.client, &shifted, &self.ctc, n) {
                Ok(w) => {
                    let value = (self.quadratic(&w, x) / (2.0 * sigma)).sqrt();
                    if value.is_finite() {
                        value
                    } else {
                        f64::INFINITY
                    }
                }
                Err(_) => f64::INFINITY,
            }
        };

        let inv_phi = (5.0_f64.sqrt() - 1.0) / 2.0;
        let inv_phi2 = 1.0 - inv_phi;
        let xtol = -self.alpha * TAIL_SIGMA_RTOL;
        let (mut a, mut b) = (0.0, -self.alpha);
        let mut x1 = a + inv_phi2 * (b - a);
        let mut x2 = a + inv_phi * (b - a);
        let mut f1 = bound(x1);
        let mut f2 = bound(x2);
        while b - a > xtol {
            if f1 < f2 {
                b = x2;
                x2 = x1;
                f2 = f1;
                x1 = a + inv_phi2 * (b - a);
                f1 = bound(x1);
            } else {
                a = x1;
                x1 = x2;
                f1 = f2;
                x2 = a + inv_phi * (b - a);
                f2 = bound(x2);
            }
        }
        f1.min(f2)
    }

    /// Bounds from `length` samples of the impulse response over [0, horizon],
    /// as (lower_impulse, lower_tail, upper_impulse, upper_tail).
    fn refine(&self, length: usize, horizon: f64, dc: f64) -> LtiResult<(f64, f64, f64, f64)> {
        let n = self.ss.n;
        let dt = horizon / length as f64;
        let step = DiscreteData::zoh(
            self.client,
            &StateSpaceData {
                n,
                a: self.ss.a.clone(),
                b: self.ss.b.clone(),
                c: self.readout.to_vec(),
                d: 0.0,
            },
            dt,
        )?;

        // y_k = ∫ over the k-th interval of h, exactly.
        let mut z = step.b.clone();
        let mut lower_impulse = 0.0;
        let mut area = 0.0;
        for _ in 0..length {
            let y = self.output(&z);
            lower_impulse += y.abs();
            area += y;
            z = dense::matvec(&step.a, &z, n, n);
        }
        let lower_tail = (dc - area).abs();

        // W = ∫₀^dt e^{Aᵀs} Cᵀ C e^{As} ds, from Aᵀ W + W A = Φᵀ Cᵀ C Φ − Cᵀ C.
        let phi_t = dense::transpose(&step.a, n, n);
        let decayed = dense::matmul(&dense::matmul(&phi_t, &self.ctc, n, n, n), &step.a, n, n, n);
        let q: Vec<f64> = self.ctc.iter().zip(&decayed).map(|(c, d)| c - d).collect();
        let w = linalg::lyapunov(self.client, &self.a_t, &q, n)?;
        let awa = dense::matmul(&dense::matmul(&self.a_t, &w, n, n, n), &self.ss.a, n, n, n);

        // On each interval |h| varies by at most sqrt(dt ∫|h'|²); when an
        // endpoint exceeds that, h keeps its sign and ∫|h| = |y_k|.
        let mut x = self.ss.b.clone();
        let mut z = step.b.clone();
        let mut upper_impulse = 0.0;
        for _ in 0..length {
            let next = dense::matvec(&step.a, &x, n, n);
            let edge = self.output(&x).abs().max(self.output(&next).abs());
            let swing = (dt * self.quadratic(&awa, &x)).sqrt();
            upper_impulse += if edge > swing {
                self.output(&z).abs()
            } else {
                (dt * self.quadratic(&w, &x)).sqrt()
            };
            x = next;
            z = dense::matvec(&step.a, &z, n, n);
        }
        let upper_tail = self.tail(&x);

        Ok((lower_impulse, lower_tail, upper_impulse, upper_tail))
    }

    /// Refine by doubling the sample count, and the horizon whenever the tail
    /// dominates the gap, until the bounds meet `options.rtol`.
    fn bounds(&self, options: &L1NormOptions) -> LtiResult<L1Bounds> {
        let n = self.ss.n;
        let x = linalg::solve(self.client, &self.ss.a, &self.ss.b, n, 1)?;
        let dc = -self.output(&x);

        let mut bounds = L1Bounds {
            lower: dc.abs(),
            upper: self.tail(&self.ss.b),
        };
        bounds.upper = bounds.upper.max(bounds.lower);
        if bounds.upper <= 0.0 {
            return Ok(L1Bounds {
                lower: 0.0,
                upper: 0.0,
            });
        }

        let mut length = L1_INITIAL_LENGTH;
        let mut horizon = -1.0 / self.alpha;
        while length <= options.max_length && !(bounds.rel_err() < options.rtol) {
            let (lo_imp, lo_tail, up_imp, up_tail) = self.refine(length, horizon, dc)?;
            bounds.lower = bounds.lower.max(lo_imp + lo_tail);
            bounds.upper = bounds.upper.min(up_imp + up_tail).max(bounds.lower);
            tracing::trace!(
                length,
                horizon,
                lower = bounds.lower,
                upper = bounds.upper,
                "l1_norm refinement"
            );

            length *= 2;
            if up_imp - lo_imp < up_tail - lo_tail {
                horizon *= 2.0;
            }
        }

        if !(bounds.rel_err() < options.rtol) {
            tracing::warn!(
                rel_err = bounds.rel_err(),
                rtol = options.rtol,
                max_length = options.max_length,
                "l1_norm stopped at max_length before reaching tolerance"
            );
        }
        Ok(bounds)
    }
}

/// Certified bounds on ∫|rₖ · e^{At} B| dt for each readout row rₖ.
fn impulse_l1_bounds(
    client: &CpuClient,
    ss: &StateSpaceData,
    readouts: &[Vec<f64>],
    options: &L1NormOptions,
) -> LtiResult<Vec<L1Bounds>> {
    require_stable(client, ss, "l1_norm")?;
    let n = ss.n;
    let zero = L1Bounds {
        lower: 0.0,
        upper: 0.0,
    };
    if n == 0 {
        return Ok(vec![zero; readouts.len()]);
    }
    if !(options.rtol > 0.0) {
        return Err(LtiError::InvalidParameter {
            parameter: "rtol".to_string(),
            message: "must be positive".to_string(),
        });
    }

    let alpha = spectral_abscissa(client, ss)?;
    if !(alpha < 0.0) {
        return Err(LtiError::UnstableSystem {
            context: format!("l1_norm: spectral abscissa {:.3e} is not negative", alpha),
        });
    }
    let a_t = dense::transpose(&ss.a, n, n);

    readouts
        .iter()
        .map(|readout| {
            let bounder = ImpulseBounder {
                client,
                ss,
                readout,
                a_t: a_t.clone(),
                ctc: dense::matmul(readout, readout, n, 1, n),
                alpha,
            };
            bounder.bounds(options)
        })
        .collect()
}

pub(crate) fn l1_norm_data(
    client: &CpuClient,
    ss: &StateSpaceData,
    options: &L1NormOptions,
) -> LtiResult<L1Norm> {
    let bounds = impulse_l1_bounds(client, ss, &[ss.c.clone()], options)?;
    let b = bounds[0];
    let feedthrough = ss.d.abs();
    Ok(L1Norm {
        norm: b.midpoint() + feedthrough,
        rel_err: b.rel_err(),
        lower: b.lower + feedthrough,
        upper: b.upper + feedthrough,
    })
}

pub(crate) fn state_l1_norm_data(
    client: &CpuClient,
    ss: &StateSpaceData,
    options: &L1NormOptions,
) -> LtiResult<Vec<f64>> {
    let n = ss.n;
    let rows: Vec<Vec<f64>> = (0..n)
        .map(|i| {
            let mut e = vec![0.0; n];
            e[i] = 1.0;
            e
        })
        .collect();
    let bounds = impulse_l1_bounds(client, ss, &rows, options)?;
    Ok(bounds.iter().map(L1Bounds::midpoint).collect())
}
