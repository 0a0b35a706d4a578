//! Host-side views of LTI systems shared by the CPU implementations.

use crate::common::{dense, linalg};
use crate::lti::error::{LtiError, LtiResult};
use crate::lti::types::{DiscreteLtiSystem, LtiSystem};
use numr::dtype::DType;
use numr::runtime::cpu::{CpuClient, CpuDevice, CpuRuntime};
use numr::tensor::Tensor;

/// Row-major copy of a state-space quadruple.
#[derive(Debug, Clone)]
pub(crate) struct StateSpaceData {
    pub n: usize,
    pub a: Vec<f64>,
    pub b: Vec<f64>,
    pub c: Vec<f64>,
    pub d: f64,
}

impl StateSpaceData {
    pub fn from_system(sys: &LtiSystem<CpuRuntime>) -> Self {
        Self {
            n: sys.order(),
            a: sys.a.to_vec(),
            b: sys.b.to_vec(),
            c: sys.c.to_vec(),
            d: sys.feedthrough(),
        }
    }

    pub fn to_system(&self, device: &CpuDevice) -> LtiResult<LtiSystem<CpuRuntime>> {
        LtiSystem::from_slices(&self.a, &self.b, &self.c, self.d, device)
    }

    /// Apply the similarity transform x' = T x.
    pub fn similarity(&self, t: &[f64], t_inv: &[f64]) -> Self {
        let n = self.n;
        let a = dense::matmul(&dense::matmul(t, &self.a, n, n, n), t_inv, n, n, n);
        Self {
            n,
            a,
            b: dense::matmul(t, &self.b, n, n, 1),
            c: dense::matmul(&self.c, t_inv, 1, n, n),
            d: self.d,
        }
    }
}

/// Row-major copy of a discretized system, steppable one sample at a time.
#[derive(Debug, Clone)]
pub(crate) struct DiscreteData {
    pub n: usize,
    pub a: Vec<f64>,
    pub b: Vec<f64>,
    pub c: Vec<f64>,
    pub d: f64,
    pub dt: f64,
}

impl DiscreteData {
    pub fn from_system(sys: &DiscreteLtiSystem<CpuRuntime>) -> Self {
        let d: Vec<f64> = sys.d.to_vec();
        Self {
            n: sys.order(),
            a: sys.a.to_vec(),
            b: sys.b.to_vec(),
            c: sys.c.to_vec(),
            d: d.first().copied().unwrap_or(0.0),
            dt: sys.dt,
        }
    }

    /// Zero-order-hold discretization of a continuous system.
    ///
    /// The block matrix [[A, B], [0, 0]]·dt is exponentiated and Ad, Bd are
    /// read from its top rows.
    pub fn zoh(client: &CpuClient, ss: &StateSpaceData, dt: f64) -> LtiResult<Self> {
        if !(dt > 0.0) || !dt.is_finite() {
            return Err(LtiError::InvalidParameter {
                parameter: "dt".to_string(),
                message: format!("time step must be positive and finite, got {}", dt),
            });
        }
        let n = ss.n;
        let m = n + 1;
        let mut block = vec![0.0; m * m];
        for i in 0..n {
            for j in 0..n {
                block[i * m + j] = ss.a[i * n + j] * dt;
            }
            block[i * m + n] = ss.b[i] * dt;
        }
        let e = linalg::expm(client, &block, m).map_err(|err| LtiError::InvalidInput {
            context: format!("matrix exponential failed during discretization: {}", err),
        })?;

        let mut a = vec![0.0; n * n];
        let mut b = vec![0.0; n];
        for i in 0..n {
            a[i * n..(i + 1) * n].copy_from_slice(&e[i * m..i * m + n]);
            b[i] = e[i * m + n];
        }
        Ok(Self {
            n,
            a,
            b,
            c: ss.c.clone(),
            d: ss.d,
            dt,
        })
    }

    pub fn to_system(&self, device: &CpuDevice) -> DiscreteLtiSystem<CpuRuntime> {
        let n = self.n;
        DiscreteLtiSystem {
            a: host_tensor(&self.a, &[n, n], device),
            b: host_tensor(&self.b, &[n, 1], device),
            c: host_tensor(&self.c, &[1, n], device),
            d: Tensor::from_slice(&[self.d], &[1, 1], device),
            dt: self.dt,
        }
    }

    /// Output C x (without feedthrough).
    pub fn state_output(&self, x: &[f64]) -> f64 {
        dense::dot(&self.c, x)
    }

    /// Emit y[k] = C x[k] + D u[k] and advance x to x[k+1].
    pub fn step(&self, x: &mut [f64], u: f64) -> f64 {
        let y = self.state_output(x) + self.d * u;
        let next: Vec<f64> = (0..self.n)
            .map(|i| dense::dot(&self.a[i * self.n..(i + 1) * self.n], x) + self.b[i] * u)
            .collect();
        x.copy_from_slice(&next);
        y
    }
}

/// Row-major host data as a tensor of the given shape; shapes with a zero
/// extent become `zeros`.
pub(crate) fn host_tensor(data: &[f64], shape: &[usize], device: &CpuDevice) -> Tensor<CpuRuntime> {
    if shape.iter().any(|&s| s == 0) {
        Tensor::zeros(shape, DType::F64, device)
    } else {
        Tensor::from_slice(data, shape, device)
    }
}

/// det(sI − A) by Faddeev-LeVerrier, descending and monic.
#[allow(clippy::needless_range_loop)]
pub(crate) fn characteristic_polynomial(a: &[f64], n: usize) -> Vec<f64> {
    let mut coeffs = vec![0.0; n + 1];
    coeffs[0] = 1.0;
    if n == 0 {
        return coeffs;
    }

    // M_k = A M_{k-1} + c_k I, c_k = −tr(A M_{k-1}) / k
    let mut m = dense::identity(n);
    for k in 1..=n {
        let mut am = dense::matmul(a, &m, n, n, n);
        let trace: f64 = (0..n).map(|i| am[i * n + i]).sum();
        coeffs[k] = -trace / k as f64;
        for i in 0..n {
            am[i * n + i] += coeffs[k];
        }
        m = am;
    }
    coeffs
}

/// Numerator and denominator (descending) of C (sI − A)⁻¹ B + D.
pub(crate) fn transfer_coefficients(ss: &StateSpaceData) -> (Vec<f64>, Vec<f64>) {
    let n = ss.n;
    let den = characteristic_polynomial(&ss.a, n);
    let bc = dense::matmul(&ss.b, &ss.c, n, 1, n);
    let closed: Vec<f64> = ss.a.iter().zip(&bc).map(|(a, x)| a - x).collect();
    let shifted = characteristic_polynomial(&closed, n);
    let num = shifted
        .iter()
        .zip(&den)
        .map(|(p, q)| p + (ss.d - 1.0) * q)
        .collect();
    (num, den)
}

/// Dimension of the Krylov space span{v, Av, A²v, ...}.
///
/// Vectors are orthonormalised with two passes of modified Gram-Schmidt; a
/// new direction counts when its residual exceeds `rtol` relative to the
/// scale of A v.
pub(crate) fn krylov_rank(a: &[f64], v: &[f64], n: usize, rtol: f64) -> usize {
    let mut basis: Vec<Vec<f64>> = Vec::with_capacity(n);
    let norm = |x: &[f64]| dense::dot(x, x).sqrt();

    let v_norm = norm(v);
    if v_norm == 0.0 {
        return 0;
    }
    basis.push(v.iter().map(|x| x / v_norm).collect());

    while basis.len() < n {
        let last = &basis[basis.len() - 1];
        let mut w = dense::matvec(a, last, n, n);
        let scale = norm(&w).max(f64::MIN_POSITIVE);
        for _ in 0..2 {
            for q in &basis {
                let proj = dense::dot(&w, q);
                for (wi, qi) in w.iter_mut().zip(q) {
                    *wi -= proj * qi;
                }
            }
        }
        let w_norm = norm(&w);
        if w_norm <= rtol * scale {
            break;
        }
        basis.push(w.iter().map(|x| x / w_norm).collect());
    }
    basis.len()
}
