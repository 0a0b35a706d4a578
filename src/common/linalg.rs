//! Dense factorizations on row-major host buffers, delegated to numr.
//!
//! The CPU implementations keep their small state-space matrices as
//! `Vec<f64>`. These wrappers lift a buffer into a tensor, run numr's
//! [`LinearAlgebraAlgorithms`] on it and bring the result back to the host.
//!
//! numr has no Lyapunov solver and no matrix exponential, so both are built
//! here on top of [`solve`]: Lyapunov equations through their Kronecker form
//! (assembled with numr's `kron`), `expm` by Padé scaling and squaring.

use crate::common::dense;
use numr::algorithm::linalg::LinearAlgebraAlgorithms;
use numr::error::{Error, Result};
use numr::ops::LinalgOps;
use numr::runtime::cpu::{CpuClient, CpuRuntime};
use numr::runtime::RuntimeClient;
use numr::tensor::Tensor;

/// Row-major buffer as a `[rows, cols]` tensor on the client's device.
fn matrix(client: &CpuClient, data: &[f64], rows: usize, cols: usize) -> Tensor<CpuRuntime> {
    Tensor::<CpuRuntime>::from_slice(data, &[rows, cols], client.device())
}

fn finite(values: Vec<f64>, arg: &'static str, reason: &str) -> Result<Vec<f64>> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(values)
    } else {
        Err(Error::InvalidArgument {
            arg,
            reason: reason.to_string(),
        })
    }
}

/// Solve A X = B with A n×n and B n×k.
pub fn solve(client: &CpuClient, a: &[f64], b: &[f64], n: usize, k: usize) -> Result<Vec<f64>> {
    if n == 0 || k == 0 {
        return Ok(Vec::new());
    }
    let x = LinearAlgebraAlgorithms::solve(client, &matrix(client, a, n, n), &matrix(client, b, n, k))?;
    finite(x.to_vec(), "a", "matrix is singular")
}

/// Inverse of an n×n matrix.
pub fn inverse(client: &CpuClient, a: &[f64], n: usize) -> Result<Vec<f64>> {
    if n == 0 {
        return Ok(Vec::new());
    }
    let inv = LinearAlgebraAlgorithms::inverse(client, &matrix(client, a, n, n))?;
    finite(inv.to_vec(), "a", "matrix is singular")
}

/// Lower Cholesky factor L with A = L Lᵀ.
///
/// Fails unless A is (numerically) positive definite.
pub fn cholesky(client: &CpuClient, a: &[f64], n: usize) -> Result<Vec<f64>> {
    if n == 0 {
        return Ok(Vec::new());
    }
    let dec = LinearAlgebraAlgorithms::cholesky_decompose(client, &matrix(client, a, n, n))?;
    let l = finite(dec.l.to_vec(), "a", "matrix is not positive definite")?;
    if (0..n).all(|i| l[i * n + i] > 0.0) {
        Ok(l)
    } else {
        Err(Error::InvalidArgument {
            arg: "a",
            reason: "matrix is not positive definite".to_string(),
        })
    }
}

/// Solve A x = b given the Cholesky factor L of A: L y = b, then Lᵀ x = y.
pub fn cholesky_solve(client: &CpuClient, l: &[f64], b: &[f64], n: usize) -> Result<Vec<f64>> {
    let y = solve(client, l, b, n, 1)?;
    solve(client, &dense::transpose(l, n, n), &y, n, 1)
}

/// SVD of a square matrix, A = U diag(s) Vᵀ, singular values descending.
#[derive(Debug, Clone)]
pub struct Svd {
    pub u: Vec<f64>,
    pub s: Vec<f64>,
    pub v: Vec<f64>,
}

pub fn svd(client: &CpuClient, a: &[f64], n: usize) -> Result<Svd> {
    if n == 0 {
        return Ok(Svd {
            u: Vec::new(),
            s: Vec::new(),
            v: Vec::new(),
        });
    }
    let dec = LinearAlgebraAlgorithms::svd_decompose(client, &matrix(client, a, n, n))?;
    let u: Vec<f64> = dec.u.to_vec();
    let s: Vec<f64> = dec.s.to_vec();
    let v = dense::transpose(&dec.vt.to_vec(), n, n);

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&x, &y| s[y].total_cmp(&s[x]));
    let mut sorted = Svd {
        u: vec![0.0; n * n],
        s: order.iter().map(|&j| s[j]).collect(),
        v: vec![0.0; n * n],
    };
    for (dst, &src) in order.iter().enumerate() {
        for i in 0..n {
            sorted.u[i * n + dst] = u[i * n + src];
            sorted.v[i * n + dst] = v[i * n + src];
        }
    }
    Ok(sorted)
}

/// Moore-Penrose pseudo-inverse (n×m) of an m×n matrix; singular values
/// below `rcond · s_max` count as zero.
pub fn pinv(client: &CpuClient, a: &[f64], m: usize, n: usize, rcond: f64) -> Result<Vec<f64>> {
    let p = LinearAlgebraAlgorithms::pinverse(client, &matrix(client, a, m, n), Some(rcond))?;
    finite(p.to_vec(), "a", "pseudo-inverse is not finite")
}

/// 2-norm condition number of an n×n matrix (infinite when singular).
pub fn condition_number(client: &CpuClient, a: &[f64], n: usize) -> Result<f64> {
    let dec = svd(client, a, n)?;
    Ok(match (dec.s.first(), dec.s.last()) {
        (Some(&hi), Some(&lo)) if lo > 0.0 => hi / lo,
        (Some(_), Some(_)) => f64::INFINITY,
        _ => 1.0,
    })
}

/// Matrix exponential by [6/6] Padé approximation with scaling and squaring.
pub fn expm(client: &CpuClient, a: &[f64], n: usize) -> Result<Vec<f64>> {
    if n == 0 {
        return Ok(Vec::new());
    }
    let norm = dense::norm_inf(a, n);
    let squarings = if norm > 0.5 {
        (norm / 0.5).log2().ceil() as i32
    } else {
        0
    };
    let scale = 0.5_f64.powi(squarings);
    let x: Vec<f64> = a.iter().map(|v| v * scale).collect();

    const Q: usize = 6;
    let mut c = 1.0;
    let mut power = dense::identity(n);
    let mut num = dense::identity(n);
    let mut den = dense::identity(n);
    for k in 1..=Q {
        c *= (Q - k + 1) as f64 / (k * (2 * Q - k + 1)) as f64;
        power = dense::matmul(&power, &x, n, n, n);
        let sign = if k % 2 == 0 { 1.0 } else { -1.0 };
        for (idx, &p) in power.iter().enumerate() {
            num[idx] += c * p;
            den[idx] += sign * c * p;
        }
    }

    let mut e = solve(client, &den, &num, n, n)?;
    for _ in 0..squarings {
        e = dense::matmul(&e, &e, n, n, n);
    }
    Ok(e)
}

/// X ⊗ Y of two n×n matrices, as an n²×n² host buffer.
fn kron(client: &CpuClient, x: &[f64], y: &[f64], n: usize) -> Result<Vec<f64>> {
    let k = LinalgOps::kron(client, &matrix(client, x, n, n), &matrix(client, y, n, n))?;
    Ok(k.to_vec())
}

/// Solve the continuous Lyapunov equation A X + X Aᵀ + Q = 0.
///
/// Row-major vec(A X + X Aᵀ) = (A ⊗ I + I ⊗ A) vec(X).
pub fn lyapunov(client: &CpuClient, a: &[f64], q: &[f64], n: usize) -> Result<Vec<f64>> {
    if n == 0 {
        return Ok(Vec::new());
    }
    let eye = dense::identity(n);
    let left = kron(client, a, &eye, n)?;
    let right = kron(client, &eye, a, n)?;
    let m: Vec<f64> = left.iter().zip(&right).map(|(l, r)| l + r).collect();
    let rhs: Vec<f64> = q.iter().map(|v| -v).collect();
    let mut x = solve(client, &m, &rhs, n * n, 1)?;
    dense::symmetrize(&mut x, n);
    Ok(x)
}

/// Solve the discrete Lyapunov (Stein) equation A X Aᵀ − X + Q = 0.
///
/// Row-major vec(A X Aᵀ) = (A ⊗ A) vec(X).
pub fn discrete_lyapunov(client: &CpuClient, a: &[f64], q: &[f64], n: usize) -> Result<Vec<f64>> {
    if n == 0 {
        return Ok(Vec::new());
    }
    let nn = n * n;
    let mut m = kron(client, a, a, n)?;
    for i in 0..nn {
        m[i * nn + i] -= 1.0;
    }
    let rhs: Vec<f64> = q.iter().map(|v| -v).collect();
    let mut x = solve(client, &m, &rhs, nn, 1)?;
    dense::symmetrize(&mut x, n);
    Ok(x)
}

/// True when every eigenvalue of A lies in the open left half-plane.
///
/// A is Hurwitz exactly when A X + X Aᵀ = −I has a positive definite
/// solution.
pub fn is_hurwitz(client: &CpuClient, a: &[f64], n: usize) -> bool {
    if n == 0 {
        return true;
    }
    lyapunov(client, a, &dense::identity(n), n)
        .and_then(|x| cholesky(client, &x, n))
        .is_ok()
}

/// True when every eigenvalue of A lies strictly inside the unit circle.
pub fn is_schur(client: &CpuClient, a: &[f64], n: usize) -> bool {
    if n == 0 {
        return true;
    }
    discrete_lyapunov(client, a, &dense::identity(n), n)
        .and_then(|x| cholesky(client, &x, n))
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use numr::runtime::cpu::CpuDevice;

    fn setup() -> (CpuClient, CpuDevice) {
        let device = CpuDevice::new();
        let client = CpuClient::new(device.clone());
        (client, device)
    }

    fn max_abs_diff(a: &[f64], b: &[f64]) -> f64 {
        a.iter().zip(b).map(|(x, y)| (x - y).abs()).fold(0.0, f64::max)
    }

    #[test]
    fn test_solve_and_inverse() {
        let (client, _device) = setup();

        let a = [4.0, -2.0, 1.0, 3.0, 6.0, -4.0, 2.0, 1.0, 8.0];
        let inv = inverse(&client, &a, 3).unwrap();
        let prod = dense::matmul(&a, &inv, 3, 3, 3);
        assert!(max_abs_diff(&prod, &dense::identity(3)) < 1e-12);

        let b = [1.0, 0.0, -2.0];
        let x = solve(&client, &a, &b, 3, 1).unwrap();
        assert!(max_abs_diff(&dense::matvec(&a, &x, 3, 3), &b) < 1e-12);
    }

    #[test]
    fn test_cholesky_solve_and_indefinite() {
        let (client, _device) = setup();

        let a = [4.0, 2.0, 0.6, 2.0, 5.0, 1.0, 0.6, 1.0, 3.0];
        let l = cholesky(&client, &a, 3).unwrap();
        let rebuilt = dense::matmul(&l, &dense::transpose(&l, 3, 3), 3, 3, 3);
        assert!(max_abs_diff(&rebuilt, &a) < 1e-12);

        let b = [1.0, -2.0, 0.5];
        let x = cholesky_solve(&client, &l, &b, 3).unwrap();
        assert!(max_abs_diff(&dense::matvec(&a, &x, 3, 3), &b) < 1e-12);

        assert!(cholesky(&client, &[1.0, 2.0, 2.0, 1.0], 2).is_err());
    }

    #[test]
    fn test_svd_sorted_and_reconstructs() {
        let (client, _device) = setup();

        let a = [2.0, -1.0, 0.5, 1.0, 3.0, -2.0, 0.0, 1.5, 4.0];
        let dec = svd(&client, &a, 3).unwrap();
        assert!(dec.s.windows(2).all(|w| w[0] >= w[1]));

        let mut rebuilt = vec![0.0; 9];
        for i in 0..3 {
            for j in 0..3 {
                for k in 0..3 {
                    rebuilt[i * 3 + j] += dec.u[i * 3 + k] * dec.s[k] * dec.v[j * 3 + k];
                }
            }
        }
        assert!(max_abs_diff(&rebuilt, &a) < 1e-12);
        assert!(condition_number(&client, &[1.0, 2.0, 2.0, 4.0], 2).unwrap() > 1e12);
    }

    #[test]
    fn test_pinv_left_inverse() {
        let (client, _device) = setup();

        let (m, n) = (5, 2);
        let a = [1.0, 0.0, 1.0, 0.5, 1.0, 1.0, 1.0, 1.5, 1.0, 2.0];
        let p = pinv(&client, &a, m, n, 1e-12).unwrap();
        let prod = dense::matmul(&p, &a, n, m, n);
        assert!(max_abs_diff(&prod, &dense::identity(n)) < 1e-12);
    }

    #[test]
    fn test_expm_diagonal_and_rotation() {
        let (client, _device) = setup();

        let e = expm(&client, &[-1.0, 0.0, 0.0, -3.0], 2).unwrap();
        assert!((e[0] - (-1.0_f64).exp()).abs() < 1e-14);
        assert!((e[3] - (-3.0_f64).exp()).abs() < 1e-14);

        let theta = 2.5;
        let e = expm(&client, &[0.0, -theta, theta, 0.0], 2).unwrap();
        assert!((e[0] - theta.cos()).abs() < 1e-12);
        assert!((e[2] - theta.sin()).abs() < 1e-12);
    }

    #[test]
    fn test_lyapunov_residuals() {
        let (client, _device) = setup();

        let a = [-1.0, 2.0, 0.0, -3.0];
        let q = [1.0, 0.0, 0.0, 2.0];
        let x = lyapunov(&client, &a, &q, 2).unwrap();
        let ax = dense::matmul(&a, &x, 2, 2, 2);
        let xat = dense::matmul(&x, &dense::transpose(&a, 2, 2), 2, 2, 2);
        for i in 0..4 {
            assert!((ax[i] + xat[i] + q[i]).abs() < 1e-12);
        }

        let ad = [0.5, 0.1, 0.0, -0.3];
        let xd = discrete_lyapunov(&client, &ad, &q, 2).unwrap();
        let axa = dense::matmul(
            &dense::matmul(&ad, &xd, 2, 2, 2),
            &dense::transpose(&ad, 2, 2),
            2,
            2,
            2,
        );
        for i in 0..4 {
            assert!((axa[i] - xd[i] + q[i]).abs() < 1e-12);
        }
    }

    #[test]
    fn test_stability_checks() {
        let (client, _device) = setup();

        assert!(is_hurwitz(&client, &[-1.0, 5.0, 0.0, -0.1], 2));
        assert!(!is_hurwitz(&client, &[0.1, 0.0, 0.0, -1.0], 2));
        assert!(!is_hurwitz(&client, &[0.0, 1.0, -1.0, 0.0], 2));
        assert!(is_schur(&client, &[0.9, 0.0, 0.3, -0.5], 2));
        assert!(!is_schur(&client, &[1.1, 0.0, 0.0, 0.2], 2));
    }
}
