//! Dense row-major kernels for small matrices.
//!
//! State dimensions in this crate are tiny (a delay network rarely exceeds
//! twenty states), so these kernels operate on plain `Vec<f64>` buffers that
//! the CPU implementations extract from tensors with `to_vec()`.
//!
//! All matrices are row-major: element (i, j) of an m×n matrix lives at
//! `i * n + j`. Factorizations go through numr, see [`super::linalg`].

/// n×n identity.
pub fn identity(n: usize) -> Vec<f64> {
    let mut out = vec![0.0; n * n];
    for i in 0..n {
        out[i * n + i] = 1.0;
    }
    out
}

/// (m×k) · (k×n) product.
pub fn matmul(a: &[f64], b: &[f64], m: usize, k: usize, n: usize) -> Vec<f64> {
    let mut out = vec![0.0; m * n];
    for i in 0..m {
        for l in 0..k {
            let a_il = a[i * k + l];
            if a_il == 0.0 {
                continue;
            }
            for j in 0..n {
                out[i * n + j] += a_il * b[l * n + j];
            }
        }
    }
    out
}

/// Transpose of an m×n matrix.
pub fn transpose(a: &[f64], m: usize, n: usize) -> Vec<f64> {
    let mut out = vec![0.0; m * n];
    for i in 0..m {
        for j in 0..n {
            out[j * m + i] = a[i * n + j];
        }
    }
    out
}

/// Matrix-vector product (m×n) · (n).
pub fn matvec(a: &[f64], x: &[f64], m: usize, n: usize) -> Vec<f64> {
    (0..m)
        .map(|i| (0..n).map(|j| a[i * n + j] * x[j]).sum())
        .collect()
}

/// Dot product.
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Largest absolute row sum (induced infinity norm).
pub fn norm_inf(a: &[f64], n: usize) -> f64 {
    (0..n)
        .map(|i| (0..n).map(|j| a[i * n + j].abs()).sum::<f64>())
        .fold(0.0, f64::max)
}

/// Replace `x` by (x + xᵀ) / 2.
pub fn symmetrize(x: &mut [f64], n: usize) {
    for i in 0..n {
        for j in (i + 1)..n {
            let avg = 0.5 * (x[i * n + j] + x[j * n + i]);
            x[i * n + j] = avg;
            x[j * n + i] = avg;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matmul_and_transpose() {
        let a = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let at = transpose(&a, 2, 3);
        assert_eq!(at, vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);

        let gram = matmul(&a, &at, 2, 3, 2);
        assert_eq!(gram, vec![14.0, 32.0, 32.0, 77.0]);
        assert_eq!(matvec(&a, &[1.0, 0.0, -1.0], 2, 3), vec![-2.0, -2.0]);
        assert_eq!(norm_inf(&[1.0, -2.0, 0.5, 0.5], 2), 3.0);
    }

    #[test]
    fn test_symmetrize() {
        let mut x = vec![1.0, 2.0, 4.0, 3.0];
        symmetrize(&mut x, 2);
        assert_eq!(x, vec![1.0, 3.0, 3.0, 3.0]);
    }
}
