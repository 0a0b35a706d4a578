//! Polynomial helpers on ascending coefficient vectors.
//!
//! `c[k]` is the coefficient of x^k. Transfer functions keep the
//! descending convention at their public boundary and convert with
//! [`to_ascending`]/[`to_descending`].

/// Evaluate by Horner's scheme.
pub fn eval(c: &[f64], x: f64) -> f64 {
    c.iter().rev().fold(0.0, |acc, &ck| acc * x + ck)
}

/// Product of two polynomials.
pub fn mul(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, &ai) in a.iter().enumerate() {
        for (j, &bj) in b.iter().enumerate() {
            out[i + j] += ai * bj;
        }
    }
    out
}

/// Exact definite integral over [lo, hi] via the antiderivative.
pub fn integrate(c: &[f64], lo: f64, hi: f64) -> f64 {
    let anti = |x: f64| {
        c.iter()
            .enumerate()
            .rev()
            .fold(0.0, |acc, (k, &ck)| (acc + ck / (k + 1) as f64) * x)
    };
    // The fold above computes Σ c_k x^{k+1}/(k+1) in Horner form.
    anti(hi) - anti(lo)
}

/// Drop trailing (highest-order) coefficients with |c| <= tol.
pub fn trim(c: &[f64], tol: f64) -> Vec<f64> {
    let mut end = c.len();
    while end > 1 && c[end - 1].abs() <= tol {
        end -= 1;
    }
    c[..end].to_vec()
}

/// Descending coefficients (s^n first) to ascending.
pub fn to_ascending(desc: &[f64]) -> Vec<f64> {
    desc.iter().rev().copied().collect()
}

/// Ascending coefficients to descending.
pub fn to_descending(asc: &[f64]) -> Vec<f64> {
    asc.iter().rev().copied().collect()
}

/// Coefficients in x of the second-order Taylor polynomial of a function
/// with value `v`, slope `d1` and curvature `d2` at `m`.
pub fn taylor_quadratic(v: f64, d1: f64, d2: f64, m: f64) -> [f64; 3] {
    [
        v - d1 * m + 0.5 * d2 * m * m,
        d1 - d2 * m,
        0.5 * d2,
    ]
}
