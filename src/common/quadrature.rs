//! Gauss-Legendre quadrature.
//!
//! An n-point rule integrates polynomials of degree 2n-1 exactly. Used to
//! project smooth (non-polynomial) targets onto piecewise neuron responses and
//! to check that such targets are locally polynomial.

/// Gauss-Legendre rule on [-1, 1].
#[derive(Debug, Clone)]
pub struct GaussLegendre {
    /// Nodes, ascending.
    pub nodes: Vec<f64>,
    /// Weights matching `nodes`.
    pub weights: Vec<f64>,
}

impl GaussLegendre {
    /// Build an `n`-point rule (n >= 1) by Newton iteration on P_n.
    pub fn new(n: usize) -> Self {
        let n = n.max(1);
        let mut pairs: Vec<(f64, f64)> = Vec::with_capacity(n);

        for i in 0..n.div_ceil(2) {
            let mut x = ((4 * i + 3) as f64 / (4 * n + 2) as f64 * std::f64::consts::PI).cos();
            for _ in 0..100 {
                let (p, dp) = legendre_eval(n, x);
                let dx = p / dp;
                x -= dx;
                if dx.abs() < 1e-15 {
                    break;
                }
            }
            let (_, dp) = legendre_eval(n, x);
            let w = 2.0 / ((1.0 - x * x) * dp * dp);

            if 2 * i + 1 == n {
                pairs.push((0.0, w));
            } else {
                pairs.push((x, w));
                pairs.push((-x, w));
            }
        }

        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
        let (nodes, weights) = pairs.into_iter().unzip();
        Self { nodes, weights }
    }

    /// Integrate `f` over [a, b].
    pub fn integrate<F>(&self, f: F, a: f64, b: f64) -> f64
    where
        F: Fn(f64) -> f64,
    {
        let mid = 0.5 * (a + b);
        let half = 0.5 * (b - a);
        self.nodes
            .iter()
            .zip(&self.weights)
            .map(|(&node, &w)| w * f(mid + half * node))
            .sum::<f64>()
            * half
    }
}

/// P_n(x) and P_n'(x) by the three-term recurrence.
fn legendre_eval(n: usize, x: f64) -> (f64, f64) {
    if n == 0 {
        return (1.0, 0.0);
    }
    let (mut p_prev, mut p_curr) = (1.0, x);
    let (mut dp_prev, mut dp_curr) = (0.0, 1.0);
    for k in 1..n {
        let kf = k as f64;
        let p_next = ((2.0 * kf + 1.0) * x * p_curr - kf * p_prev) / (kf + 1.0);
        let dp_next = ((2.0 * kf + 1.0) * (p_curr + x * dp_curr) - kf * dp_prev) / (kf + 1.0);
        p_prev = p_curr;
        p_curr = p_next;
        dp_prev = dp_curr;
        dp_curr = dp_next;
    }
    (p_curr, dp_curr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_sum_to_two() {
        for n in [1, 2, 5, 8, 13] {
            let rule = GaussLegendre::new(n);
            assert_eq!(rule.nodes.len(), n);
            let total: f64 = rule.weights.iter().sum();
            assert!((total - 2.0).abs() < 1e-13);
        }
    }

    #[test]
    fn test_exact_for_high_degree() {
        let rule = GaussLegendre::new(6);
        // Exact through degree 11.
        let result = rule.integrate(|x| x.powi(10) - 3.0 * x.powi(3), 0.0, 1.0);
        assert!((result - (1.0 / 11.0 - 0.75)).abs() < 1e-13);
    }

    #[test]
    fn test_smooth_function() {
        let rule = GaussLegendre::new(10);
        let result = rule.integrate(f64::sin, 0.0, std::f64::consts::PI);
        assert!((result - 2.0).abs() < 1e-12);
    }
}
