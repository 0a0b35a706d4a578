//! LTI system representation types.
//!
//! All systems are single-input single-output:
//!
//! - [`LtiSystem`]: continuous-time state-space quadruple (A, B, C, D)
//! - [`TransferFunction`]: numerator/denominator polynomials in s
//! - [`DiscreteLtiSystem`]: zero-order-hold discretization of an [`LtiSystem`]
//!
//! # Coefficient Convention
//!
//! Transfer-function coefficients use **descending power order** (highest
//! power first): `H(s) = (num[0] s^m + ... + num[m]) / (den[0] s^n + ... + den[n])`.

use crate::lti::error::{LtiError, LtiResult};
use numr::dtype::DType;
use numr::runtime::Runtime;
use numr::tensor::Tensor;

/// Coefficients smaller than this are treated as zero when trimming
/// polynomials.
pub(crate) const COEFF_EPS: f64 = 1e-14;

/// Continuous-time SISO state-space system.
///
/// ```text
/// dx/dt = A x + B u
///     y = C x + D u
/// ```
///
/// Instances are immutable; every algebra operation returns a new system.
#[derive(Debug, Clone)]
pub struct LtiSystem<R: Runtime> {
    /// State matrix (d × d).
    pub a: Tensor<R>,
    /// Input matrix (d × 1).
    pub b: Tensor<R>,
    /// Output matrix (1 × d).
    pub c: Tensor<R>,
    /// Feedthrough (1 × 1).
    pub d: Tensor<R>,
}

impl<R: Runtime> LtiSystem<R> {
    /// Create a state-space system, validating SISO shapes.
    ///
    /// A zero-order system (pure gain) has `a` of shape [0, 0], `b` of shape
    /// [0, 1] and `c` of shape [1, 0].
    pub fn new(a: Tensor<R>, b: Tensor<R>, c: Tensor<R>, d: Tensor<R>) -> LtiResult<Self> {
        let n = match a.shape() {
            [rows, cols] if rows == cols => *rows,
            shape => {
                return Err(LtiError::DegenerateSystem {
                    context: format!("A must be square, got shape {:?}", shape),
                })
            }
        };
        if b.shape() != [n, 1] {
            return Err(LtiError::DegenerateSystem {
                context: format!("B must have shape [{}, 1], got {:?}", n, b.shape()),
            });
        }
        if c.shape() != [1, n] {
            return Err(LtiError::DegenerateSystem {
                context: format!("C must have shape [1, {}], got {:?}", n, c.shape()),
            });
        }
        if d.shape() != [1, 1] {
            return Err(LtiError::DegenerateSystem {
                context: format!("D must have shape [1, 1], got {:?}", d.shape()),
            });
        }
        Ok(Self { a, b, c, d })
    }

    /// Build a system from row-major slices.
    pub fn from_slices(
        a: &[f64],
        b: &[f64],
        c: &[f64],
        d: f64,
        device: &R::Device,
    ) -> LtiResult<Self> {
        let n = b.len();
        if a.len() != n * n || c.len() != n {
            return Err(LtiError::DegenerateSystem {
                context: format!(
                    "inconsistent sizes: |A| = {}, |B| = {}, |C| = {}",
                    a.len(),
                    b.len(),
                    c.len()
                ),
            });
        }
        if n == 0 {
            return Self::new(
                Tensor::zeros(&[0, 0], DType::F64, device),
                Tensor::zeros(&[0, 1], DType::F64, device),
                Tensor::zeros(&[1, 0], DType::F64, device),
                Tensor::from_slice(&[d], &[1, 1], device),
            );
        }
        Self::new(
            Tensor::from_slice(a, &[n, n], device),
            Tensor::from_slice(b, &[n, 1], device),
            Tensor::from_slice(c, &[1, n], device),
            Tensor::from_slice(&[d], &[1, 1], device),
        )
    }

    /// A static gain with no states.
    pub fn gain(k: f64, device: &R::Device) -> LtiResult<Self> {
        Self::from_slices(&[], &[], &[], k, device)
    }

    /// Number of states (the system order d).
    pub fn order(&self) -> usize {
        self.a.shape()[0]
    }

    /// Feedthrough term D.
    pub fn feedthrough(&self) -> f64 {
        let d: Vec<f64> = self.d.to_vec();
        d.first().copied().unwrap_or(0.0)
    }

    /// True when D is exactly zero.
    pub fn is_strictly_proper(&self) -> bool {
        self.feedthrough() == 0.0
    }
}

/// Continuous-time transfer function `num(s) / den(s)`.
#[derive(Debug, Clone)]
pub struct TransferFunction<R: Runtime> {
    /// Numerator coefficients in descending power order.
    pub num: Tensor<R>,
    /// Denominator coefficients in descending power order.
    pub den: Tensor<R>,
}

impl<R: Runtime> TransferFunction<R> {
    /// Create a transfer function, rejecting improper or degenerate
    /// descriptions.
    ///
    /// Leading zeros of the numerator are ignored. Fails if the denominator
    /// is empty, has a zero leading coefficient, or has lower degree than
    /// the numerator.
    pub fn new(num: Tensor<R>, den: Tensor<R>) -> LtiResult<Self> {
        if num.ndim() != 1 || den.ndim() != 1 {
            return Err(LtiError::DegenerateSystem {
                context: "transfer function coefficients must be 1D".to_string(),
            });
        }
        let den_data: Vec<f64> = den.to_vec();
        let num_data: Vec<f64> = num.to_vec();
        if den_data.is_empty() || num_data.is_empty() {
            return Err(LtiError::DegenerateSystem {
                context: "transfer function coefficients cannot be empty".to_string(),
            });
        }
        if den_data[0].abs() < COEFF_EPS {
            return Err(LtiError::DegenerateSystem {
                context: "leading denominator coefficient is zero".to_string(),
            });
        }
        let num_degree = num_data
            .iter()
            .position(|v| v.abs() >= COEFF_EPS)
            .map(|first| num_data.len() - 1 - first)
            .unwrap_or(0);
        let den_degree = den_data.len() - 1;
        if num_degree > den_degree {
            return Err(LtiError::DegenerateSystem {
                context: format!(
                    "numerator order {} exceeds denominator order {} (improper)",
                    num_degree, den_degree
                ),
            });
        }
        Ok(Self { num, den })
    }

    /// Build a transfer function from descending coefficient slices.
    pub fn from_slices(num: &[f64], den: &[f64], device: &R::Device) -> LtiResult<Self> {
        Self::new(
            Tensor::from_slice(num, &[num.len()], device),
            Tensor::from_slice(den, &[den.len()], device),
        )
    }

    /// Degree of the denominator.
    pub fn order(&self) -> usize {
        self.den.shape()[0].saturating_sub(1)
    }
}

/// Zero-order-hold discretization of a continuous system.
///
/// ```text
/// x[k+1] = Ad x[k] + Bd u[k]
///   y[k] = C x[k] + D u[k]
/// ```
#[derive(Debug, Clone)]
pub struct DiscreteLtiSystem<R: Runtime> {
    /// Discrete state matrix (d × d).
    pub a: Tensor<R>,
    /// Discrete input matrix (d × 1).
    pub b: Tensor<R>,
    /// Output matrix (1 × d).
    pub c: Tensor<R>,
    /// Feedthrough (1 × 1).
    pub d: Tensor<R>,
    /// Sampling period.
    pub dt: f64,
}

impl<R: Runtime> DiscreteLtiSystem<R> {
    /// Number of states.
    pub fn order(&self) -> usize {
        self.a.shape()[0]
    }
}

/// Result of filtering a signal through a discretized system.
#[derive(Debug, Clone)]
pub struct FilterResult<R: Runtime> {
    /// Output sequence [n_samples].
    pub y: Tensor<R>,
    /// State trajectory [n_samples, d] (state before each sample's update).
    pub x: Tensor<R>,
    /// State after the last sample [d]; pass back as `initial_state` to
    /// continue filtering.
    pub final_state: Tensor<R>,
}
