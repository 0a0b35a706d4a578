//! CPU implementation of state-space conversions.
//!
//! # Why CPU-Only?
//!
//! Both directions are driven by the Faddeev-LeVerrier recurrence
//!
//! ```text
//! M_k = A * M_{k-1} + c_k * I
//! ```
//!
//! which is inherently sequential, and the matrices are tiny (d×d with d the
//! system order). Device transfer would cost more than the arithmetic.

use crate::common::polynomial;
use crate::lti::cpu::helpers::{transfer_coefficients, StateSpaceData};
use crate::lti::error::LtiResult;
use crate::lti::traits::conversions::StateSpaceConversions;
use crate::lti::types::{LtiSystem, TransferFunction, COEFF_EPS};
use numr::runtime::cpu::{CpuClient, CpuRuntime};

impl StateSpaceConversions<CpuRuntime> for CpuClient {
    fn tf2ss(&self, tf: &TransferFunction<CpuRuntime>) -> LtiResult<LtiSystem<CpuRuntime>> {
        tf2ss_impl(tf)
    }

    fn ss2tf(&self, sys: &LtiSystem<CpuRuntime>) -> LtiResult<TransferFunction<CpuRuntime>> {
        ss2tf_impl(sys)
    }
}

// ============================================================================
// Implementation Functions (CPU-only, not generic)
// ============================================================================

/// Controllable canonical (companion) form.
fn tf2ss_impl(tf: &TransferFunction<CpuRuntime>) -> LtiResult<LtiSystem<CpuRuntime>> {
    let num: Vec<f64> = tf.num.to_vec();
    let den: Vec<f64> = tf.den.to_vec();
    let device = tf.num.device();

    // Validated at construction: den[0] != 0 and the system is proper.
    let a0 = den[0];
    let n = den.len() - 1;
    let den_norm: Vec<f64> = den.iter().map(|&x| x / a0).collect();

    // Right-align the numerator against the denominator, dropping leading
    // zeros beyond degree n.
    let mut num_pad = vec![0.0; n + 1];
    let first = num
        .iter()
        .position(|v| v.abs() >= COEFF_EPS)
        .unwrap_or(num.len().saturating_sub(1));
    let trimmed = &num[first..];
    let offset = n + 1 - trimmed.len();
    for (i, &bi) in trimmed.iter().enumerate() {
        num_pad[offset + i] = bi / a0;
    }

    let d_val = num_pad[0];
    if n == 0 {
        return LtiSystem::from_slices(&[], &[], &[], d_val, device);
    }

    let mut a_mat = vec![0.0; n * n];
    for i in 0..n - 1 {
        a_mat[i * n + i + 1] = 1.0;
    }
    for j in 0..n {
        a_mat[(n - 1) * n + j] = -den_norm[n - j];
    }

    let mut b_mat = vec![0.0; n];
    b_mat[n - 1] = 1.0;

    // C holds the ascending coefficients of num − D·den.
    let c_mat: Vec<f64> = (0..n)
        .map(|i| num_pad[n - i] - d_val * den_norm[n - i])
        .collect();

    LtiSystem::from_slices(&a_mat, &b_mat, &c_mat, d_val, device)
}

/// Transfer function by the rank-one determinant identity.
fn ss2tf_impl(sys: &LtiSystem<CpuRuntime>) -> LtiResult<TransferFunction<CpuRuntime>> {
    let ss = StateSpaceData::from_system(sys);
    let (num, den) = transfer_coefficients(&ss);

    // Drop numerator leading zeros produced by cancellation so the degree
    // reported downstream is meaningful.
    let scale = num.iter().fold(0.0_f64, |m, v| m.max(v.abs())).max(1.0);
    let num_asc = polynomial::trim(&polynomial::to_ascending(&num), COEFF_EPS * scale);
    let num = polynomial::to_descending(&num_asc);

    TransferFunction::from_slices(&num, &den, sys.a.device())
}

// ============================================================================
// Tests
// ============================================================================
