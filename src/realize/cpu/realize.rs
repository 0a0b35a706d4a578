//! CPU implementation of realization transforms.

use crate::common::{dense, linalg};
use crate::lti::error::{LtiError, LtiResult};
use crate::lti::types::{DiscreteLtiSystem, LtiSystem};
use crate::lti::{host_tensor, transfer_coefficients, DiscreteData, StateSpaceData};
use crate::realize::cpu::gramians::{
    balance_data, control_gram_data, l1_norm_data, observe_gram_data, state_l1_norm_data,
    state_norm_data, state_norm_discrete_data,
};
use crate::realize::traits::RealizationAlgorithms;
use crate::realize::types::{BalancedTransform, L1Norm, L1NormOptions, Realization, Realizer};
use numr::runtime::cpu::{CpuClient, CpuDevice, CpuRuntime};
use numr::tensor::Tensor;

/// Transforms with a larger 2-norm condition number are rejected.
pub(crate) const MAX_TRANSFORM_CONDITION: f64 = 1e12;

impl RealizationAlgorithms<CpuRuntime> for CpuClient {
    fn realize(
        &self,
        sys: &LtiSystem<CpuRuntime>,
        realizer: Realizer,
    ) -> LtiResult<Realization<CpuRuntime>> {
        let ss = StateSpaceData::from_system(sys);
        let realized = realize_data(self, &ss, realizer)?;
        realized.into_realization(sys.a.device())
    }

    fn realize_with(
        &self,
        sys: &LtiSystem<CpuRuntime>,
        transform: &Tensor<CpuRuntime>,
    ) -> LtiResult<Realization<CpuRuntime>> {
        let ss = StateSpaceData::from_system(sys);
        let n = ss.n;
        if transform.shape() != [n, n] {
            return Err(LtiError::InvalidInput {
                context: format!(
                    "transform must have shape [{}, {}], got {:?}",
                    n,
                    n,
                    transform.shape()
                ),
            });
        }
        let t: Vec<f64> = transform.to_vec();
        let t_inv = linalg::inverse(self, &t, n).map_err(|_| LtiError::NonMinimalSystem {
            context: "realization transform is singular".to_string(),
        })?;
        RealizedData::new(self, &ss, t, t_inv, Realizer::Identity)?
            .into_realization(sys.a.device())
    }

    fn control_gram(&self, sys: &LtiSystem<CpuRuntime>) -> LtiResult<Tensor<CpuRuntime>> {
        let ss = StateSpaceData::from_system(sys);
        let p = control_gram_data(self, &ss)?;
        Ok(host_tensor(&p, &[ss.n, ss.n], sys.a.device()))
    }

    fn observe_gram(&self, sys: &LtiSystem<CpuRuntime>) -> LtiResult<Tensor<CpuRuntime>> {
        let ss = StateSpaceData::from_system(sys);
        let q = observe_gram_data(self, &ss)?;
        Ok(host_tensor(&q, &[ss.n, ss.n], sys.a.device()))
    }

    fn hankel_singular_values(
        &self,
        sys: &LtiSystem<CpuRuntime>,
    ) -> LtiResult<Tensor<CpuRuntime>> {
        let ss = StateSpaceData::from_system(sys);
        let n = ss.n;
        let p = control_gram_data(self, &ss)?;
        let q = observe_gram_data(self, &ss)?;
        // σᵢ² are the eigenvalues of P Q; for symmetric PSD gramians these are
        // the squared singular values of Lqᵀ Lp with any square-root factors.
        let lp = psd_sqrt(self, &p, n)?;
        let lq = psd_sqrt(self, &q, n)?;
        let m = dense::matmul(&dense::transpose(&lq, n, n), &lp, n, n, n);
        let dec = linalg::svd(self, &m, n)?;
        Ok(host_tensor(&dec.s, &[dec.s.len()], sys.a.device()))
    }

    fn balanced_transformation(
        &self,
        sys: &LtiSystem<CpuRuntime>,
    ) -> LtiResult<BalancedTransform<CpuRuntime>> {
        let ss = StateSpaceData::from_system(sys);
        let (t, t_inv, hankel) = balance_data(self, &ss)?;
        let device = sys.a.device();
        Ok(BalancedTransform {
            transform: host_tensor(&t, &[ss.n, ss.n], device),
            inverse: host_tensor(&t_inv, &[ss.n, ss.n], device),
            hankel: host_tensor(&hankel, &[hankel.len()], device),
        })
    }

    fn state_norm(&self, sys: &LtiSystem<CpuRuntime>) -> LtiResult<Tensor<CpuRuntime>> {
        let ss = StateSpaceData::from_system(sys);
        let norms = state_norm_data(self, &ss)?;
        Ok(host_tensor(&norms, &[ss.n], sys.a.device()))
    }

    fn state_norm_discrete(
        &self,
        sys: &DiscreteLtiSystem<CpuRuntime>,
    ) -> LtiResult<Tensor<CpuRuntime>> {
        let dd = DiscreteData::from_system(sys);
        let norms = state_norm_discrete_data(self, &dd)?;
        Ok(host_tensor(&norms, &[dd.n], sys.a.device()))
    }

    fn l1_norm(&self, sys: &LtiSystem<CpuRuntime>, options: &L1NormOptions) -> LtiResult<L1Norm> {
        l1_norm_data(self, &StateSpaceData::from_system(sys), options)
    }

    fn state_l1_norm(
        &self,
        sys: &LtiSystem<CpuRuntime>,
        options: &L1NormOptions,
    ) -> LtiResult<Tensor<CpuRuntime>> {
        let ss = StateSpaceData::from_system(sys);
        let norms = state_l1_norm_data(self, &ss, options)?;
        Ok(host_tensor(&norms, &[ss.n], sys.a.device()))
    }
}

// ============================================================================
// Implementation Functions (CPU-only, not generic)
// ============================================================================

/// A realized system with its transform, on the host.
#[derive(Debug, Clone)]
pub(crate) struct RealizedData {
    pub system: StateSpaceData,
    pub t: Vec<f64>,
    pub t_inv: Vec<f64>,
    pub realizer: Realizer,
    pub condition: f64,
}

impl RealizedData {
    fn new(
        client: &CpuClient,
        ss: &StateSpaceData,
        t: Vec<f64>,
        t_inv: Vec<f64>,
        realizer: Realizer,
    ) -> LtiResult<Self> {
        let condition = linalg::condition_number(client, &t, ss.n)?;
        if !(condition <= MAX_TRANSFORM_CONDITION) {
            return Err(LtiError::NonMinimalSystem {
                context: format!(
                    "{:?} transform is near-singular (condition number {:.3e})",
                    realizer, condition
                ),
            });
        }
        if condition > MAX_TRANSFORM_CONDITION.sqrt() {
            tracing::warn!(?realizer, condition, "poorly conditioned realization transform");
        } else {
            tracing::debug!(?realizer, condition, "realization transform");
        }
        Ok(Self {
            system: ss.similarity(&t, &t_inv),
            t,
            t_inv,
            realizer,
            condition,
        })
    }

    pub fn into_realization(self, device: &CpuDevice) -> LtiResult<Realization<CpuRuntime>> {
        let n = self.system.n;
        Ok(Realization {
            system: self.system.to_system(device)?,
            transform: host_tensor(&self.t, &[n, n], device),
            inverse: host_tensor(&self.t_inv, &[n, n], device),
            realizer: self.realizer,
            condition: self.condition,
        })
    }
}

pub(crate) fn realize_data(
    client: &CpuClient,
    ss: &StateSpaceData,
    realizer: Realizer,
) -> LtiResult<RealizedData> {
    let n = ss.n;
    let (t, t_inv) = match realizer {
        Realizer::Identity => (dense::identity(n), dense::identity(n)),
        Realizer::Balanced => {
            let (t, t_inv, _) = balance_data(client, ss)?;
            (t, t_inv)
        }
        Realizer::H2Norm => diagonal_scaling(&state_norm_data(client, ss)?, "H2")?,
        Realizer::L1Norm => diagonal_scaling(
            &state_l1_norm_data(client, ss, &L1NormOptions::default())?,
            "L1",
        )?,
        Realizer::ControllableCanonical => controllable_canonical(client, ss)?,
    };
    RealizedData::new(client, ss, t, t_inv, realizer)
}

/// T = diag(1/normᵢ) so every state ends up with unit norm.
fn diagonal_scaling(norms: &[f64], kind: &str) -> LtiResult<(Vec<f64>, Vec<f64>)> {
    let n = norms.len();
    let mut t = vec![0.0; n * n];
    let mut t_inv = vec![0.0; n * n];
    for (i, &norm) in norms.iter().enumerate() {
        if !(norm > 0.0) || !norm.is_finite() {
            return Err(LtiError::NonMinimalSystem {
                context: format!("state {} has zero {} norm (uncontrollable)", i, kind),
            });
        }
        t[i * n + i] = 1.0 / norm;
        t_inv[i * n + i] = norm;
    }
    Ok((t, t_inv))
}

/// T = W_c W⁻¹ with W, W_c the controllability matrices of the system and of
/// its companion form.
fn controllable_canonical(
    client: &CpuClient,
    ss: &StateSpaceData,
) -> LtiResult<(Vec<f64>, Vec<f64>)> {
    let n = ss.n;
    let (_, den) = transfer_coefficients(ss);
    let mut companion = vec![0.0; n * n];
    for i in 0..n.saturating_sub(1) {
        companion[i * n + i + 1] = 1.0;
    }
    for j in 0..n {
        companion[(n - 1) * n + j] = -den[n - j];
    }
    let mut e_last = vec![0.0; n];
    if let Some(last) = e_last.last_mut() {
        *last = 1.0;
    }

    let w = controllability_matrix(&ss.a, &ss.b, n);
    let w_c = controllability_matrix(&companion, &e_last, n);
    let w_inv = linalg::inverse(client, &w, n).map_err(|_| LtiError::NonMinimalSystem {
        context: "controllability matrix is singular (uncontrollable mode)".to_string(),
    })?;
    let w_c_inv = linalg::inverse(client, &w_c, n).map_err(|_| LtiError::NonMinimalSystem {
        context: "companion controllability matrix is singular".to_string(),
    })?;
    Ok((
        dense::matmul(&w_c, &w_inv, n, n, n),
        dense::matmul(&w, &w_c_inv, n, n, n),
    ))
}

/// [B, AB, ..., A^{n-1}B] as an n×n matrix.
fn controllability_matrix(a: &[f64], b: &[f64], n: usize) -> Vec<f64> {
    let mut w = vec![0.0; n * n];
    let mut col = b.to_vec();
    for j in 0..n {
        for i in 0..n {
            w[i * n + j] = col[i];
        }
        col = dense::matvec(a, &col, n, n);
    }
    w
}

/// Symmetric square root factor L with L Lᵀ = X for a PSD matrix, falling
/// back to the SVD when Cholesky fails on a singular gramian.
fn psd_sqrt(client: &CpuClient, x: &[f64], n: usize) -> LtiResult<Vec<f64>> {
    if let Ok(l) = linalg::cholesky(client, x, n) {
        return Ok(l);
    }
    let dec = linalg::svd(client, x, n)?;
    let mut l = dec.u;
    for i in 0..n {
        for j in 0..n {
            l[i * n + j] *= dec.s[j].max(0.0).sqrt();
        }
    }
    Ok(l)
}

// ============================================================================
// Tests
// ============================================================================
