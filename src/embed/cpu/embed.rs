//! CPU implementation of synapse embedding.
//!
//! # Why CPU-Only?
//!
//! The mapping is a handful of d×d matrix polynomials in the realized state
//! matrix, with d the target order and at most a few synapse coefficients.

use crate::common::{dense, linalg};
use crate::embed::traits::SynapseEmbedding;
use crate::embed::types::{EmbeddingOptions, WeightMapping};
use crate::lti::error::{LtiError, LtiResult};
use crate::lti::types::LtiSystem;
use crate::lti::{host_tensor, transfer_coefficients, DiscreteData, StateSpaceData};
use crate::realize::realize_data;
use crate::realize::types::Realization;
use numr::runtime::cpu::{CpuClient, CpuDevice, CpuRuntime};

/// Numerator coefficients below this fraction of the largest one are zero.
const ZERO_RTOL: f64 = 1e-9;

impl SynapseEmbedding<CpuRuntime> for CpuClient {
    fn embed(
        &self,
        target: &LtiSystem<CpuRuntime>,
        synapse: &LtiSystem<CpuRuntime>,
        options: &EmbeddingOptions,
    ) -> LtiResult<WeightMapping<CpuRuntime>> {
        let syn = StateSpaceData::from_system(synapse);
        check_synapse(self, &syn, options)?;
        let coeffs = synapse_coefficients(&syn)?;

        let realized = realize_data(self, &target_data(target)?, options.realizer)?;
        let ss = realized.system.clone();
        let mapped = map_dynamics(&ss.a, &ss.b, ss.n, &coeffs, |a, n| {
            linalg::is_hurwitz(self, a, n)
        })?;

        tracing::debug!(
            order = ss.n,
            synapse_order = syn.n,
            realizer = ?options.realizer,
            "continuous synapse embedding"
        );

        let device = target.a.device();
        build_mapping(mapped, &ss, realized.into_realization(device)?, synapse, None, device)
    }

    fn embed_discrete(
        &self,
        target: &LtiSystem<CpuRuntime>,
        synapse: &LtiSystem<CpuRuntime>,
        dt: f64,
        options: &EmbeddingOptions,
    ) -> LtiResult<WeightMapping<CpuRuntime>> {
        let syn = StateSpaceData::from_system(synapse);
        check_synapse(self, &syn, options)?;
        let syn_d = DiscreteData::zoh(self, &syn, dt)?;
        let coeffs = synapse_coefficients(&StateSpaceData {
            n: syn_d.n,
            a: syn_d.a,
            b: syn_d.b,
            c: syn_d.c,
            d: syn_d.d,
        })?;

        let realized = realize_data(self, &target_data(target)?, options.realizer)?;
        let ss = realized.system.clone();
        let target_d = DiscreteData::zoh(self, &ss, dt)?;
        let mapped = map_dynamics(&target_d.a, &target_d.b, ss.n, &coeffs, |a, n| {
            linalg::is_schur(self, a, n)
        })?;

        tracing::debug!(
            order = ss.n,
            synapse_order = syn.n,
            dt,
            realizer = ?options.realizer,
            "discrete synapse embedding"
        );

        let device = target.a.device();
        build_mapping(
            mapped,
            &ss,
            realized.into_realization(device)?,
            synapse,
            Some(dt),
            device,
        )
    }
}

// ============================================================================
// Implementation Functions (CPU-only, not generic)
// ============================================================================

/// W_rec and the input taps B_0, B_1, ...
struct MappedDynamics {
    recurrent: Vec<f64>,
    taps: Vec<Vec<f64>>,
}

fn target_data(target: &LtiSystem<CpuRuntime>) -> LtiResult<StateSpaceData> {
    let ss = StateSpaceData::from_system(target);
    if ss.n == 0 {
        return Err(LtiError::InvalidInput {
            context: "target system has no states to embed".to_string(),
        });
    }
    Ok(ss)
}

fn check_synapse(
    client: &CpuClient,
    syn: &StateSpaceData,
    options: &EmbeddingOptions,
) -> LtiResult<()> {
    if syn.n == 0 {
        return Err(LtiError::IncompatibleSynapse {
            context: "synapse is a static gain; it needs at least one state".to_string(),
        });
    }
    if syn.n > options.max_synapse_order {
        return Err(LtiError::IncompatibleSynapse {
            context: format!(
                "synapse order {} exceeds the supported maximum {}",
                syn.n, options.max_synapse_order
            ),
        });
    }
    if !linalg::is_hurwitz(client, &syn.a, syn.n) {
        return Err(LtiError::IncompatibleSynapse {
            context: "synapse is not strictly stable".to_string(),
        });
    }
    Ok(())
}

/// cᵢ with H(x) = 1 / Σᵢ cᵢ xⁱ (x = s or z), ascending.
fn synapse_coefficients(syn: &StateSpaceData) -> LtiResult<Vec<f64>> {
    let (num, den) = transfer_coefficients(syn);
    let n = syn.n;
    let scale = num.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
    let gain = num[n];
    if num[..n].iter().any(|v| v.abs() > ZERO_RTOL * scale) {
        return Err(LtiError::IncompatibleSynapse {
            context: format!("synapse has finite zeros (numerator {:?})", num),
        });
    }
    if !(gain.abs() > ZERO_RTOL * scale) {
        return Err(LtiError::IncompatibleSynapse {
            context: "synapse has zero DC gain".to_string(),
        });
    }
    Ok(den.iter().rev().map(|v| v / gain).collect())
}

/// Solve Σᵢ cᵢ Mⁱ = W_rec and the input taps for state matrix `a` and input
/// `b`, rejecting mappings whose feedback loop adds unstable modes.
///
/// The loop's modes are those of `a` plus the eigenvalues of the block
/// companion linearization of Σ_k x^k P_k with P_k = Σ_{i>k} cᵢ a^(i−1−k).
fn map_dynamics(
    a: &[f64],
    b: &[f64],
    n: usize,
    coeffs: &[f64],
    is_stable: impl Fn(&[f64], usize) -> bool,
) -> LtiResult<MappedDynamics> {
    let m = coeffs.len() - 1;

    let mut powers = vec![dense::identity(n)];
    for i in 1..=m {
        let next = dense::matmul(&powers[i - 1], a, n, n, n);
        powers.push(next);
    }

    let mut recurrent = vec![0.0; n * n];
    for (ci, pow) in coeffs.iter().zip(&powers) {
        for (w, p) in recurrent.iter_mut().zip(pow) {
            *w += ci * p;
        }
    }

    let p_mats: Vec<Vec<f64>> = (0..m)
        .map(|k| {
            let mut pk = vec![0.0; n * n];
            for i in (k + 1)..=m {
                for (dst, src) in pk.iter_mut().zip(&powers[i - 1 - k]) {
                    *dst += coeffs[i] * src;
                }
            }
            pk
        })
        .collect();
    let taps: Vec<Vec<f64>> = p_mats.iter().map(|pk| dense::matvec(pk, b, n, n)).collect();

    if m > 1 {
        let size = n * (m - 1);
        let lead = coeffs[m];
        let mut lin = vec![0.0; size * size];
        for blk in 0..m - 2 {
            for i in 0..n {
                lin[(blk * n + i) * size + (blk + 1) * n + i] = 1.0;
            }
        }
        let last = (m - 2) * n;
        for (k, pk) in p_mats.iter().take(m - 1).enumerate() {
            for i in 0..n {
                for j in 0..n {
                    lin[(last + i) * size + k * n + j] = -pk[i * n + j] / lead;
                }
            }
        }
        if !is_stable(&lin, size) {
            return Err(LtiError::IncompatibleSynapse {
                context: "the feedback loop would have unstable modes; the target dynamics \
                          are too fast for this synapse"
                    .to_string(),
            });
        }
    }

    Ok(MappedDynamics { recurrent, taps })
}

fn build_mapping(
    mapped: MappedDynamics,
    ss: &StateSpaceData,
    realization: Realization<CpuRuntime>,
    synapse: &LtiSystem<CpuRuntime>,
    dt: Option<f64>,
    device: &CpuDevice,
) -> LtiResult<WeightMapping<CpuRuntime>> {
    let n = ss.n;
    let mut taps = mapped.taps.into_iter();
    let input = taps.next().ok_or_else(|| LtiError::IncompatibleSynapse {
        context: "synapse has no dynamics".to_string(),
    })?;
    Ok(WeightMapping {
        recurrent: host_tensor(&mapped.recurrent, &[n, n], device),
        input: host_tensor(&input, &[n, 1], device),
        input_derivatives: taps.map(|t| host_tensor(&t, &[n, 1], device)).collect(),
        readout: host_tensor(&ss.c, &[1, n], device),
        feedthrough: ss.d,
        realization,
        synapse: synapse.clone(),
        dt,
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delay::traits::pade::DelayApproximation;
    use crate::lti::evaluate_at;
    use crate::lti::synapses;
    use crate::lti::traits::algebra::LtiAlgebra;
    use crate::realize::types::Realizer;
    use num_complex::Complex64;

    fn setup() -> (CpuClient, CpuDevice) {
        let device = CpuDevice::new();
        let client = CpuClient::new(device.clone());
        (client, device)
    }

    fn identity_options() -> EmbeddingOptions {
        EmbeddingOptions {
            realizer: Realizer::Identity,
            ..Default::default()
        }
    }

    /// Output of the synapse network at x (s or z), where `syn` evaluates
    /// the synapse transfer function.
    ///
    /// The state solves (c(x) I − W_rec) X = Σ_k x^k B_k, written as a real
    /// block system in (Re X, Im X).
    fn network_response(
        client: &CpuClient,
        map: &WeightMapping<CpuRuntime>,
        syn: &StateSpaceData,
        x: Complex64,
    ) -> Complex64 {
        let n = map.dimensions();
        let c_x = Complex64::new(1.0, 0.0) / evaluate_at(client, syn, x).unwrap();
        let w: Vec<f64> = map.recurrent.to_vec();
        let b0: Vec<f64> = map.input.to_vec();
        let mut rhs: Vec<Complex64> = b0.iter().map(|&v| Complex64::new(v, 0.0)).collect();
        let mut xk = x;
        for tap in &map.input_derivatives {
            let bk: Vec<f64> = tap.to_vec();
            for (r, v) in rhs.iter_mut().zip(&bk) {
                *r += xk * v;
            }
            xk *= x;
        }

        let m = 2 * n;
        let mut block = vec![0.0; m * m];
        for i in 0..n {
            for j in 0..n {
                block[i * m + j] = -w[i * n + j];
                block[(n + i) * m + n + j] = -w[i * n + j];
            }
            block[i * m + i] += c_x.re;
            block[(n + i) * m + n + i] += c_x.re;
            block[i * m + n + i] = -c_x.im;
            block[(n + i) * m + i] = c_x.im;
        }
        let mut real_rhs: Vec<f64> = rhs.iter().map(|r| r.re).collect();
        real_rhs.extend(rhs.iter().map(|r| r.im));
        let state = linalg::solve(client, &block, &real_rhs, m, 1).unwrap();

        let c: Vec<f64> = map.readout.to_vec();
        Complex64::new(dense::dot(&c, &state[..n]), dense::dot(&c, &state[n..])) + map.feedthrough
    }

    #[test]
    fn test_lowpass_closed_form() {
        let (client, device) = setup();

        let tau = 0.02;
        let target =
            LtiSystem::<CpuRuntime>::from_slices(&[-3.0], &[2.0], &[1.5], 0.0, &device).unwrap();
        let syn = synapses::lowpass::<CpuRuntime>(tau, &device).unwrap();
        let map = client.embed(&target, &syn, &identity_options()).unwrap();

        let w: Vec<f64> = map.recurrent.to_vec();
        let b: Vec<f64> = map.input.to_vec();
        assert!((w[0] - (tau * -3.0 + 1.0)).abs() < 1e-15);
        assert!((b[0] - tau * 2.0).abs() < 1e-15);
        assert!(map.is_first_order());
        assert!(map.dt.is_none());
    }

    #[test]
    fn test_lowpass_closed_form_in_realized_basis() {
        let (client, device) = setup();

        let tau = 0.05;
        let delay = client.pade_delay(0.1, 4).unwrap();
        let syn = synapses::lowpass::<CpuRuntime>(tau, &device).unwrap();
        let map = client
            .embed(&delay.system, &syn, &EmbeddingOptions::default())
            .unwrap();
        assert_eq!(map.realization.realizer, Realizer::Balanced);

        let a: Vec<f64> = map.realization.system.a.to_vec();
        let b: Vec<f64> = map.realization.system.b.to_vec();
        let w: Vec<f64> = map.recurrent.to_vec();
        let w_in: Vec<f64> = map.input.to_vec();
        for i in 0..4 {
            for j in 0..4 {
                let expected = tau * a[i * 4 + j] + if i == j { 1.0 } else { 0.0 };
                assert!((w[i * 4 + j] - expected).abs() < 1e-12);
            }
            assert!((w_in[i] - tau * b[i]).abs() < 1e-12);
        }
    }

    #[test]
    fn test_network_reproduces_target_for_second_order_synapses() {
        let (client, device) = setup();

        let delay = client.pade_delay(0.5, 3).unwrap();
        let target = StateSpaceData::from_system(&delay.system);
        for syn in [
            synapses::lowpass::<CpuRuntime>(0.05, &device).unwrap(),
            synapses::alpha::<CpuRuntime>(0.02, &device).unwrap(),
            synapses::double_exp::<CpuRuntime>(0.005, 0.03, &device).unwrap(),
        ] {
            let map = client
                .embed(&delay.system, &syn, &EmbeddingOptions::default())
                .unwrap();
            let syn_data = StateSpaceData::from_system(&syn);
            assert_eq!(map.input_derivatives.len(), syn_data.n - 1);
            for w in [0.0, 0.5, 3.0, 20.0] {
                let s = Complex64::new(0.0, w);
                let got = network_response(&client, &map, &syn_data, s);
                let want = evaluate_at(&client, &target, s).unwrap();
                assert!((got - want).norm() < 1e-8 * (1.0 + want.norm()));
            }
        }
    }

    #[test]
    fn test_discrete_lowpass_closed_form() {
        let (client, device) = setup();

        let (tau, dt) = (0.01, 1e-3);
        let target =
            LtiSystem::<CpuRuntime>::from_slices(&[-5.0], &[5.0], &[1.0], 0.0, &device).unwrap();
        let syn = synapses::lowpass::<CpuRuntime>(tau, &device).unwrap();
        let map = client
            .embed_discrete(&target, &syn, dt, &identity_options())
            .unwrap();

        let a = (-dt / tau).exp();
        let ad = (-5.0 * dt).exp();
        let bd = 1.0 - ad;
        let w: Vec<f64> = map.recurrent.to_vec();
        let b: Vec<f64> = map.input.to_vec();
        assert!((w[0] - (ad - a) / (1.0 - a)).abs() < 1e-12);
        assert!((b[0] - bd / (1.0 - a)).abs() < 1e-12);
        assert_eq!(map.dt, Some(dt));
    }

    #[test]
    fn test_discrete_network_reproduces_discretized_target() {
        let (client, device) = setup();

        let dt = 1e-3;
        let delay = client.pade_delay(0.05, 4).unwrap();
        let syn = synapses::lowpass::<CpuRuntime>(0.02, &device).unwrap();
        let map = client
            .embed_discrete(&delay.system, &syn, dt, &EmbeddingOptions::default())
            .unwrap();

        let realized = StateSpaceData::from_system(&map.realization.system);
        let target_d = DiscreteData::zoh(&client, &realized, dt).unwrap();
        let syn_d = DiscreteData::zoh(&client, &StateSpaceData::from_system(&syn), dt).unwrap();
        let as_ss = |d: &DiscreteData| StateSpaceData {
            n: d.n,
            a: d.a.clone(),
            b: d.b.clone(),
            c: d.c.clone(),
            d: d.d,
        };
        for w in [0.0, 10.0, 100.0, 1000.0] {
            let z = Complex64::new(0.0, w * dt).exp();
            let got = network_response(&client, &map, &as_ss(&syn_d), z);
            let want = evaluate_at(&client, &as_ss(&target_d), z).unwrap();
            assert!((got - want).norm() < 1e-8 * (1.0 + want.norm()));
        }
    }

    #[test]
    fn test_incompatible_synapses() {
        let (client, device) = setup();

        let target =
            LtiSystem::<CpuRuntime>::from_slices(&[-1.0], &[1.0], &[1.0], 0.0, &device).unwrap();
        let opts = identity_options();

        // Order above the maximum.
        let third = client
            .series(
                &synapses::alpha::<CpuRuntime>(0.01, &device).unwrap(),
                &synapses::lowpass::<CpuRuntime>(0.01, &device).unwrap(),
            )
            .unwrap();
        assert!(matches!(
            client.embed(&target, &third, &opts),
            Err(LtiError::IncompatibleSynapse { .. })
        ));

        // Unstable.
        let unstable =
            LtiSystem::<CpuRuntime>::from_slices(&[1.0], &[1.0], &[1.0], 0.0, &device).unwrap();
        assert!(matches!(
            client.embed(&target, &unstable, &opts),
            Err(LtiError::IncompatibleSynapse { .. })
        ));

        // (s + 1) / (s + 2)²: has a zero.
        let with_zero = LtiSystem::<CpuRuntime>::from_slices(
            &[0.0, 1.0, -4.0, -4.0],
            &[0.0, 1.0],
            &[1.0, 1.0],
            0.0,
            &device,
        )
        .unwrap();
        assert!(matches!(
            client.embed(&target, &with_zero, &opts),
            Err(LtiError::IncompatibleSynapse { .. })
        ));

        // Zero-order hold gives the alpha synapse a zero.
        let alpha = synapses::alpha::<CpuRuntime>(0.01, &device).unwrap();
        assert!(client.embed(&target, &alpha, &opts).is_ok());
        assert!(matches!(
            client.embed_discrete(&target, &alpha, 1e-3, &opts),
            Err(LtiError::IncompatibleSynapse { .. })
        ));
    }

    #[test]
    fn test_target_too_fast_for_alpha_synapse() {
        let (client, device) = setup();

        // Alpha: c(s) = (τs + 1)², extra loop mode at −λ − 2/τ.
        let tau = 0.1;
        let alpha = synapses::alpha::<CpuRuntime>(tau, &device).unwrap();
        let opts = identity_options();

        let slow =
            LtiSystem::<CpuRuntime>::from_slices(&[-1.0 / tau], &[1.0], &[1.0], 0.0, &device)
                .unwrap();
        assert!(client.embed(&slow, &alpha, &opts).is_ok());

        let fast =
            LtiSystem::<CpuRuntime>::from_slices(&[-3.0 / tau], &[1.0], &[1.0], 0.0, &device)
                .unwrap();
        assert!(client.is_stable(&fast).unwrap());
        assert!(matches!(
            client.embed(&fast, &alpha, &opts),
            Err(LtiError::IncompatibleSynapse { .. })
        ));
    }

    #[test]
    fn test_integrator_target() {
        let (client, device) = setup();

        // Marginally stable targets are fine; the loop adds no modes for a
        // first-order synapse.
        let integrator =
            LtiSystem::<CpuRuntime>::from_slices(&[0.0], &[1.0], &[1.0], 0.0, &device).unwrap();
        let syn = synapses::lowpass::<CpuRuntime>(0.1, &device).unwrap();
        let map = client.embed(&integrator, &syn, &identity_options()).unwrap();
        let w: Vec<f64> = map.recurrent.to_vec();
        let b: Vec<f64> = map.input.to_vec();
        assert!((w[0] - 1.0).abs() < 1e-15);
        assert!((b[0] - 0.1).abs() < 1e-15);
    }
}
