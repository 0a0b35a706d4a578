//! System-level properties of the LTI algebra and realizations.

use lindyn::lti::{synapses, LtiAlgebra, LtiSimulation, LtiSystem, StateSpaceConversions, TransferFunction};
use lindyn::realize::{RealizationAlgorithms, Realizer};
use numr::runtime::cpu::{CpuClient, CpuDevice, CpuRuntime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn setup() -> (CpuClient, CpuDevice) {
    let device = CpuDevice::new();
    let client = CpuClient::new(device.clone());
    (client, device)
}

/// Stable system with `order` distinct real poles and a random numerator
/// of lower degree.
fn random_system(rng: &mut StdRng, order: usize, device: &CpuDevice) -> LtiSystem<CpuRuntime> {
    let client = CpuClient::new(device.clone());
    let mut den = vec![1.0];
    for k in 0..order {
        // Spread the poles so none of them coincide.
        let pole = -(1.0 + 4.0 * k as f64 + rng.gen_range(0.0..2.0));
        let mut next = vec![0.0; den.len() + 1];
        for (i, c) in den.iter().enumerate() {
            next[i] += c;
            next[i + 1] -= c * pole;
        }
        den = next;
    }
    let num: Vec<f64> = (0..order).map(|_| rng.gen_range(0.5..2.0)).collect();
    let tf = TransferFunction::<CpuRuntime>::from_slices(&num, &den, device).unwrap();
    client.tf2ss(&tf).unwrap()
}

fn convolution_error(client: &CpuClient, device: &CpuDevice, dt: f64, n: usize) -> f64 {
    let first = synapses::lowpass::<CpuRuntime>(0.01, device).unwrap();
    let second = synapses::lowpass::<CpuRuntime>(0.03, device).unwrap();
    let cascade = client.series(&first, &second).unwrap();

    let ha: Vec<f64> = client.impulse_response(&first, n, dt).unwrap().to_vec();
    let hb: Vec<f64> = client.impulse_response(&second, n, dt).unwrap().to_vec();
    let hab: Vec<f64> = client.impulse_response(&cascade, n, dt).unwrap().to_vec();

    let peak = hab.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
    (0..n)
        .map(|k| {
            let conv: f64 = (0..=k).map(|j| ha[j] * hb[k - j]).sum::<f64>() * dt;
            (conv - hab[k]).abs()
        })
        .fold(0.0, f64::max)
        / peak
}

#[test]
fn test_series_impulse_response_is_convolution() {
    let (client, device) = setup();

    // Zero-order hold makes the law hold up to O(dt / τ).
    let coarse = convolution_error(&client, &device, 2e-4, 1000);
    let fine = convolution_error(&client, &device, 1e-4, 2000);
    assert!(fine < 2e-2, "relative error {}", fine);
    assert!(fine < 0.6 * coarse);
}

#[test]
fn test_every_realizer_preserves_transfer_function() {
    let (client, device) = setup();
    let mut rng = StdRng::seed_from_u64(7);

    let omegas = [0.0, 0.3, 2.0, 11.0, 60.0];
    for order in [2, 3, 4] {
        let sys = random_system(&mut rng, order, &device);
        let reference = client.freqresp(&sys, &omegas).unwrap();

        for realizer in [
            Realizer::Identity,
            Realizer::Balanced,
            Realizer::H2Norm,
            Realizer::L1Norm,
            Realizer::ControllableCanonical,
        ] {
            let real = client.realize(&sys, realizer).unwrap();
            assert_eq!(real.realizer, realizer);
            let h = client.freqresp(&real.system, &omegas).unwrap();
            for (a, b) in h.iter().zip(&reference) {
                assert!(
                    (a - b).norm() <= 1e-8 * b.norm().max(1e-12),
                    "{:?} at order {}: {} vs {}",
                    realizer,
                    order,
                    a,
                    b
                );
            }
        }
    }
}

#[test]
fn test_parallel_adds_frequency_responses() {
    let (client, device) = setup();
    let mut rng = StdRng::seed_from_u64(11);

    let a = random_system(&mut rng, 2, &device);
    let b = random_system(&mut rng, 3, &device);
    let sum = client.parallel(&a, &b).unwrap();
    assert_eq!(sum.order(), 5);

    let omegas = [0.0, 1.0, 25.0];
    let ha = client.freqresp(&a, &omegas).unwrap();
    let hb = client.freqresp(&b, &omegas).unwrap();
    let hs = client.freqresp(&sum, &omegas).unwrap();
    for ((x, y), s) in ha.iter().zip(&hb).zip(&hs) {
        assert!((x + y - s).norm() < 1e-10 * s.norm().max(1.0));
    }
}

#[test]
fn test_balanced_states_have_matching_energies() {
    let (client, device) = setup();
    let mut rng = StdRng::seed_from_u64(3);

    let sys = random_system(&mut rng, 4, &device);
    let real = client.realize(&sys, Realizer::Balanced).unwrap();
    let p: Vec<f64> = client.control_gram(&real.system).unwrap().to_vec();
    let q: Vec<f64> = client.observe_gram(&real.system).unwrap().to_vec();
    let hsv: Vec<f64> = client.hankel_singular_values(&sys).unwrap().to_vec();

    for i in 0..4 {
        assert!((p[i * 4 + i] - hsv[i]).abs() < 1e-8 * hsv[0]);
        assert!((q[i * 4 + i] - hsv[i]).abs() < 1e-8 * hsv[0]);
    }
    assert!(hsv.windows(2).all(|w| w[0] >= w[1]));
}
