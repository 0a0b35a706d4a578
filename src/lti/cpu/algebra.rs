//! CPU implementation of LTI algebra and analysis.

use crate::common::{dense, linalg, polynomial};
use crate::lti::cpu::helpers::{krylov_rank, transfer_coefficients, StateSpaceData};
use crate::lti::error::{LtiError, LtiResult};
use crate::lti::traits::algebra::LtiAlgebra;
use crate::lti::types::{LtiSystem, COEFF_EPS};
use num_complex::Complex64;
use numr::algorithm::polynomial::types::PolynomialRoots;
use numr::algorithm::polynomial::PolynomialAlgorithms;
use numr::dtype::DType;
use numr::runtime::cpu::{CpuClient, CpuDevice, CpuRuntime};
use numr::tensor::Tensor;

/// Relative residual below which a Krylov direction is considered dependent.
const MINIMALITY_RTOL: f64 = 1e-10;

impl LtiAlgebra<CpuRuntime> for CpuClient {
    fn series(
        &self,
        first: &LtiSystem<CpuRuntime>,
        second: &LtiSystem<CpuRuntime>,
    ) -> LtiResult<LtiSystem<CpuRuntime>> {
        let composed = series_impl(first, second)?;
        warn_if_not_minimal(self, &composed, "series")?;
        Ok(composed)
    }

    fn parallel(
        &self,
        lhs: &LtiSystem<CpuRuntime>,
        rhs: &LtiSystem<CpuRuntime>,
    ) -> LtiResult<LtiSystem<CpuRuntime>> {
        let composed = parallel_impl(lhs, rhs)?;
        warn_if_not_minimal(self, &composed, "parallel")?;
        Ok(composed)
    }

    fn poles(&self, sys: &LtiSystem<CpuRuntime>) -> LtiResult<PolynomialRoots<CpuRuntime>> {
        let ss = StateSpaceData::from_system(sys);
        let (_, den) = transfer_coefficients(&ss);
        roots_of(self, &polynomial::to_ascending(&den), sys.a.device())
    }

    fn zeros(&self, sys: &LtiSystem<CpuRuntime>) -> LtiResult<PolynomialRoots<CpuRuntime>> {
        let ss = StateSpaceData::from_system(sys);
        let (num, _) = transfer_coefficients(&ss);
        let scale = num.iter().fold(0.0_f64, |m, v| m.max(v.abs())).max(1.0);
        let num_asc = polynomial::trim(&polynomial::to_ascending(&num), COEFF_EPS * scale);
        roots_of(self, &num_asc, sys.a.device())
    }

    fn is_stable(&self, sys: &LtiSystem<CpuRuntime>) -> LtiResult<bool> {
        let a: Vec<f64> = sys.a.to_vec();
        Ok(linalg::is_hurwitz(self, &a, sys.order()))
    }

    fn is_minimal(&self, sys: &LtiSystem<CpuRuntime>) -> LtiResult<bool> {
        Ok(is_minimal_data(&StateSpaceData::from_system(sys)))
    }

    fn freqresp(&self, sys: &LtiSystem<CpuRuntime>, omegas: &[f64]) -> LtiResult<Vec<Complex64>> {
        let ss = StateSpaceData::from_system(sys);
        omegas
            .iter()
            .map(|&w| evaluate_at(self, &ss, Complex64::new(0.0, w)))
            .collect()
    }

    fn dc_gain(&self, sys: &LtiSystem<CpuRuntime>) -> LtiResult<f64> {
        let ss = StateSpaceData::from_system(sys);
        if ss.n == 0 {
            return Ok(ss.d);
        }
        let x = linalg::solve(self, &ss.a, &ss.b, ss.n, 1).map_err(|_| LtiError::UnstableSystem {
            context: "dc_gain: A is singular (pole at the origin)".to_string(),
        })?;
        Ok(ss.d - dense::dot(&ss.c, &x))
    }
}

// ============================================================================
// Implementation Functions (CPU-only, not generic)
// ============================================================================

fn series_impl(
    first: &LtiSystem<CpuRuntime>,
    second: &LtiSystem<CpuRuntime>,
) -> LtiResult<LtiSystem<CpuRuntime>> {
    let s1 = StateSpaceData::from_system(first);
    let s2 = StateSpaceData::from_system(second);
    let (n1, n2) = (s1.n, s2.n);
    let n = n1 + n2;

    let mut a = vec![0.0; n * n];
    for i in 0..n1 {
        a[i * n..i * n + n1].copy_from_slice(&s1.a[i * n1..(i + 1) * n1]);
    }
    for i in 0..n2 {
        let row = (n1 + i) * n;
        for j in 0..n1 {
            a[row + j] = s2.b[i] * s1.c[j];
        }
        a[row + n1..row + n].copy_from_slice(&s2.a[i * n2..(i + 1) * n2]);
    }

    let mut b = s1.b.clone();
    b.extend(s2.b.iter().map(|v| v * s1.d));

    let mut c: Vec<f64> = s1.c.iter().map(|v| v * s2.d).collect();
    c.extend_from_slice(&s2.c);

    LtiSystem::from_slices(&a, &b, &c, s1.d * s2.d, first.a.device())
}

fn parallel_impl(
    lhs: &LtiSystem<CpuRuntime>,
    rhs: &LtiSystem<CpuRuntime>,
) -> LtiResult<LtiSystem<CpuRuntime>> {
    let s1 = StateSpaceData::from_system(lhs);
    let s2 = StateSpaceData::from_system(rhs);
    let (n1, n2) = (s1.n, s2.n);
    let n = n1 + n2;

    let mut a = vec![0.0; n * n];
    for i in 0..n1 {
        a[i * n..i * n + n1].copy_from_slice(&s1.a[i * n1..(i + 1) * n1]);
    }
    for i in 0..n2 {
        let row = (n1 + i) * n;
        a[row + n1..row + n].copy_from_slice(&s2.a[i * n2..(i + 1) * n2]);
    }

    let mut b = s1.b.clone();
    b.extend_from_slice(&s2.b);
    let mut c = s1.c.clone();
    c.extend_from_slice(&s2.c);

    LtiSystem::from_slices(&a, &b, &c, s1.d + s2.d, lhs.a.device())
}

fn warn_if_not_minimal(
    client: &CpuClient,
    sys: &LtiSystem<CpuRuntime>,
    operation: &str,
) -> LtiResult<()> {
    if !client.is_minimal(sys)? {
        tracing::warn!(
            operation,
            order = sys.order(),
            "composition is not minimal; cancelling pole/zero pairs are kept"
        );
    }
    Ok(())
}

pub(crate) fn is_minimal_data(ss: &StateSpaceData) -> bool {
    let n = ss.n;
    if n == 0 {
        return true;
    }
    let a_t = dense::transpose(&ss.a, n, n);
    krylov_rank(&ss.a, &ss.b, n, MINIMALITY_RTOL) == n
        && krylov_rank(&a_t, &ss.c, n, MINIMALITY_RTOL) == n
}

/// H(s) = C (sI − A)⁻¹ B + D at a complex point.
///
/// With s = σ + jω the complex system (sI − A) x = B is solved as the real
/// block system [[σI − A, −ωI], [ωI, σI − A]] [Re x; Im x] = [B; 0].
pub(crate) fn evaluate_at(
    client: &CpuClient,
    ss: &StateSpaceData,
    s: Complex64,
) -> LtiResult<Complex64> {
    let n = ss.n;
    if n == 0 {
        return Ok(Complex64::new(ss.d, 0.0));
    }
    let m = 2 * n;
    let mut block = vec![0.0; m * m];
    for i in 0..n {
        for j in 0..n {
            let v = -ss.a[i * n + j];
            block[i * m + j] = v;
            block[(n + i) * m + n + j] = v;
        }
        block[i * m + i] += s.re;
        block[(n + i) * m + n + i] += s.re;
        block[i * m + n + i] = -s.im;
        block[(n + i) * m + i] = s.im;
    }
    let mut rhs = vec![0.0; m];
    rhs[..n].copy_from_slice(&ss.b);

    let x = linalg::solve(client, &block, &rhs, m, 1).map_err(|_| LtiError::InvalidInput {
        context: format!("frequency {} coincides with a pole", s),
    })?;
    let y = Complex64::new(dense::dot(&ss.c, &x[..n]), dense::dot(&ss.c, &x[n..]));
    Ok(y + ss.d)
}

fn roots_of(
    client: &CpuClient,
    ascending: &[f64],
    device: &CpuDevice,
) -> LtiResult<PolynomialRoots<CpuRuntime>> {
    if ascending.len() <= 1 {
        return Ok(PolynomialRoots {
            roots_real: Tensor::zeros(&[0], DType::F64, device),
            roots_imag: Tensor::zeros(&[0], DType::F64, device),
        });
    }
    let coeffs = Tensor::<CpuRuntime>::from_slice(ascending, &[ascending.len()], device);
    Ok(client.polyroots(&coeffs)?)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lti::traits::conversions::StateSpaceConversions;
    use crate::lti::types::TransferFunction;

    fn setup() -> (CpuClient, CpuDevice) {
        let device = CpuDevice::new();
        let client = CpuClient::new(device.clone());
        (client, device)
    }

    fn lowpass(tau: f64, device: &CpuDevice) -> LtiSystem<CpuRuntime> {
        LtiSystem::from_slices(&[-1.0 / tau], &[1.0 / tau], &[1.0], 0.0, device).unwrap()
    }

    #[test]
    fn test_series_transfer_function() {
        let (client, device) = setup();

        let sys = client.series(&lowpass(0.1, &device), &lowpass(0.5, &device)).unwrap();
        assert_eq!(sys.order(), 2);

        // 1/((0.1s+1)(0.5s+1)) = 20 / (s^2 + 12s + 20)
        let tf = client.ss2tf(&sys).unwrap();
        let num: Vec<f64> = tf.num.to_vec();
        let den: Vec<f64> = tf.den.to_vec();
        assert!((num[num.len() - 1] - 20.0).abs() < 1e-10);
        for (got, want) in den.iter().zip([1.0, 12.0, 20.0]) {
            assert!((got - want).abs() < 1e-10);
        }
    }

    #[test]
    fn test_series_with_feedthrough() {
        let (client, device) = setup();

        let gain = LtiSystem::<CpuRuntime>::gain(3.0, &device).unwrap();
        let lp = lowpass(0.2, &device);
        let a = client.series(&gain, &lp).unwrap();
        let b = client.series(&lp, &gain).unwrap();
        for w in [0.0, 1.0, 7.0] {
            let ha = client.freqresp(&a, &[w]).unwrap()[0];
            let hb = client.freqresp(&b, &[w]).unwrap()[0];
            let expected = Complex64::new(3.0, 0.0) / Complex64::new(1.0, 0.2 * w);
            assert!((ha - expected).norm() < 1e-12);
            assert!((hb - expected).norm() < 1e-12);
        }
    }

    #[test]
    fn test_parallel_sums_responses() {
        let (client, device) = setup();

        let lhs = lowpass(0.1, &device);
        let rhs = LtiSystem::<CpuRuntime>::from_slices(&[-2.0], &[1.0], &[4.0], 0.5, &device).unwrap();
        let sum = client.parallel(&lhs, &rhs).unwrap();
        assert_eq!(sum.order(), 2);

        let omegas = [0.0, 0.3, 5.0, 40.0];
        let h = client.freqresp(&sum, &omegas).unwrap();
        let h1 = client.freqresp(&lhs, &omegas).unwrap();
        let h2 = client.freqresp(&rhs, &omegas).unwrap();
        for k in 0..omegas.len() {
            assert!((h[k] - (h1[k] + h2[k])).norm() < 1e-12);
        }
    }

    #[test]
    fn test_poles_and_zeros() {
        let (client, device) = setup();

        // (s + 3) / ((s + 1)(s + 2))
        let tf = TransferFunction::<CpuRuntime>::from_slices(&[1.0, 3.0], &[1.0, 3.0, 2.0], &device)
            .unwrap();
        let sys = client.tf2ss(&tf).unwrap();

        let poles = client.poles(&sys).unwrap();
        let mut re: Vec<f64> = poles.roots_real.to_vec();
        re.sort_by(|a, b| a.total_cmp(b));
        assert!((re[0] + 2.0).abs() < 1e-8);
        assert!((re[1] + 1.0).abs() < 1e-8);

        let zeros = client.zeros(&sys).unwrap();
        let zr: Vec<f64> = zeros.roots_real.to_vec();
        assert_eq!(zr.len(), 1);
        assert!((zr[0] + 3.0).abs() < 1e-8);
    }

    #[test]
    fn test_stability_flag() {
        let (client, device) = setup();

        assert!(client.is_stable(&lowpass(0.05, &device)).unwrap());
        let unstable = LtiSystem::<CpuRuntime>::from_slices(&[0.5], &[1.0], &[1.0], 0.0, &device).unwrap();
        assert!(!client.is_stable(&unstable).unwrap());
        let integrator = LtiSystem::<CpuRuntime>::from_slices(&[0.0], &[1.0], &[1.0], 0.0, &device).unwrap();
        assert!(!client.is_stable(&integrator).unwrap());
    }

    #[test]
    fn test_pole_zero_cancellation_is_reported_not_removed() {
        let (client, device) = setup();

        // (s + 1) / (s + 2) in series with 1 / (s + 1): the s = -1 pole cancels.
        let lead = client
            .tf2ss(&TransferFunction::from_slices(&[1.0, 1.0], &[1.0, 2.0], &device).unwrap())
            .unwrap();
        let lag = LtiSystem::<CpuRuntime>::from_slices(&[-1.0], &[1.0], &[1.0], 0.0, &device).unwrap();

        let sys = client.series(&lag, &lead).unwrap();
        assert_eq!(sys.order(), 2);
        assert!(!client.is_minimal(&sys).unwrap());

        // Transfer function is still exact: 1 / (s + 2).
        let h = client.freqresp(&sys, &[0.0, 3.0]).unwrap();
        assert!((h[0] - Complex64::new(0.5, 0.0)).norm() < 1e-12);
        assert!((h[1] - Complex64::new(1.0, 0.0) / Complex64::new(2.0, 3.0)).norm() < 1e-12);
    }

    #[test]
    fn test_dc_gain() {
        let (client, device) = setup();

        let sys = LtiSystem::<CpuRuntime>::from_slices(&[-4.0], &[2.0], &[3.0], 0.25, &device).unwrap();
        assert!((client.dc_gain(&sys).unwrap() - 1.75).abs() < 1e-14);

        let integrator = LtiSystem::<CpuRuntime>::from_slices(&[0.0], &[1.0], &[1.0], 0.0, &device).unwrap();
        assert!(client.dc_gain(&integrator).is_err());
    }
}
