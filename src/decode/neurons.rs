//! Rate-based neuron response families.
//!
//! Each family maps a scalar drive j to a firing rate G(j) and exposes the
//! first two derivatives in closed form, which is all the geometric solver
//! needs to build its local quadratic approximations.

use crate::decode::error::{DecodeError, DecodeResult};

/// A closed set of neuron response families.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NeuronType {
    /// G(j) = amplitude · max(j, 0).
    RectifiedLinear { amplitude: f64 },
    /// G(j) = σ(j) / τ_ref with the logistic σ; saturates at 1/τ_ref.
    Sigmoid { tau_ref: f64 },
    /// Steady-state rate of a leaky integrate-and-fire neuron:
    /// G(j) = 1 / (τ_ref + τ_rc · ln(1 + 1/(j − 1))) for j > 1, else 0.
    LifRate { tau_rc: f64, tau_ref: f64 },
}

impl Default for NeuronType {
    fn default() -> Self {
        Self::LifRate {
            tau_rc: 0.02,
            tau_ref: 0.002,
        }
    }
}

impl NeuronType {
    /// Check the family's own parameters.
    pub fn validate(&self) -> DecodeResult<()> {
        let positive = |name: &str, v: f64| {
            if v > 0.0 && v.is_finite() {
                Ok(())
            } else {
                Err(DecodeError::InvalidParameter {
                    parameter: name.to_string(),
                    message: format!("must be positive and finite, got {}", v),
                })
            }
        };
        match *self {
            Self::RectifiedLinear { amplitude } => positive("amplitude", amplitude),
            Self::Sigmoid { tau_ref } => positive("tau_ref", tau_ref),
            Self::LifRate { tau_rc, tau_ref } => {
                positive("tau_rc", tau_rc)?;
                if tau_ref >= 0.0 && tau_ref.is_finite() {
                    Ok(())
                } else {
                    Err(DecodeError::InvalidParameter {
                        parameter: "tau_ref".to_string(),
                        message: format!("must be non-negative and finite, got {}", tau_ref),
                    })
                }
            }
        }
    }

    /// Drive at which the neuron starts firing; `None` when it fires for
    /// every drive.
    pub fn threshold(&self) -> Option<f64> {
        match self {
            Self::RectifiedLinear { .. } => Some(0.0),
            Self::Sigmoid { .. } => None,
            Self::LifRate { .. } => Some(1.0),
        }
    }

    /// Firing rate G(j).
    pub fn rate(&self, j: f64) -> f64 {
        self.rate_derivatives(j).0
    }

    /// (G(j), G'(j), G''(j)).
    pub fn rate_derivatives(&self, j: f64) -> (f64, f64, f64) {
        match *self {
            Self::RectifiedLinear { amplitude } => {
                if j > 0.0 {
                    (amplitude * j, amplitude, 0.0)
                } else {
                    (0.0, 0.0, 0.0)
                }
            }
            Self::Sigmoid { tau_ref } => {
                let s = 1.0 / (1.0 + (-j).exp());
                let ds = s * (1.0 - s);
                (s / tau_ref, ds / tau_ref, ds * (1.0 - 2.0 * s) / tau_ref)
            }
            Self::LifRate { tau_rc, tau_ref } => {
                if j <= 1.0 {
                    return (0.0, 0.0, 0.0);
                }
                let l = (1.0 / (j - 1.0)).ln_1p();
                let dl = -1.0 / (j * (j - 1.0));
                let d2l = -1.0 / (j * j) + 1.0 / ((j - 1.0) * (j - 1.0));
                let q = tau_ref + tau_rc * l;
                let g = 1.0 / q;
                let dg = -tau_rc * dl * g * g;
                let d2g = -tau_rc * d2l * g * g + 2.0 * tau_rc * tau_rc * dl * dl * g * g * g;
                (g, dg, d2g)
            }
        }
    }

    /// Gain and bias giving rate `max_rate` at x = 1 and placing the firing
    /// threshold (or, for the sigmoid, the half-maximum point) at
    /// x = `intercept`, for a neuron with encoder +1.
    pub fn gain_bias(&self, max_rate: f64, intercept: f64) -> DecodeResult<(f64, f64)> {
        self.validate()?;
        if !(max_rate > 0.0) || !max_rate.is_finite() {
            return Err(DecodeError::InvalidParameter {
                parameter: "max_rate".to_string(),
                message: format!("must be positive and finite, got {}", max_rate),
            });
        }
        if !(intercept < 1.0) || !intercept.is_finite() {
            return Err(DecodeError::InvalidParameter {
                parameter: "intercept".to_string(),
                message: format!("must be finite and below 1, got {}", intercept),
            });
        }
        match *self {
            Self::RectifiedLinear { amplitude } => {
                let gain = max_rate / amplitude / (1.0 - intercept);
                Ok((gain, -intercept * gain))
            }
            Self::Sigmoid { tau_ref } => {
                let lim = 1.0 / tau_ref;
                if !(max_rate > 0.5 * lim && max_rate < lim) {
                    return Err(DecodeError::InvalidParameter {
                        parameter: "max_rate".to_string(),
                        message: format!(
                            "sigmoid max rate must lie in ({}, {}), got {}",
                            0.5 * lim,
                            lim,
                            max_rate
                        ),
                    });
                }
                let inverse = -(lim / max_rate - 1.0).ln();
                let gain = inverse / (1.0 - intercept);
                Ok((gain, inverse - gain))
            }
            Self::LifRate { tau_rc, tau_ref } => {
                if !(max_rate * tau_ref < 1.0) {
                    return Err(DecodeError::InvalidParameter {
                        parameter: "max_rate".to_string(),
                        message: format!(
                            "LIF max rate must be below 1/tau_ref = {}, got {}",
                            1.0 / tau_ref,
                            max_rate
                        ),
                    });
                }
                let x = 1.0 / (1.0 - ((tau_ref - 1.0 / max_rate) / tau_rc).exp());
                let gain = (1.0 - x) / (intercept - 1.0);
                Ok((gain, 1.0 - gain * intercept))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIF: NeuronType = NeuronType::LifRate {
        tau_rc: 0.02,
        tau_ref: 0.002,
    };

    fn families() -> [NeuronType; 3] {
        [
            NeuronType::RectifiedLinear { amplitude: 1.0 },
            NeuronType::Sigmoid { tau_ref: 0.0025 },
            LIF,
        ]
    }

    #[test]
    fn test_gain_bias_hits_max_rate_and_intercept() {
        for neuron in families() {
            let (gain, bias) = neuron.gain_bias(300.0, -0.3).unwrap();
            assert!((neuron.rate(gain + bias) - 300.0).abs() < 1e-8);

            let j_int = gain * -0.3 + bias;
            match neuron.threshold() {
                Some(th) => assert!((j_int - th).abs() < 1e-12),
                None => assert!(j_int.abs() < 1e-12),
            }
        }
    }

    #[test]
    fn test_derivatives_match_finite_differences() {
        let (h1, h2) = (1e-6, 1e-4);
        for neuron in families() {
            for j in [1.2, 1.7, 3.0, 8.0] {
                let (_, d1, d2) = neuron.rate_derivatives(j);
                let fd1 = (neuron.rate(j + h1) - neuron.rate(j - h1)) / (2.0 * h1);
                let fd2 = (neuron.rate(j + h2) - 2.0 * neuron.rate(j) + neuron.rate(j - h2))
                    / (h2 * h2);
                assert!((d1 - fd1).abs() < 1e-5 * (1.0 + d1.abs()));
                assert!((d2 - fd2).abs() < 1e-3 * (1.0 + d2.abs()));
            }
        }
    }

    #[test]
    fn test_silent_below_threshold() {
        assert_eq!(LIF.rate(1.0), 0.0);
        assert_eq!(LIF.rate(0.3), 0.0);
        assert_eq!(NeuronType::RectifiedLinear { amplitude: 2.0 }.rate(-1.0), 0.0);
        assert!(NeuronType::Sigmoid { tau_ref: 0.002 }.rate(-5.0) > 0.0);
    }

    #[test]
    fn test_invalid_tuning() {
        assert!(LIF.gain_bias(600.0, 0.0).is_err());
        assert!(LIF.gain_bias(100.0, 1.0).is_err());
        assert!(NeuronType::Sigmoid { tau_ref: 0.0025 }
            .gain_bias(100.0, 0.0)
            .is_err());
        assert!(NeuronType::RectifiedLinear { amplitude: -1.0 }
            .gain_bias(100.0, 0.0)
            .is_err());
    }
}
