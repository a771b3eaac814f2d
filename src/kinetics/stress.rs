//! Time profile of the ACS stress multiplier.
//!
//! The multiplier is 1 when the plant is unstressed and `f_stress` under full
//! stress. The default profile applies full stress for the whole horizon.

use serde::{Deserialize, Serialize};

use crate::error::{SimResult, SimulationError};

/// Shape of f_stress(t)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StressProfile {
    /// f_stress for all t
    #[default]
    Constant,
    /// 1 before `onset_h`, f_stress from then on
    Step { onset_h: f64 },
    /// f_stress inside [onset_h, onset_h + duration_h), 1 outside
    Pulse { onset_h: f64, duration_h: f64 },
    /// Linear rise from 1 at `onset_h` to f_stress at `onset_h + ramp_h`
    Ramp { onset_h: f64, ramp_h: f64 },
}

impl StressProfile {
    /// Multiplier at time `t_h` for a peak stress factor `f_stress`
    #[inline]
    pub fn multiplier(&self, f_stress: f64, t_h: f64) -> f64 {
        match *self {
            StressProfile::Constant => f_stress,
            StressProfile::Step { onset_h } => {
                if t_h >= onset_h {
                    f_stress
                } else {
                    1.0
                }
            }
            StressProfile::Pulse {
                onset_h,
                duration_h,
            } => {
                if t_h >= onset_h && t_h < onset_h + duration_h {
                    f_stress
                } else {
                    1.0
                }
            }
            StressProfile::Ramp { onset_h, ramp_h } => {
                if t_h <= onset_h {
                    1.0
                } else if ramp_h <= 0.0 || t_h >= onset_h + ramp_h {
                    f_stress
                } else {
                    1.0 + (f_stress - 1.0) * (t_h - onset_h) / ramp_h
                }
            }
        }
    }

    /// Wire name of the variant
    pub fn kind(&self) -> &'static str {
        match self {
            StressProfile::Constant => "constant",
            StressProfile::Step { .. } => "step",
            StressProfile::Pulse { .. } => "pulse",
            StressProfile::Ramp { .. } => "ramp",
        }
    }

    pub fn validate(&self) -> SimResult<()> {
        let check = |field: &str, value: f64, allow_zero: bool| -> SimResult<()> {
            let ok = value.is_finite() && if allow_zero { value >= 0.0 } else { value > 0.0 };
            if ok {
                Ok(())
            } else {
                let bound = if allow_zero { ">= 0" } else { "> 0" };
                Err(SimulationError::invalid(
                    format!("stressProfile.{field}"),
                    format!("must be finite and {bound}, got {value}"),
                ))
            }
        };

        match *self {
            StressProfile::Constant => Ok(()),
            StressProfile::Step { onset_h } => check("onset_h", onset_h, true),
            StressProfile::Pulse {
                onset_h,
                duration_h,
            } => {
                check("onset_h", onset_h, true)?;
                check("duration_h", duration_h, false)
            }
            StressProfile::Ramp { onset_h, ramp_h } => {
                check("onset_h", onset_h, true)?;
                check("ramp_h", ramp_h, false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_profile() {
        let p = StressProfile::Constant;
        assert_eq!(p.multiplier(3.0, 0.0), 3.0);
        assert_eq!(p.multiplier(3.0, 100.0), 3.0);
    }

    #[test]
    fn test_step_and_pulse() {
        let step = StressProfile::Step { onset_h: 10.0 };
        assert_eq!(step.multiplier(4.0, 9.99), 1.0);
        assert_eq!(step.multiplier(4.0, 10.0), 4.0);

        let pulse = StressProfile::Pulse {
            onset_h: 5.0,
            duration_h: 2.0,
        };
        assert_eq!(pulse.multiplier(4.0, 4.0), 1.0);
        assert_eq!(pulse.multiplier(4.0, 6.0), 4.0);
        assert_eq!(pulse.multiplier(4.0, 7.0), 1.0);
    }

    #[test]
    fn test_ramp_is_linear() {
        let ramp = StressProfile::Ramp {
            onset_h: 0.0,
            ramp_h: 10.0,
        };
        assert!((ramp.multiplier(3.0, 5.0) - 2.0).abs() < 1e-12);
        assert_eq!(ramp.multiplier(3.0, 20.0), 3.0);
    }

    #[test]
    fn test_profile_json_shape() {
        let p: StressProfile =
            serde_json::from_str(r#"{"kind": "pulse", "onset_h": 12, "duration_h": 24}"#).unwrap();
        assert_eq!(
            p,
            StressProfile::Pulse {
                onset_h: 12.0,
                duration_h: 24.0
            }
        );
        let default: StressProfile = serde_json::from_str(r#"{"kind": "constant"}"#).unwrap();
        assert_eq!(default, StressProfile::Constant);
    }

    #[test]
    fn test_validation() {
        assert!(StressProfile::Pulse {
            onset_h: 1.0,
            duration_h: 0.0
        }
        .validate()
        .is_err());
        let err = StressProfile::Step { onset_h: -1.0 }.validate().unwrap_err();
        assert_eq!(err.field(), Some("stressProfile.onset_h"));
    }
}
