//! Key performance indicators of one simulation.
//!
//! All KPIs are computed on the full-resolution trajectories. Percentages that
//! would divide by a (near) zero control value are `None` and serialize as
//! `null`; no KPI is ever NaN or infinite.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{KineticParameters, ModelParameters};
use crate::solver::Trajectory;
use crate::model::StateVariable;

/// Control values at or below this magnitude make relative changes undefined
const PERCENT_EPSILON: f64 = 1e-15;

/// Model extension that is switched on in a parameter set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mechanism {
    /// `k_exp` above its default
    HighExport,
    /// Non-zero endophytic fraction
    Endophytic,
    /// Ethylene feedback on ACS
    AcsFeedback,
    /// Ethylene feedback on ACO
    AcoFeedback,
}

impl Mechanism {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mechanism::HighExport => "high_export",
            Mechanism::Endophytic => "endophytic",
            Mechanism::AcsFeedback => "acs_feedback",
            Mechanism::AcoFeedback => "aco_feedback",
        }
    }
}

impl fmt::Display for Mechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary metrics comparing treatment against control
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiRecord {
    /// Peak ethylene, control (µM)
    #[serde(rename = "peakCtrl")]
    pub peak_ctrl_uM: f64,
    /// Time of the first control peak (h)
    #[serde(rename = "tPeakCtrl")]
    pub t_peak_ctrl_h: f64,
    /// Peak ethylene, treatment (µM)
    #[serde(rename = "peakACCD")]
    pub peak_accd_uM: f64,
    #[serde(rename = "tPeakACCD")]
    pub t_peak_accd_h: f64,
    #[serde(rename = "reductionPeakPct")]
    pub reduction_peak_pct: Option<f64>,
    /// Ethylene at the final sample, control (µM)
    #[serde(rename = "ssCtrl")]
    pub ss_ctrl_uM: f64,
    #[serde(rename = "ssACCD")]
    pub ss_accd_uM: f64,
    #[serde(rename = "reductionSSPct")]
    pub reduction_ss_pct: Option<f64>,
    /// Final growth index, control
    #[serde(rename = "growthCtrl")]
    pub growth_ctrl: f64,
    #[serde(rename = "growthACCD")]
    pub growth_accd: f64,
    #[serde(rename = "growthImprovePct")]
    pub growth_improve_pct: Option<f64>,
    /// Share of plant ACC efflux that goes to export rather than ACO
    #[serde(rename = "exportFractionPct")]
    pub export_fraction_pct: Option<f64>,
    #[serde(rename = "activeMechanisms")]
    pub active_mechanisms: Vec<Mechanism>,
}

impl KpiRecord {
    /// Compute every KPI from the two scenario trajectories
    pub fn compute(params: &ModelParameters, control: &Trajectory, treatment: &Trajectory) -> Self {
        let (t_peak_ctrl_h, peak_ctrl_uM) = control.peak(StateVariable::Ethylene).unwrap_or_default();
        let (t_peak_accd_h, peak_accd_uM) =
            treatment.peak(StateVariable::Ethylene).unwrap_or_default();
        let ss_ctrl_uM = control.final_value(StateVariable::Ethylene).unwrap_or_default();
        let ss_accd_uM = treatment.final_value(StateVariable::Ethylene).unwrap_or_default();
        let growth_ctrl = control.final_value(StateVariable::Growth).unwrap_or_default();
        let growth_accd = treatment.final_value(StateVariable::Growth).unwrap_or_default();

        let k_exp = params.kinetics.k_export_per_h;
        let k_aco = params.kinetics.k_aco_per_h;
        let export_fraction_pct = if k_exp + k_aco > 0.0 {
            Some(k_exp / (k_exp + k_aco) * 100.0)
        } else {
            None
        };

        Self {
            peak_ctrl_uM,
            t_peak_ctrl_h,
            peak_accd_uM,
            t_peak_accd_h,
            reduction_peak_pct: percent_reduction(peak_ctrl_uM, peak_accd_uM),
            ss_ctrl_uM,
            ss_accd_uM,
            reduction_ss_pct: percent_reduction(ss_ctrl_uM, ss_accd_uM),
            growth_ctrl,
            growth_accd,
            growth_improve_pct: percent_change(growth_ctrl, growth_accd),
            export_fraction_pct,
            active_mechanisms: active_mechanisms(params),
        }
    }
}

/// `(control − treatment) / control · 100`, `None` when control is ~0
pub fn percent_reduction(control: f64, treatment: f64) -> Option<f64> {
    percent_change(control, treatment).map(|change| -change)
}

/// `(treatment − control) / control · 100`, `None` when control is ~0
pub fn percent_change(control: f64, treatment: f64) -> Option<f64> {
    if !control.is_finite() || !treatment.is_finite() || control.abs() <= PERCENT_EPSILON {
        return None;
    }
    let pct = (treatment - control) / control * 100.0;
    pct.is_finite().then_some(pct)
}

/// Mechanisms switched on in `params`, in fixed order
pub fn active_mechanisms(params: &ModelParameters) -> Vec<Mechanism> {
    let mut active = Vec::new();
    if params.kinetics.k_export_per_h > KineticParameters::default().k_export_per_h {
        active.push(Mechanism::HighExport);
    }
    if params.mechanisms.direct_fraction > 0.0 {
        active.push(Mechanism::Endophytic);
    }
    if params.mechanisms.acs_feedback_enabled {
        active.push(Mechanism::AcsFeedback);
    }
    if params.mechanisms.aco_feedback_enabled {
        active.push(Mechanism::AcoFeedback);
    }
    active
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Scenario;
    use crate::solver::{output_times, SolverStats};

    fn trajectory(scenario: Scenario, ethylene: &[f64], growth_end: f64) -> Trajectory {
        let times = output_times((ethylene.len() - 1) as f64, ethylene.len());
        let n = ethylene.len();
        let rows: Vec<Vec<f64>> = ethylene
            .iter()
            .enumerate()
            .map(|(i, &e)| {
                let g = if i == n - 1 { growth_end } else { 1.0 };
                vec![0.0, 0.0, e, 0.0, g]
            })
            .collect();
        Trajectory::from_rows(scenario, times, &rows, SolverStats::default())
    }

    #[test]
    fn test_percent_guards() {
        assert_eq!(percent_reduction(2.0, 1.5), Some(25.0));
        assert_eq!(percent_change(2.0, 3.0), Some(50.0));
        assert_eq!(percent_reduction(0.0, 1.0), None);
        assert_eq!(percent_reduction(1e-20, 0.0), None);
        assert_eq!(percent_change(f64::NAN, 1.0), None);
    }

    #[test]
    fn test_kpis_from_trajectories() {
        let params = ModelParameters::default();
        let control = trajectory(Scenario::Control, &[0.0, 4.0, 4.0, 2.0], 2.0);
        let treatment = trajectory(Scenario::Treatment, &[0.0, 1.0, 3.0, 1.0], 2.5);
        let kpis = KpiRecord::compute(&params, &control, &treatment);

        assert_eq!(kpis.peak_ctrl_uM, 4.0);
        assert_eq!(kpis.t_peak_ctrl_h, 1.0);
        assert_eq!(kpis.t_peak_accd_h, 2.0);
        assert_eq!(kpis.reduction_peak_pct, Some(25.0));
        assert_eq!(kpis.reduction_ss_pct, Some(50.0));
        assert_eq!(kpis.growth_improve_pct, Some(25.0));
        assert!((kpis.export_fraction_pct.unwrap() - 25.0).abs() < 1e-12);
        assert!(kpis.active_mechanisms.is_empty());
    }

    #[test]
    fn test_degenerate_kpis_are_null() {
        let mut params = ModelParameters::default();
        params.kinetics.k_export_per_h = 0.0;
        params.kinetics.k_aco_per_h = 0.0;
        let flat = trajectory(Scenario::Control, &[0.0, 0.0, 0.0], 0.0);
        let kpis = KpiRecord::compute(&params, &flat, &flat);

        assert_eq!(kpis.reduction_peak_pct, None);
        assert_eq!(kpis.growth_improve_pct, None);
        assert_eq!(kpis.export_fraction_pct, None);
        let json = serde_json::to_value(&kpis).unwrap();
        assert!(json["reductionPeakPct"].is_null());
        assert!(json["exportFractionPct"].is_null());
    }

    #[test]
    fn test_active_mechanism_order() {
        let mut params = ModelParameters::default();
        params.mechanisms.aco_feedback_enabled = true;
        params.mechanisms.direct_fraction = 0.2;
        params.kinetics.k_export_per_h = 0.3;
        params.mechanisms.acs_feedback_enabled = true;

        assert_eq!(
            active_mechanisms(&params),
            vec![
                Mechanism::HighExport,
                Mechanism::Endophytic,
                Mechanism::AcsFeedback,
                Mechanism::AcoFeedback,
            ]
        );
        let json = serde_json::to_string(&active_mechanisms(&params)).unwrap();
        assert_eq!(json, r#"["high_export","endophytic","acs_feedback","aco_feedback"]"#);
    }
}
