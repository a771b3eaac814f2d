//! Wire shapes of the simulation API: response, error body, defaults catalog.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::analysis::KpiRecord;
use crate::config::{Mode, ModelParameters, ParameterOverrides};
use crate::error::SimulationError;
use crate::kinetics::StressProfile;
use crate::model::StateVariable;
use crate::simulation::SimulationOutcome;
use crate::solver::Trajectory;

/// The five state series of one scenario, keyed by short wire names
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateSeries {
    #[serde(rename = "Ap")]
    pub plant_acc_mM: Vec<f64>,
    #[serde(rename = "Ar")]
    pub root_acc_mM: Vec<f64>,
    #[serde(rename = "E")]
    pub ethylene_uM: Vec<f64>,
    #[serde(rename = "Xb")]
    pub biomass_g_per_L: Vec<f64>,
    #[serde(rename = "G")]
    pub growth_index: Vec<f64>,
}

impl StateSeries {
    fn sampled(trajectory: &Trajectory, indices: &[usize]) -> Self {
        let pick = |var: StateVariable| -> Vec<f64> {
            let series = trajectory.series(var);
            indices.iter().map(|&i| series[i]).collect()
        };
        Self {
            plant_acc_mM: pick(StateVariable::PlantAcc),
            root_acc_mM: pick(StateVariable::RootAcc),
            ethylene_uM: pick(StateVariable::Ethylene),
            biomass_g_per_L: pick(StateVariable::Biomass),
            growth_index: pick(StateVariable::Growth),
        }
    }
}

/// Shared time axis plus both scenarios
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub time: Vec<f64>,
    pub ctrl: StateSeries,
    pub accd: StateSeries,
}

impl TimeSeries {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }
}

/// Successful simulation response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResponse {
    #[serde(rename = "timeSeries")]
    pub time_series: TimeSeries,
    pub kpis: KpiRecord,
    /// Resolved parameter set, flags as 0/1
    pub params: BTreeMap<String, f64>,
    pub mode: Mode,
    #[serde(rename = "stressProfile")]
    pub stress_profile: StressProfile,
}

impl SimulationResponse {
    /// Build the response, thinning the series to at most `max_points` samples
    ///
    /// KPIs always come from the full-resolution outcome.
    pub fn from_outcome(outcome: &SimulationOutcome, max_points: Option<usize>) -> Self {
        let len = outcome.control.len().min(outcome.treatment.len());
        let indices = downsample_indices(len, max_points.unwrap_or(len));

        Self {
            time_series: TimeSeries {
                time: indices.iter().map(|&i| outcome.control.time_h[i]).collect(),
                ctrl: StateSeries::sampled(&outcome.control, &indices),
                accd: StateSeries::sampled(&outcome.treatment, &indices),
            },
            kpis: outcome.kpis.clone(),
            params: outcome
                .params
                .to_map()
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            mode: outcome.mode,
            stress_profile: outcome.stress_profile,
        }
    }
}

/// Indices of at most `max_points` evenly spread samples out of `len`
///
/// The first and last samples are always kept. A limit below 2 is raised to 2.
pub fn downsample_indices(len: usize, max_points: usize) -> Vec<usize> {
    let target = max_points.max(2);
    if len <= target {
        return (0..len).collect();
    }
    let last = len - 1;
    let span = target - 1;
    (0..target)
        .map(|i| ((i * last) as f64 / span as f64).round() as usize)
        .collect()
}

/// Error body: `{ "detail": … }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

impl ErrorResponse {
    /// Body and status code for an engine error
    pub fn from_error(error: &SimulationError) -> (u16, Self) {
        (
            error.status_code(),
            Self {
                detail: error.to_string(),
            },
        )
    }
}

/// Default values, mode names and every mode's override map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultsCatalog {
    pub params: BTreeMap<String, f64>,
    pub modes: Vec<Mode>,
    /// Parameters each mode changes relative to the defaults
    #[serde(rename = "modePresets")]
    pub mode_presets: BTreeMap<String, BTreeMap<String, f64>>,
}

impl DefaultsCatalog {
    pub fn build() -> Self {
        let defaults = ModelParameters::default();
        let params = ParameterOverrides::from_parameters(&defaults);

        let mode_presets = Mode::ALL
            .iter()
            .map(|mode| {
                let preset = mode
                    .preset()
                    .iter()
                    .map(|&(key, value)| (key.to_string(), value))
                    .collect();
                (mode.as_str().to_string(), preset)
            })
            .collect();

        Self {
            params: params.iter().map(|(k, &v)| (k.clone(), v)).collect(),
            modes: Mode::ALL.to_vec(),
            mode_presets,
        }
    }
}
