//! Sampled solution of one scenario.

use serde::Serialize;

use super::SolverStats;
use crate::model::{ModelState, Scenario, StateVariable, N_STATES};

/// `n` evenly spaced times covering [0, t_end], endpoints included
pub fn output_times(t_end_h: f64, n_points: usize) -> Vec<f64> {
    match n_points {
        0 => Vec::new(),
        1 => vec![0.0],
        n => {
            let last = (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { t_end_h } else { t_end_h * i as f64 / last })
                .collect()
        }
    }
}

/// Column-major time series of the five state variables
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trajectory {
    pub scenario: Scenario,
    /// Sample times (h)
    pub time_h: Vec<f64>,
    /// One column per state variable, indexed by [`StateVariable::index`]
    pub states: [Vec<f64>; N_STATES],
    /// Integrator counters
    pub stats: SolverStats,
}

impl Trajectory {
    /// Build from row-major samples as produced by the integrator
    pub fn from_rows(
        scenario: Scenario,
        time_h: Vec<f64>,
        rows: &[Vec<f64>],
        stats: SolverStats,
    ) -> Self {
        let mut states: [Vec<f64>; N_STATES] = Default::default();
        for column in states.iter_mut() {
            column.reserve(rows.len());
        }
        for row in rows {
            for (column, &value) in states.iter_mut().zip(row.iter()) {
                column.push(value);
            }
        }
        Self {
            scenario,
            time_h,
            states,
            stats,
        }
    }

    pub fn len(&self) -> usize {
        self.time_h.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time_h.is_empty()
    }

    /// Samples of one variable
    pub fn series(&self, var: StateVariable) -> &[f64] {
        &self.states[var.index()]
    }

    /// State at sample `i`
    pub fn state_at(&self, i: usize) -> Option<ModelState> {
        if i >= self.len() {
            return None;
        }
        Some(ModelState {
            plant_acc_mM: self.states[0][i],
            root_acc_mM: self.states[1][i],
            ethylene_uM: self.states[2][i],
            biomass_g_per_L: self.states[3][i],
            growth_index: self.states[4][i],
        })
    }

    pub fn final_state(&self) -> Option<ModelState> {
        self.len().checked_sub(1).and_then(|i| self.state_at(i))
    }

    pub fn final_value(&self, var: StateVariable) -> Option<f64> {
        self.series(var).last().copied()
    }

    /// First maximum of a variable as (time, value)
    pub fn peak(&self, var: StateVariable) -> Option<(f64, f64)> {
        let series = self.series(var);
        let mut best: Option<(usize, f64)> = None;
        for (i, &value) in series.iter().enumerate() {
            match best {
                Some((_, current)) if value <= current => {}
                _ => best = Some((i, value)),
            }
        }
        best.map(|(i, value)| (self.time_h[i], value))
    }

    /// Smallest value of a variable across all samples
    pub fn min_value(&self, var: StateVariable) -> Option<f64> {
        self.series(var).iter().copied().reduce(f64::min)
    }
}
