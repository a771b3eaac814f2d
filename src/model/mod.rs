//! Five-state ACC / ethylene / ACCD model.
//!
//! State layout (index order of the derivative vector):
//! - Ap: intracellular plant ACC (mM)
//! - Ar: root-zone ACC (mM)
//! - Ce: gas-phase ethylene (µM)
//! - Xb: bacterial biomass (g DCW/L)
//! - G: plant growth index (dimensionless)
//!
//! Export from plant to root zone is driven by the concentration gradient
//! `Ap - Ar/(Vp/Vr)`. Bacterial ACCD lowers Ar, which steepens the gradient,
//! pulls ACC out of the plant and so lowers ethylene production.

pub mod fluxes;
pub mod rhs;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::ModelParameters;

pub use fluxes::FluxBreakdown;
pub use rhs::AccEthyleneModel;

/// Number of state variables
pub const N_STATES: usize = 5;

/// Named index into the state vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateVariable {
    PlantAcc,
    RootAcc,
    Ethylene,
    Biomass,
    Growth,
}

impl StateVariable {
    pub const ALL: [StateVariable; N_STATES] = [
        StateVariable::PlantAcc,
        StateVariable::RootAcc,
        StateVariable::Ethylene,
        StateVariable::Biomass,
        StateVariable::Growth,
    ];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            StateVariable::PlantAcc => 0,
            StateVariable::RootAcc => 1,
            StateVariable::Ethylene => 2,
            StateVariable::Biomass => 3,
            StateVariable::Growth => 4,
        }
    }

    /// Key used in the response time series
    pub fn wire_name(self) -> &'static str {
        match self {
            StateVariable::PlantAcc => "Ap",
            StateVariable::RootAcc => "Ar",
            StateVariable::Ethylene => "E",
            StateVariable::Biomass => "Xb",
            StateVariable::Growth => "G",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            StateVariable::PlantAcc | StateVariable::RootAcc => "mM",
            StateVariable::Ethylene => "uM",
            StateVariable::Biomass => "g/L",
            StateVariable::Growth => "-",
        }
    }
}

/// Which of the two paired runs a trajectory belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    /// No bacteria: ACCD uptake terms absent and biomass held at zero
    Control,
    /// Full model with inoculated biomass
    Treatment,
}

impl Scenario {
    #[inline]
    pub fn bacteria_enabled(self) -> bool {
        matches!(self, Scenario::Treatment)
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scenario::Control => f.write_str("control"),
            Scenario::Treatment => f.write_str("treatment"),
        }
    }
}

/// Snapshot of the five state variables
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ModelState {
    /// Intracellular plant ACC (mM)
    pub plant_acc_mM: f64,
    /// Root-zone ACC (mM)
    pub root_acc_mM: f64,
    /// Gas-phase ethylene (µM)
    pub ethylene_uM: f64,
    /// Bacterial biomass (g DCW/L)
    pub biomass_g_per_L: f64,
    /// Plant growth index
    pub growth_index: f64,
}

impl ModelState {
    /// Initial state for a scenario; the control run starts (and stays)
    /// without biomass
    pub fn initial(params: &ModelParameters, scenario: Scenario) -> Self {
        let ic = &params.initial;
        Self {
            plant_acc_mM: ic.plant_acc_mM,
            root_acc_mM: ic.root_acc_mM,
            ethylene_uM: ic.ethylene_uM,
            biomass_g_per_L: if scenario.bacteria_enabled() {
                ic.biomass_g_per_L
            } else {
                0.0
            },
            growth_index: ic.growth_index,
        }
    }

    /// Read from a state slice, clamping negative round-off to zero
    #[inline]
    pub fn from_slice_clamped(y: &[f64]) -> Self {
        let at = |i: usize| y.get(i).copied().unwrap_or(0.0).max(0.0);
        Self {
            plant_acc_mM: at(0),
            root_acc_mM: at(1),
            ethylene_uM: at(2),
            biomass_g_per_L: at(3),
            growth_index: at(4),
        }
    }

    #[inline]
    pub fn to_array(&self) -> [f64; N_STATES] {
        [
            self.plant_acc_mM,
            self.root_acc_mM,
            self.ethylene_uM,
            self.biomass_g_per_L,
            self.growth_index,
        ]
    }

    #[inline]
    pub fn get(&self, var: StateVariable) -> f64 {
        self.to_array()[var.index()]
    }
}
