//! Right-hand side bound to one parameter set and one scenario.

use super::{FluxBreakdown, ModelState, Scenario, N_STATES};
use crate::config::ModelParameters;
use crate::kinetics::StressProfile;

/// The ODE system dy/dt = f(t, y) for one scenario
///
/// Control and treatment are two instances of this type that differ only in
/// `scenario`; there is no second copy of the equations.
#[derive(Debug, Clone)]
pub struct AccEthyleneModel<'a> {
    pub params: &'a ModelParameters,
    pub stress: StressProfile,
    pub scenario: Scenario,
}

impl<'a> AccEthyleneModel<'a> {
    pub fn new(params: &'a ModelParameters, stress: StressProfile, scenario: Scenario) -> Self {
        Self {
            params,
            stress,
            scenario,
        }
    }

    /// Initial state vector for this scenario
    pub fn initial_state(&self) -> [f64; N_STATES] {
        ModelState::initial(self.params, self.scenario).to_array()
    }

    /// Flux breakdown at (t, y) for diagnostics
    pub fn fluxes(&self, t_h: f64, y: &[f64]) -> FluxBreakdown {
        let state = ModelState::from_slice_clamped(y);
        FluxBreakdown::compute(self.params, &self.stress, self.scenario, t_h, &state)
    }

    /// Evaluate dy/dt into `dydt`
    ///
    /// Negative components of `y` (integrator round-off) are treated as zero
    /// by the rate laws.
    #[inline]
    pub fn derivatives(&self, t_h: f64, y: &[f64], dydt: &mut [f64]) {
        let d = self.fluxes(t_h, y).derivatives(self.params);
        for (out, value) in dydt.iter_mut().zip(d) {
            *out = value;
        }
    }
}
