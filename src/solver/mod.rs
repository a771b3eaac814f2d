//! Time integration of the model.
//!
//! [`integrator`] holds the general adaptive Runge-Kutta stepper;
//! [`trajectory`] the sampled output of one scenario.

pub mod integrator;
pub mod trajectory;

use std::time::Instant;

pub use integrator::{DormandPrinceIntegrator, SolverConfig, SolverStats};
pub use trajectory::{output_times, Trajectory};

use crate::error::IntegrationError;
use crate::model::{AccEthyleneModel, N_STATES};

/// Integrate one scenario over [0, t_end] at `n_points` evenly spaced samples
///
/// The horizon and sample count come from the model's parameter set.
pub fn solve_scenario(
    model: &AccEthyleneModel<'_>,
    config: &SolverConfig,
    deadline: Option<Instant>,
) -> Result<Trajectory, IntegrationError> {
    let settings = &model.params.settings;
    let times = output_times(settings.t_end_h, settings.n_points);
    let y0 = model.initial_state();

    let mut integrator = DormandPrinceIntegrator::new(N_STATES, config.clone());
    let rows = integrator.integrate(
        &y0,
        &times,
        |t, y, dydt| model.derivatives(t, y, dydt),
        deadline,
    )?;

    log::debug!(
        "{} scenario: {} accepted, {} rejected steps, {} RHS evaluations",
        model.scenario,
        integrator.stats.accepted_steps,
        integrator.stats.rejected_steps,
        integrator.stats.rhs_evaluations
    );

    Ok(Trajectory::from_rows(
        model.scenario,
        times,
        &rows,
        integrator.stats,
    ))
}
