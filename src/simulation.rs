//! Simulation engine: request in, paired trajectories and KPIs out.
//!
//! A run resolves the parameter set, validates it, integrates the control
//! and treatment scenarios (concurrently by default), and summarises them.
//! The engine holds no mutable state, so one instance can serve any number
//! of concurrent requests.

use std::thread;
use std::time::Instant;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::analysis::KpiRecord;
use crate::config::{resolve_parameters, EngineConfig, Mode, ModelParameters, ParameterOverrides};
use crate::error::{IntegrationError, SimResult, SimulationError};
use crate::kinetics::StressProfile;
use crate::model::{AccEthyleneModel, FluxBreakdown, Scenario};
use crate::solver::{solve_scenario, Trajectory};

/// Request keys that are not parameter names
const MODE_KEY: &str = "mode";
const STRESS_PROFILE_KEY: &str = "stressProfile";

/// One simulation request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationRequest {
    pub mode: Mode,
    pub stress_profile: StressProfile,
    /// Caller parameter values, applied after the mode preset
    pub overrides: ParameterOverrides,
}

impl SimulationRequest {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    pub fn with_override(mut self, key: &str, value: f64) -> Self {
        self.overrides.insert(key, value);
        self
    }

    pub fn with_stress_profile(mut self, profile: StressProfile) -> Self {
        self.stress_profile = profile;
        self
    }

    /// Decode a JSON request body
    ///
    /// The body is a flat object of parameter values plus the optional
    /// `mode` and `stressProfile` keys. Unknown keys are rejected.
    pub fn from_json(body: &str) -> SimResult<Self> {
        let value: Value = serde_json::from_str(body)
            .map_err(|e| SimulationError::MalformedRequest(e.to_string()))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> SimResult<Self> {
        let Value::Object(mut object) = value else {
            return Err(SimulationError::MalformedRequest(
                "request body must be a JSON object".to_string(),
            ));
        };

        let mode = match object.remove(MODE_KEY) {
            None | Some(Value::Null) => Mode::default(),
            Some(Value::String(name)) => name.parse()?,
            Some(other) => {
                return Err(SimulationError::invalid(
                    MODE_KEY,
                    format!("expected a string, got {other}"),
                ))
            }
        };

        let stress_profile = match object.remove(STRESS_PROFILE_KEY) {
            None | Some(Value::Null) => StressProfile::default(),
            Some(raw) => serde_json::from_value(raw)
                .map_err(|e| SimulationError::invalid(STRESS_PROFILE_KEY, e.to_string()))?,
        };

        Ok(Self {
            mode,
            stress_profile,
            overrides: ParameterOverrides::from_json_map(&object)?,
        })
    }

    /// Encode back to the wire shape accepted by [`SimulationRequest::from_json`]
    pub fn to_value(&self) -> Value {
        let mut object = Map::new();
        for (key, value) in self.overrides.iter() {
            object.insert(key.clone(), Value::from(*value));
        }
        object.insert(MODE_KEY.to_string(), Value::from(self.mode.as_str()));
        if let Ok(profile) = serde_json::to_value(self.stress_profile) {
            object.insert(STRESS_PROFILE_KEY.to_string(), profile);
        }
        Value::Object(object)
    }
}

/// Everything one run produces
#[derive(Debug, Clone, Serialize)]
pub struct SimulationOutcome {
    pub mode: Mode,
    pub stress_profile: StressProfile,
    /// Resolved, validated parameter set used for both scenarios
    pub params: ModelParameters,
    pub control: Trajectory,
    pub treatment: Trajectory,
    pub kpis: KpiRecord,
}

impl SimulationOutcome {
    pub fn trajectory(&self, scenario: Scenario) -> &Trajectory {
        match scenario {
            Scenario::Control => &self.control,
            Scenario::Treatment => &self.treatment,
        }
    }

    /// Flux breakdown of one scenario at sample `index`
    pub fn fluxes_at(&self, scenario: Scenario, index: usize) -> Option<FluxBreakdown> {
        let trajectory = self.trajectory(scenario);
        let state = trajectory.state_at(index)?;
        let model = AccEthyleneModel::new(&self.params, self.stress_profile, scenario);
        Some(model.fluxes(trajectory.time_h[index], &state.to_array()))
    }
}

/// Stateless simulation service
#[derive(Debug, Clone, Default)]
pub struct SimulationEngine {
    config: EngineConfig,
    base: ModelParameters,
}

impl SimulationEngine {
    /// Engine over the catalog defaults
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            base: ModelParameters::default(),
        }
    }

    /// Replace the parameter set that requests are resolved against
    pub fn with_base_parameters(mut self, base: ModelParameters) -> Self {
        self.base = base;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn base_parameters(&self) -> &ModelParameters {
        &self.base
    }

    /// Resolve and validate the parameter set for a request without running it
    pub fn resolve(&self, request: &SimulationRequest) -> SimResult<ModelParameters> {
        request.stress_profile.validate()?;
        resolve_parameters(&self.base, request.mode, &request.overrides)
    }

    /// Run both scenarios and compute the KPIs
    ///
    /// # Errors
    /// Validation errors are returned before any integration starts. A
    /// solver failure in either scenario, or an expired deadline, fails the
    /// whole run; no partial result is returned.
    pub fn run(&self, request: &SimulationRequest) -> SimResult<SimulationOutcome> {
        let params = self.resolve(request)?;
        let started = Instant::now();
        let deadline = self.config.timeout().map(|budget| started + budget);

        log::info!(
            "Running mode {} ({} stress) to t={} h with {} samples",
            request.mode,
            request.stress_profile.kind(),
            params.settings.t_end_h,
            params.settings.n_points
        );

        let control_model =
            AccEthyleneModel::new(&params, request.stress_profile, Scenario::Control);
        let treatment_model =
            AccEthyleneModel::new(&params, request.stress_profile, Scenario::Treatment);
        let solver = &self.config.solver;

        let (control, treatment) = if self.config.parallel {
            thread::scope(|scope| {
                let handle = scope.spawn(|| solve_scenario(&control_model, solver, deadline));
                let treatment = solve_scenario(&treatment_model, solver, deadline);
                let control = handle
                    .join()
                    .unwrap_or_else(|panic| std::panic::resume_unwind(panic));
                (control, treatment)
            })
        } else {
            (
                solve_scenario(&control_model, solver, deadline),
                solve_scenario(&treatment_model, solver, deadline),
            )
        };

        let control = control.map_err(|e| self.integration_error(Scenario::Control, e))?;
        let treatment = treatment.map_err(|e| self.integration_error(Scenario::Treatment, e))?;

        let kpis = KpiRecord::compute(&params, &control, &treatment);
        log::info!(
            "Finished in {:.1} ms: peak reduction {}",
            started.elapsed().as_secs_f64() * 1e3,
            kpis.reduction_peak_pct
                .map(|pct| format!("{pct:.2}%"))
                .unwrap_or_else(|| "n/a".to_string())
        );

        Ok(SimulationOutcome {
            mode: request.mode,
            stress_profile: request.stress_profile,
            params,
            control,
            treatment,
            kpis,
        })
    }

    fn integration_error(&self, scenario: Scenario, error: IntegrationError) -> SimulationError {
        match error {
            IntegrationError::DeadlineExceeded { .. } => SimulationError::Timeout {
                timeout_ms: self.config.timeout_ms.unwrap_or_default(),
            },
            source => {
                log::warn!("{} scenario failed: {}", scenario, source);
                SimulationError::Integration { scenario, source }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short_request(mode: Mode) -> SimulationRequest {
        SimulationRequest::new(mode)
            .with_override("t_end", 24.0)
            .with_override("n_points", 49.0)
    }

    #[test]
    fn test_request_parsing() {
        let request = SimulationRequest::from_json(
            r#"{"mode": "endophytic", "k_exp": 0.2, "fb_enable": true,
                "stressProfile": {"kind": "step", "onset_h": 6.0}}"#,
        )
        .unwrap();
        assert_eq!(request.mode, Mode::Endophytic);
        assert_eq!(request.overrides.get("k_exp"), Some(0.2));
        assert_eq!(request.overrides.get("fb_enable"), Some(1.0));
        assert_eq!(request.stress_profile, StressProfile::Step { onset_h: 6.0 });

        let empty = SimulationRequest::from_json("{}").unwrap();
        assert_eq!(empty, SimulationRequest::default());
    }

    #[test]
    fn test_request_rejections() {
        let unknown = SimulationRequest::from_json(r#"{"k_unknown": 1}"#).unwrap_err();
        assert_eq!(unknown.field(), Some("k_unknown"));

        let mode = SimulationRequest::from_json(r#"{"mode": "turbo"}"#).unwrap_err();
        assert!(matches!(mode, SimulationError::UnknownMode(_)));

        let body = SimulationRequest::from_json("[1, 2]").unwrap_err();
        assert!(matches!(body, SimulationError::MalformedRequest(_)));

        let profile =
            SimulationRequest::from_json(r#"{"stressProfile": {"kind": "sine"}}"#).unwrap_err();
        assert_eq!(profile.field(), Some("stressProfile"));
    }

    #[test]
    fn test_request_value_roundtrip() {
        let request = short_request(Mode::Feedback)
            .with_stress_profile(StressProfile::Pulse {
                onset_h: 2.0,
                duration_h: 4.0,
            });
        let decoded = SimulationRequest::from_value(request.to_value()).unwrap();
        assert_eq!(decoded, request);
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let request = short_request(Mode::Endophytic);
        let parallel = SimulationEngine::default().run(&request).unwrap();
        let sequential = SimulationEngine::new(EngineConfig {
            parallel: false,
            ..Default::default()
        })
        .run(&request)
        .unwrap();

        assert_eq!(parallel.control, sequential.control);
        assert_eq!(parallel.treatment, sequential.treatment);
        assert_eq!(parallel.kpis, sequential.kpis);
    }

    #[test]
    fn test_validation_precedes_integration() {
        let request = short_request(Mode::Baseline).with_override("n_hill", 0.0);
        let err = SimulationEngine::default().run(&request).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.field(), Some("n_hill"));
        assert_eq!(err.status_code(), 422);
    }

    #[test]
    fn test_solver_failure_names_scenario() {
        let config = EngineConfig {
            solver: crate::solver::SolverConfig {
                max_steps: 10,
                ..Default::default()
            },
            parallel: false,
            ..Default::default()
        };
        let err = SimulationEngine::new(config)
            .run(&short_request(Mode::Baseline))
            .unwrap_err();
        assert!(matches!(
            err,
            SimulationError::Integration {
                scenario: Scenario::Control,
                source: IntegrationError::StepBudgetExhausted { .. },
            }
        ));
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn test_fluxes_at_samples() {
        let outcome = SimulationEngine::default()
            .run(&short_request(Mode::Baseline))
            .unwrap();
        let control = outcome.fluxes_at(Scenario::Control, 10).unwrap();
        let treatment = outcome.fluxes_at(Scenario::Treatment, 10).unwrap();
        assert_eq!(control.total_accd(), 0.0);
        assert!(treatment.rhizosphere_uptake > 0.0);
        assert!(outcome.fluxes_at(Scenario::Control, 10_000).is_none());
    }
}
