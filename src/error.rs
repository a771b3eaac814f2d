//! Error types for the simulation engine.
//!
//! Three families are kept distinct because the caller reacts differently to
//! each: validation errors (bad request, rejected before any integration),
//! numerical failures (the solver could not meet tolerance), and timeouts.
//! Degenerate KPIs are not errors; they are reported as `None`.

use thiserror::Error;

use crate::model::Scenario;

/// Failure modes of the adaptive integrator
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IntegrationError {
    /// Error control pushed the step below the configured minimum
    #[error("step size collapsed to {h:.3e} h at t={t:.6} h (system too stiff for explicit RK)")]
    StepSizeCollapse { t: f64, h: f64 },

    /// Step budget spent before reaching the end of the horizon
    #[error("exceeded {max_steps} steps at t={t:.6} h before reaching t_end")]
    StepBudgetExhausted { t: f64, max_steps: usize },

    /// A derivative or state component became NaN or infinite
    #[error("non-finite state encountered at t={t:.6} h")]
    NonFiniteState { t: f64 },

    /// Wall-clock deadline passed inside the integration loop
    #[error("deadline exceeded at t={t:.6} h")]
    DeadlineExceeded { t: f64 },
}

/// Root error type for a simulation request
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    /// Parameter name not in the catalog
    #[error("unknown parameter `{0}`")]
    UnknownParameter(String),

    /// Parameter present but out of its admissible range
    #[error("invalid value for `{field}`: {reason}")]
    InvalidParameter { field: String, reason: String },

    /// Mode name not one of the presets
    #[error("unknown mode `{0}` (expected baseline, high_export, endophytic, feedback or custom)")]
    UnknownMode(String),

    /// Request body could not be decoded
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    /// The integrator failed for one of the two scenarios
    #[error("integration failed for {scenario} scenario: {source}")]
    Integration {
        scenario: Scenario,
        #[source]
        source: IntegrationError,
    },

    /// The request deadline expired before both scenarios finished
    #[error("simulation timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },
}

impl SimulationError {
    /// Shorthand for a range violation on a named field
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Field the error refers to, when there is one
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::UnknownParameter(name) => Some(name),
            Self::InvalidParameter { field, .. } => Some(field),
            Self::UnknownMode(_) => Some("mode"),
            _ => None,
        }
    }

    /// True for errors caused by the request itself
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::UnknownParameter(_)
                | Self::InvalidParameter { .. }
                | Self::UnknownMode(_)
                | Self::MalformedRequest(_)
        )
    }

    /// HTTP-style status code for the transport layer
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Timeout { .. } => 504,
            Self::Integration { .. } => 500,
            _ => 422,
        }
    }
}

/// Result alias used throughout the crate
pub type SimResult<T> = Result<T, SimulationError>;
