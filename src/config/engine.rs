//! Engine settings: solver tolerances, request timeout and scheduling.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::solver::SolverConfig;

/// Settings that shape how a request is executed, not what is simulated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Adaptive integrator settings
    pub solver: SolverConfig,
    /// Wall-clock budget for both scenarios together (None = unlimited)
    pub timeout_ms: Option<u64>,
    /// Run control and treatment on separate threads
    pub parallel: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            solver: SolverConfig::default(),
            timeout_ms: None,
            parallel: true,
        }
    }
}

impl EngineConfig {
    /// Load from JSON file or return defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match std::fs::read_to_string(path.as_ref()) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("Loaded engine config from {:?}", path.as_ref());
                    config
                }
                Err(e) => {
                    log::warn!("Failed to parse engine config: {}, using defaults", e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("Engine config file not found, using defaults");
                Self::default()
            }
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(timeout.as_millis() as u64);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"timeout_ms": 250, "solver": {"rtol": 1e-6}}"#).unwrap();
        assert_eq!(config.timeout(), Some(Duration::from_millis(250)));
        assert!(config.parallel);
        assert!((config.solver.rtol - 1e-6).abs() < 1e-18);
        assert!((config.solver.atol - SolverConfig::default().atol).abs() < 1e-18);
    }
}
