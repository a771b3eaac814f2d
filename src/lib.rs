//! ACCD Sim - ACC / ethylene / bacterial ACC deaminase simulation engine
//!
//! This library integrates a five-state model of plant ACC, root-zone ACC,
//! headspace ethylene, bacterial biomass and plant growth, and compares an
//! uninoculated control against an ACCD-producing bacterial treatment.

// Allow non-snake-case for unit suffixes in field names (mM, uM, g_per_L, etc.)
// This follows the project convention of including units in names.
#![allow(non_snake_case)]

pub mod analysis;
pub mod config;
pub mod error;
pub mod export;
pub mod kinetics;
pub mod model;
pub mod simulation;
pub mod solver;

pub use analysis::{KpiRecord, Mechanism};
pub use config::{
    resolve_parameters, EngineConfig, Mode, ModelParameters, ParameterOverrides, PARAMETER_SPECS,
};
pub use error::{IntegrationError, SimResult, SimulationError};
pub use export::{DefaultsCatalog, ErrorResponse, SimulationResponse};
pub use kinetics::StressProfile;
pub use model::{AccEthyleneModel, FluxBreakdown, ModelState, Scenario, StateVariable};
pub use simulation::{SimulationEngine, SimulationOutcome, SimulationRequest};
pub use solver::{DormandPrinceIntegrator, SolverConfig, SolverStats, Trajectory};
