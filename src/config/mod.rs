//! Configuration: model parameters, mode presets and engine settings.
//!
//! Parameter defaults are literature-informed; ranges are documented on the
//! individual fields.

mod engine;
mod modes;
mod parameters;

pub use engine::EngineConfig;
pub use modes::{resolve_parameters, Mode, MECHANISM_TOGGLE_KEYS};
pub use parameters::{
    parameter_spec, InitialConditions, KineticParameters, MechanismParameters, ModelParameters,
    ParameterKind, ParameterOverrides, ParameterSpec, SimulationSettings, MAX_OUTPUT_POINTS,
    PARAMETER_SPECS,
};
