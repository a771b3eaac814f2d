//! Post-processing of paired control/treatment trajectories.

pub mod kpi;

pub use kpi::{active_mechanisms, percent_change, percent_reduction, KpiRecord, Mechanism};
