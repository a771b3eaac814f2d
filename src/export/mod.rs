//! Export functionality for simulation results.
//!
//! Provides the API wire shapes, CSV downloads and the JSON results export.

mod csv_export;
mod json_export;
mod response;

pub use csv_export::{
    export_parameters_csv, export_results_csv, write_parameters_csv, write_results_csv,
    ParameterRecord, ResultsRecord,
};
pub use json_export::{export_results_json, export_results_json_to, ResultsExport, EXPORT_VERSION};
pub use response::{
    downsample_indices, DefaultsCatalog, ErrorResponse, SimulationResponse, StateSeries,
    TimeSeries,
};
