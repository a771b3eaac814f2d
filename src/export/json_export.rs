//! JSON export of a complete simulation response.

use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Local;
use serde::Serialize;

use super::response::SimulationResponse;

/// Format version of the export envelope
pub const EXPORT_VERSION: &str = "1.0.0";

/// Response wrapped with export metadata
#[derive(Debug, Clone, Serialize)]
pub struct ResultsExport<'a> {
    /// Export timestamp
    pub exported_at: String,
    /// Export version for compatibility
    pub version: &'static str,
    #[serde(flatten)]
    pub response: &'a SimulationResponse,
}

impl<'a> ResultsExport<'a> {
    pub fn new(response: &'a SimulationResponse) -> Self {
        Self {
            exported_at: Local::now().to_rfc3339(),
            version: EXPORT_VERSION,
            response,
        }
    }
}

/// Export a response into `dir` under a timestamped name
///
/// Creates the directory if it doesn't exist. Filename:
/// `results_YYYYMMDD_HHMMSS.json`. Returns the path written.
pub fn export_results_json(response: &SimulationResponse, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let filename = format!("results_{}.json", Local::now().format("%Y%m%d_%H%M%S"));
    let path = dir.join(filename);
    export_results_json_to(response, &path)?;
    Ok(path)
}

/// Export a response to a specific file
pub fn export_results_json_to(response: &SimulationResponse, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)?;
    serde_json::to_writer_pretty(file, &ResultsExport::new(response))?;

    log::info!("JSON results exported: {}", path.display());
    Ok(())
}
