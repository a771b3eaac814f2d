//! CSV downloads: paired time series and the resolved parameter table.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use super::response::TimeSeries;
use crate::config::{ModelParameters, PARAMETER_SPECS};

/// One row of the results CSV
#[derive(Debug, Clone, Serialize)]
pub struct ResultsRecord {
    #[serde(rename = "Time_h")]
    pub time_h: f64,
    #[serde(rename = "Ap_ctrl_mM")]
    pub ap_ctrl_mM: f64,
    #[serde(rename = "Ar_ctrl_mM")]
    pub ar_ctrl_mM: f64,
    #[serde(rename = "E_ctrl_uM")]
    pub e_ctrl_uM: f64,
    #[serde(rename = "Xb_ctrl")]
    pub xb_ctrl: f64,
    #[serde(rename = "G_ctrl")]
    pub g_ctrl: f64,
    #[serde(rename = "Ap_ACCD_mM")]
    pub ap_accd_mM: f64,
    #[serde(rename = "Ar_ACCD_mM")]
    pub ar_accd_mM: f64,
    #[serde(rename = "E_ACCD_uM")]
    pub e_accd_uM: f64,
    #[serde(rename = "Xb_ACCD")]
    pub xb_accd: f64,
    #[serde(rename = "G_ACCD")]
    pub g_accd: f64,
}

impl ResultsRecord {
    fn at(series: &TimeSeries, i: usize) -> Self {
        Self {
            time_h: series.time[i],
            ap_ctrl_mM: series.ctrl.plant_acc_mM[i],
            ar_ctrl_mM: series.ctrl.root_acc_mM[i],
            e_ctrl_uM: series.ctrl.ethylene_uM[i],
            xb_ctrl: series.ctrl.biomass_g_per_L[i],
            g_ctrl: series.ctrl.growth_index[i],
            ap_accd_mM: series.accd.plant_acc_mM[i],
            ar_accd_mM: series.accd.root_acc_mM[i],
            e_accd_uM: series.accd.ethylene_uM[i],
            xb_accd: series.accd.biomass_g_per_L[i],
            g_accd: series.accd.growth_index[i],
        }
    }
}

/// One row of the parameter CSV
#[derive(Debug, Clone, Serialize)]
pub struct ParameterRecord {
    #[serde(rename = "Symbol")]
    pub symbol: &'static str,
    #[serde(rename = "Value")]
    pub value: f64,
    #[serde(rename = "Unit")]
    pub unit: &'static str,
    #[serde(rename = "Description")]
    pub description: &'static str,
}

/// Write both scenarios side by side, one row per sample
pub fn write_results_csv<W: Write>(writer: W, series: &TimeSeries) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for i in 0..series.len() {
        csv_writer.serialize(ResultsRecord::at(series, i))?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write every parameter in catalog order
pub fn write_parameters_csv<W: Write>(writer: W, params: &ModelParameters) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for spec in PARAMETER_SPECS {
        if let Some(value) = params.get(spec.key) {
            csv_writer.serialize(ParameterRecord {
                symbol: spec.key,
                value,
                unit: spec.unit,
                description: spec.description,
            })?;
        }
    }
    csv_writer.flush()?;
    Ok(())
}

/// Save the results CSV to `path`
pub fn export_results_csv(series: &TimeSeries, path: &Path) -> Result<()> {
    write_results_csv(File::create(path)?, series)?;
    log::info!("Results CSV exported: {}", path.display());
    Ok(())
}

/// Save the parameter CSV to `path`
pub fn export_parameters_csv(params: &ModelParameters, path: &Path) -> Result<()> {
    write_parameters_csv(File::create(path)?, params)?;
    log::info!("Parameter CSV exported: {}", path.display());
    Ok(())
}
