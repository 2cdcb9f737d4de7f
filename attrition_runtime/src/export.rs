//! Run report codec: deterministic JSON export of a finished run.
//!
//! Pure codec layer plus file I/O. No timestamps, so identical runs export
//! byte-identical reports.
//!
//! - `RunReport::from_run`:  parameters + run output → report with hashes
//! - `encode_report`:        report → JSON string
//! - `decode_report`:        JSON string → report (strict, hashes verified)
//! - `write_report` / `read_report`: file I/O

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use attrition_engine::analysis::{
    months_over_threshold, peak_hp_overtime, retention_series, risk_matrix, RiskMatrix,
    OVERWORK_THRESHOLD_HOURS,
};
use attrition_engine::domain::{Branch, Employee, MonthlyRecord};
use attrition_engine::engine::SimulationRun;
use attrition_engine::error::ConfigError;
use attrition_engine::hashing::{config_hash, history_hash};
use attrition_engine::MODEL_VERSION;

use crate::run::RunParams;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// All possible report codec failures.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("report serialization failed: {0}")]
    Serialization(String),

    /// Malformed JSON, missing fields or unknown fields.
    #[error("report deserialization failed: {0}")]
    Deserialization(String),

    #[error("report was written by unsupported model version {found}")]
    UnsupportedModelVersion { found: u32 },

    #[error("{field} mismatch: report says {expected}, content hashes to {actual}")]
    HashMismatch {
        field: &'static str,
        expected: String,
        actual: String,
    },

    #[error("report carries invalid run parameters: {0}")]
    InvalidParams(#[from] ConfigError),

    #[error("report file I/O failed: {0}")]
    Io(#[from] io::Error),
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Headline indicators derived from the records and the final population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunSummary {
    pub final_cumulative_loss: f64,
    pub final_cash_out: f64,
    pub final_headcount: u32,
    pub total_resigned: u32,
    pub total_hired: u32,
    /// Final headcount as a percentage of month 0's, per branch.
    pub urban_retention_pct: f64,
    pub rural_retention_pct: f64,
    pub peak_hp_month: Option<u32>,
    pub peak_hp_overtime: f64,
    pub months_over_overwork_line: usize,
    pub final_risk: RiskMatrix,
}

impl RunSummary {
    fn build(params: &RunParams, records: &[MonthlyRecord], final_population: &[Employee]) -> Self {
        let last = records.last();
        let final_retention = |branch| retention_series(records, branch).last().copied().unwrap_or(0.0);
        let peak = peak_hp_overtime(records);

        Self {
            final_cumulative_loss: last.map_or(0.0, |r| r.cumulative_loss),
            final_cash_out: last.map_or(0.0, |r| r.cumulative_cash_out),
            final_headcount: last.map_or(0, |r| r.total_active()),
            total_resigned: records.iter().map(|r| r.resigned).sum(),
            total_hired: records.iter().map(|r| r.hired).sum(),
            urban_retention_pct: final_retention(Branch::Urban),
            rural_retention_pct: final_retention(Branch::Rural),
            peak_hp_month: peak.map(|(month, _)| month),
            peak_hp_overtime: peak.map_or(0.0, |(_, hours)| hours),
            months_over_overwork_line: months_over_threshold(records, OVERWORK_THRESHOLD_HOURS),
            final_risk: risk_matrix(final_population, &params.config),
        }
    }
}

/// Everything needed to render or replay a finished run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunReport {
    pub model_version: u32,
    pub params: RunParams,
    pub config_hash: String,
    pub history_hash: String,
    pub summary: RunSummary,
    pub records: Vec<MonthlyRecord>,
    pub final_population: Vec<Employee>,
}

impl RunReport {
    pub fn from_run(params: &RunParams, run: &SimulationRun) -> Self {
        Self {
            model_version: MODEL_VERSION,
            params: params.clone(),
            config_hash: config_hash(&params.config),
            history_hash: history_hash(&run.records),
            summary: RunSummary::build(params, &run.records, &run.final_state.population),
            records: run.records.clone(),
            final_population: run.final_state.population.clone(),
        }
    }

    /// Recompute both hashes and compare against the stored ones.
    pub fn verify(&self) -> Result<(), ExportError> {
        if self.model_version != MODEL_VERSION {
            return Err(ExportError::UnsupportedModelVersion {
                found: self.model_version,
            });
        }
        self.params.validate()?;

        let actual = config_hash(&self.params.config);
        if actual != self.config_hash {
            return Err(ExportError::HashMismatch {
                field: "config_hash",
                expected: self.config_hash.clone(),
                actual,
            });
        }
        let actual = history_hash(&self.records);
        if actual != self.history_hash {
            return Err(ExportError::HashMismatch {
                field: "history_hash",
                expected: self.history_hash.clone(),
                actual,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Codec
// ---------------------------------------------------------------------------

pub fn encode_report(report: &RunReport) -> Result<String, ExportError> {
    serde_json::to_string(report).map_err(|e| ExportError::Serialization(e.to_string()))
}

/// Strict decode: unknown fields are rejected and both hashes are verified.
pub fn decode_report(json: &str) -> Result<RunReport, ExportError> {
    let report: RunReport =
        serde_json::from_str(json).map_err(|e| ExportError::Deserialization(e.to_string()))?;
    report.verify()?;
    Ok(report)
}

// ---------------------------------------------------------------------------
// File I/O
// ---------------------------------------------------------------------------

/// Creates parent directories if needed.
pub fn write_report(report: &RunReport, path: &Path) -> Result<(), ExportError> {
    let json = encode_report(report)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, json.as_bytes())?;
    Ok(())
}

pub fn read_report(path: &Path) -> Result<RunReport, ExportError> {
    let content = fs::read_to_string(path)?;
    decode_report(&content)
}
