//! Run parameters.
//!
//! A run is fully described by a configuration bundle, a population size,
//! a month count and a seed. Everything the runtime persists or replays is
//! keyed on this value.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use attrition_engine::config::SimulationConfig;
use attrition_engine::engine::{simulate, SimulationRun};
use attrition_engine::error::ConfigError;
use attrition_engine::hashing::config_hash;

use crate::error::RuntimeError;

pub const DEFAULT_EMPLOYEE_COUNT: u32 = 1000;
pub const DEFAULT_MONTHS: u32 = 24;
pub const DEFAULT_SEED: u64 = 42;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunParams {
    pub config: SimulationConfig,
    pub employee_count: u32,
    pub months: u32,
    pub seed: u64,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            config: SimulationConfig::default(),
            employee_count: DEFAULT_EMPLOYEE_COUNT,
            months: DEFAULT_MONTHS,
            seed: DEFAULT_SEED,
        }
    }
}

impl RunParams {
    pub fn new(config: SimulationConfig, employee_count: u32, months: u32, seed: u64) -> Self {
        Self {
            config,
            employee_count,
            months,
            seed,
        }
    }

    pub fn with_config(mut self, config: SimulationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Reject the run before generating anything.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.employee_count == 0 {
            return Err(ConfigError::NonPositiveEmployeeCount);
        }
        if self.months == 0 {
            return Err(ConfigError::NonPositiveMonths);
        }
        self.config.validate()
    }

    /// Generate the population and run every month in memory.
    pub fn simulate(&self) -> Result<SimulationRun, RuntimeError> {
        self.validate()?;
        let digest = config_hash(&self.config);
        info!(
            employees = self.employee_count,
            months = self.months,
            seed = self.seed,
            config = &digest[..12],
            "run requested"
        );
        Ok(simulate(&self.config, self.employee_count, self.months, self.seed)?)
    }
}

/// Read and validate a JSON configuration bundle. Missing fields default.
pub fn load_config(path: &Path) -> Result<SimulationConfig, RuntimeError> {
    let text = fs::read_to_string(path).map_err(|source| RuntimeError::ConfigFile {
        path: path.display().to_string(),
        source,
    })?;
    Ok(SimulationConfig::from_json_str(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use attrition_engine::domain::Branch;

    #[test]
    fn test_defaults_match_cli_defaults() {
        let params = RunParams::default();
        assert_eq!(params.employee_count, 1000);
        assert_eq!(params.months, 24);
        assert_eq!(params.seed, 42);
    }

    #[test]
    fn test_zero_months_rejected_before_generation() {
        let mut params = RunParams::default();
        params.months = 0;
        assert!(matches!(
            params.simulate(),
            Err(RuntimeError::Config(ConfigError::NonPositiveMonths))
        ));
    }

    #[test]
    fn test_load_config_applies_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"recruit_lead_time": {"Urban": 3, "Rural": 12}}"#).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.lead_time(Branch::Urban), 3);
        assert_eq!(config.lead_time(Branch::Rural), 12);
        assert_eq!(config.hiring_fee_rate, 0.35);
    }

    #[test]
    fn test_load_config_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, RuntimeError::ConfigFile { .. }));
    }

    #[test]
    fn test_load_config_rejects_unknown_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"lead_times": 4}"#).unwrap();
        assert!(matches!(
            load_config(&path),
            Err(RuntimeError::Config(ConfigError::Parse(_)))
        ));
    }
}
