//! Runtime error type.

use std::io;

use thiserror::Error;

use attrition_engine::error::{ConfigError, SimulationError};

use crate::export::ExportError;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Simulation(#[from] SimulationError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("record log I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("cannot read configuration file {path}: {source}")]
    ConfigFile {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("determinism failure: run 1 hashed {first}, run 2 hashed {second}")]
    Determinism { first: String, second: String },

    #[error("replayed history hash {actual} differs from the recorded {expected}")]
    ReplayMismatch { expected: String, actual: String },

    #[error("session {0} already holds recorded months")]
    SessionExists(String),

    #[error("session {0} has no months left to run")]
    SessionFinished(String),

    #[error("record log diverges from the report at month {month}")]
    LogMismatch { month: u32 },

    #[error("record log holds {log} months, the report holds {report}")]
    LogLength { log: usize, report: usize },
}
