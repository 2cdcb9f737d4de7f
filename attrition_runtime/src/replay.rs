//! Replay orchestrator: rebuild a run from its parameters.
//!
//! A run is a pure function of its parameters. Replay regenerates the
//! population from the seed and re-runs every month through the kernel.
//! No shortcuts, no cached state.

use attrition_engine::engine::SimulationRun;
use attrition_engine::hashing::history_hash;
use tracing::info;

use crate::error::RuntimeError;
use crate::export::RunReport;
use crate::run::RunParams;

/// Rebuild a run and return it with its history hash.
pub fn rebuild_run(params: &RunParams) -> Result<(SimulationRun, String), RuntimeError> {
    let run = params.simulate()?;
    let hash = history_hash(&run.records);
    Ok((run, hash))
}

/// Rebuild a run and return only the history hash.
pub fn rebuild_hash(params: &RunParams) -> Result<String, RuntimeError> {
    let (_, hash) = rebuild_run(params)?;
    Ok(hash)
}

/// Re-run the parameters stored in `report` and check the history matches.
pub fn replay_report(report: &RunReport) -> Result<SimulationRun, RuntimeError> {
    let (run, actual) = rebuild_run(&report.params)?;
    if actual != report.history_hash {
        return Err(RuntimeError::ReplayMismatch {
            expected: report.history_hash.clone(),
            actual,
        });
    }
    info!(hash = %actual, months = run.records.len(), "replay matches report");
    Ok(run)
}
