//! Session manager: isolated runs with persist-after-step semantics.
//!
//! Each session gets its own directory with a record log and a report.
//!
//! Step-before-persist order:
//!   1. engine.step()               kernel invariants checked, panics on a bug
//!   2. store.append_record()        only if step 1 succeeded
//!   3. report.json written once every month has run

use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use attrition_engine::domain::{Employee, MonthlyRecord};
use attrition_engine::engine::{AttritionEngine, SimulationRun};
use attrition_engine::generator::PopulationGenerator;
use attrition_engine::hashing::history_hash;

use crate::error::RuntimeError;
use crate::export::{read_report, write_report, RunReport};
use crate::record_store::RecordStore;
use crate::run::RunParams;

pub const RECORD_LOG_FILE: &str = "records.log";
pub const REPORT_FILE: &str = "report.json";

/// An isolated simulation session with its own record log.
pub struct Session {
    session_id: String,
    dir: PathBuf,
    params: RunParams,
    initial_population: Vec<Employee>,
    engine: AttritionEngine,
    store: RecordStore,
}

impl Session {
    /// Create a new session in the given base directory.
    ///
    /// Directory structure:
    ///   <base_dir>/<session_id>/records.log
    ///   <base_dir>/<session_id>/report.json
    ///
    /// Fails if the session already has recorded months.
    pub fn start(base_dir: &Path, session_id: &str, params: RunParams) -> Result<Self, RuntimeError> {
        params.validate()?;
        let dir = base_dir.join(session_id);
        let store = RecordStore::open(&dir.join(RECORD_LOG_FILE))?;
        if store.last_sequence() > 0 {
            return Err(RuntimeError::SessionExists(session_id.to_string()));
        }

        let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
        let generator = PopulationGenerator::new(params.config.clone())?;
        let initial_population = generator.generate(params.employee_count, &mut rng)?;
        let engine = AttritionEngine::new(params.config.clone(), initial_population.clone(), rng)?;

        info!(
            session = session_id,
            dir = %dir.display(),
            employees = params.employee_count,
            months = params.months,
            seed = params.seed,
            "session started"
        );

        Ok(Self {
            session_id: session_id.to_string(),
            dir,
            params,
            initial_population,
            engine,
            store,
        })
    }

    /// Advance one month and persist its record.
    pub fn step(&mut self) -> Result<MonthlyRecord, RuntimeError> {
        if self.months_remaining() == 0 {
            return Err(RuntimeError::SessionFinished(self.session_id.clone()));
        }
        let record = self.engine.step().clone();
        self.store.append_record(&record)?;
        debug!(session = %self.session_id, month = record.month, "month persisted");
        Ok(record)
    }

    /// Run every remaining month, then write and return the report.
    pub fn run_to_end(&mut self) -> Result<RunReport, RuntimeError> {
        while self.months_remaining() > 0 {
            self.step()?;
        }

        let run = SimulationRun {
            initial_population: self.initial_population.clone(),
            final_state: self.engine.state().clone(),
            records: self.engine.history().to_vec(),
            events: self.engine.events().to_vec(),
        };
        let report = RunReport::from_run(&self.params, &run);
        write_report(&report, &self.report_path())?;

        let log_digest = self.store.digest()?;
        info!(
            session = %self.session_id,
            history_hash = %report.history_hash,
            log_sha256 = %log_digest,
            "session finished"
        );
        Ok(report)
    }

    pub fn months_remaining(&self) -> u32 {
        self.params.months.saturating_sub(self.engine.month())
    }

    /// History hash of the months run so far.
    pub fn current_hash(&self) -> String {
        history_hash(self.engine.history())
    }

    pub fn history(&self) -> &[MonthlyRecord] {
        self.engine.history()
    }

    pub fn params(&self) -> &RunParams {
        &self.params
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn report_path(&self) -> PathBuf {
        self.dir.join(REPORT_FILE)
    }
}

/// A finished session read back from disk.
#[derive(Debug, Clone)]
pub struct StoredSession {
    pub report: RunReport,
    pub records: Vec<MonthlyRecord>,
}

/// Load a finished session and check that its record log agrees with its
/// report month by month.
pub fn load_session(base_dir: &Path, session_id: &str) -> Result<StoredSession, RuntimeError> {
    let dir = base_dir.join(session_id);
    let report = read_report(&dir.join(REPORT_FILE))?;
    let records = RecordStore::open(&dir.join(RECORD_LOG_FILE))?.load_records()?;

    if records.len() != report.records.len() {
        return Err(RuntimeError::LogLength {
            log: records.len(),
            report: report.records.len(),
        });
    }
    if let Some((logged, _)) = records.iter().zip(&report.records).find(|(a, b)| a != b) {
        return Err(RuntimeError::LogMismatch { month: logged.month });
    }
    Ok(StoredSession { report, records })
}
