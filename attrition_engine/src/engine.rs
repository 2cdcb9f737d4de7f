//! Engine
//!
//! Top-level orchestrator. Owns the population, the vacancy queue, the loss
//! ledger and the random stream. Delegates mutation to `transitions` and
//! validates via `invariants` after every month.

use std::collections::BTreeSet;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;

use crate::config::SimulationConfig;
use crate::domain::{Employee, MonthlyRecord, Vacancy};
use crate::error::{ConfigError, SimulationError};
use crate::events::EventRecord;
use crate::generator::PopulationGenerator;
use crate::invariants::{try_check_employee, try_check_vacancy, validate_invariants, validate_progression};
use crate::state::{create_initial_state, SimulationState};
use crate::transitions;

/// Stateful engine wrapping the phase transitions.
#[derive(Debug, Clone)]
pub struct AttritionEngine {
    config: SimulationConfig,
    state: SimulationState,
    rng: ChaCha8Rng,
    history: Vec<MonthlyRecord>,
    event_log: Vec<EventRecord>,
}

impl AttritionEngine {
    /// Validate the configuration and the population, then take ownership.
    pub fn new(
        config: SimulationConfig,
        population: Vec<Employee>,
        rng: ChaCha8Rng,
    ) -> Result<Self, SimulationError> {
        config.validate()?;

        let mut ids = BTreeSet::new();
        for employee in &population {
            if !ids.insert(employee.id) {
                return Err(SimulationError::DuplicateEmployeeId(employee.id));
            }
            try_check_employee(employee).map_err(|reason| SimulationError::InvalidEmployee {
                employee_id: employee.id,
                reason,
            })?;
        }

        Ok(Self {
            config,
            state: create_initial_state(population, Vec::new()),
            rng,
            history: Vec::new(),
            event_log: Vec::new(),
        })
    }

    /// Same as `new` with a ChaCha8 stream seeded from `seed`.
    pub fn from_seed(
        config: SimulationConfig,
        population: Vec<Employee>,
        seed: u64,
    ) -> Result<Self, SimulationError> {
        Self::new(config, population, ChaCha8Rng::seed_from_u64(seed))
    }

    /// Add already-open vacancies to the queue. They are considered for
    /// hiring from the next step onwards.
    pub fn with_open_vacancies(mut self, vacancies: Vec<Vacancy>) -> Result<Self, SimulationError> {
        for vacancy in &vacancies {
            try_check_vacancy(vacancy).map_err(|reason| SimulationError::InvalidVacancy {
                source_employee_id: vacancy.source_employee_id,
                reason,
            })?;
        }
        self.state.vacancies.extend(vacancies);
        Ok(self)
    }

    /// Advance one month: hiring, attrition, spillover, recording.
    pub fn step(&mut self) -> &MonthlyRecord {
        let outcome = transitions::step(&mut self.state, &self.config, &mut self.rng);

        validate_invariants(&self.state);
        if let Some(previous) = self.history.last() {
            validate_progression(previous, &outcome.record);
        }

        self.event_log.extend(outcome.events);
        let index = self.history.len();
        self.history.push(outcome.record);
        &self.history[index]
    }

    /// Run exactly `months` steps and return the records they produced.
    pub fn run(&mut self, months: u32) -> Result<&[MonthlyRecord], SimulationError> {
        if months == 0 {
            return Err(ConfigError::NonPositiveMonths.into());
        }
        let start = self.history.len();
        info!(
            months,
            from_month = self.state.month,
            employees = self.state.population.len(),
            open_vacancies = self.state.vacancies.len(),
            "simulation started"
        );

        for _ in 0..months {
            self.step();
        }

        if let Some(last) = self.history.last() {
            info!(
                month = last.month,
                urban = last.urban_count,
                rural = last.rural_count,
                hp_overtime_avg = last.hp_overtime_avg,
                cumulative_loss = last.cumulative_loss,
                "simulation finished"
            );
        }
        Ok(&self.history[start..])
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn population(&self) -> &[Employee] {
        &self.state.population
    }

    /// Every record produced so far, in month order.
    pub fn history(&self) -> &[MonthlyRecord] {
        &self.history
    }

    pub fn events(&self) -> &[EventRecord] {
        &self.event_log
    }

    /// Index of the next month to simulate.
    pub fn month(&self) -> u32 {
        self.state.month
    }

    pub fn into_parts(self) -> (SimulationState, Vec<MonthlyRecord>, Vec<EventRecord>) {
        (self.state, self.history, self.event_log)
    }
}

/// Output of a complete generate-then-run pass.
#[derive(Debug, Clone)]
pub struct SimulationRun {
    pub initial_population: Vec<Employee>,
    pub final_state: SimulationState,
    pub records: Vec<MonthlyRecord>,
    pub events: Vec<EventRecord>,
}

/// Generate `employee_count` employees and simulate `months` months.
///
/// A single ChaCha8 stream seeded from `seed` drives generation first and
/// then the engine, so the whole run is reproducible from the seed.
pub fn simulate(
    config: &SimulationConfig,
    employee_count: u32,
    months: u32,
    seed: u64,
) -> Result<SimulationRun, SimulationError> {
    if months == 0 {
        return Err(ConfigError::NonPositiveMonths.into());
    }
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let generator = PopulationGenerator::new(config.clone())?;
    let initial_population = generator.generate(employee_count, &mut rng)?;

    let mut engine = AttritionEngine::new(config.clone(), initial_population.clone(), rng)?;
    engine.run(months)?;
    let (final_state, records, events) = engine.into_parts();

    Ok(SimulationRun {
        initial_population,
        final_state,
        records,
        events,
    })
}
