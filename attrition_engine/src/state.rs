//! Simulation state construction.

use crate::domain::{Branch, Employee, LossLedger, Vacancy};

/// Everything the engine mutates from one month to the next.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationState {
    pub population: Vec<Employee>,
    pub vacancies: Vec<Vacancy>,
    pub ledger: LossLedger,
    /// Index of the next month to simulate.
    pub month: u32,
}

/// Fresh state at month 0 with an empty ledger.
pub fn create_initial_state(population: Vec<Employee>, vacancies: Vec<Vacancy>) -> SimulationState {
    SimulationState {
        population,
        vacancies,
        ledger: LossLedger::default(),
        month: 0,
    }
}

impl SimulationState {
    /// Raw-currency loss accumulated so far.
    pub fn accumulated_loss(&self) -> f64 {
        self.ledger.total()
    }

    pub fn active(&self) -> impl Iterator<Item = &Employee> {
        self.population.iter().filter(|e| e.is_active())
    }

    pub fn active_count(&self) -> usize {
        self.active().count()
    }

    pub fn active_in(&self, branch: Branch) -> usize {
        self.active().filter(|e| e.branch == branch).count()
    }
}
