//! Step events.
//!
//! Events are pure data emitted by the phase transitions. They describe what
//! happened inside a month and never feed back into the simulation.

use serde::{Deserialize, Serialize};

use crate::domain::{Branch, RatingBucket};

/// Something that happened during one month's step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SimEvent {
    /// Phase 1: a vacancy reached its lead time and was backfilled.
    VacancyFilled {
        branch: Branch,
        source_employee_id: u32,
        /// Months-open count at the start of the month.
        months_open: u32,
        rating_bucket: RatingBucket,
        old_salary: f64,
        new_salary: f64,
        inflation_cost: f64,
        agency_cost: f64,
    },
    /// Phase 1: a vacancy stayed open and accrued opportunity loss.
    VacancyCarried {
        branch: Branch,
        source_employee_id: u32,
        /// Months-open count at the start of the month, before the increment.
        months_open: u32,
        opportunity_cost: f64,
    },
    /// Phase 2: an active employee resigned.
    Resigned {
        employee_id: u32,
        branch: Branch,
        probability: f64,
        spillover_hours: f64,
    },
    /// Phase 3: the month's spillover pool was redistributed.
    SpilloverApplied {
        pool_hours: f64,
        recipients: u32,
        /// Sum of the overtime added before relief.
        distributed_hours: f64,
        /// Overtime subtracted from each recipient (before the floor).
        relief_per_head: f64,
    },
}

/// An event tagged with the month it happened in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub month: u32,
    pub event: SimEvent,
}

impl EventRecord {
    pub fn new(month: u32, event: SimEvent) -> Self {
        Self { month, event }
    }
}
