//! Invariant checks.
//!
//! `validate_*` functions panic: after a step, a violation means the kernel
//! itself is broken. The `try_*` variants return the message instead and are
//! used to vet externally supplied populations and vacancy queues.

use std::collections::BTreeSet;

use crate::arithmetic::{is_positive, MIN_OVERTIME_HOURS};
use crate::domain::{Branch, Employee, MonthlyRecord, Vacancy};
use crate::state::SimulationState;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run every state check. Panics on the first failure.
pub fn validate_invariants(state: &SimulationState) {
    if let Err(msg) = try_validate_invariants(state) {
        panic!("Invariant violation: {}", msg);
    }
}

/// Non-panicking variant of `validate_invariants`.
pub fn try_validate_invariants(state: &SimulationState) -> Result<(), String> {
    try_check_unique_ids(&state.population)?;
    for employee in &state.population {
        try_check_employee(employee)?;
    }
    for vacancy in &state.vacancies {
        try_check_vacancy(vacancy)?;
    }
    try_check_ledger(state)?;
    Ok(())
}

/// Check that `current` may follow `previous`. Panics on failure.
pub fn validate_progression(previous: &MonthlyRecord, current: &MonthlyRecord) {
    if let Err(msg) = try_validate_progression(previous, current) {
        panic!("Invariant violation: {}", msg);
    }
}

/// Non-panicking variant of `validate_progression`.
pub fn try_validate_progression(previous: &MonthlyRecord, current: &MonthlyRecord) -> Result<(), String> {
    if current.month != previous.month + 1 {
        return Err(format!(
            "[INVARIANT:consecutive_months] month {} follows month {}",
            current.month, previous.month
        ));
    }
    if current.cumulative_loss < previous.cumulative_loss {
        return Err(format!(
            "[INVARIANT:monotonic_loss] cumulative loss fell from {} to {} at month {}",
            previous.cumulative_loss, current.cumulative_loss, current.month
        ));
    }
    for branch in Branch::ALL {
        let before = previous.active_count(branch);
        let after = current.active_count(branch);
        if after > before {
            return Err(format!(
                "[INVARIANT:headcount_non_increasing] {} headcount grew from {} to {} at month {}",
                branch, before, after, current.month
            ));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Individual checks
// ---------------------------------------------------------------------------

/// Employee IDs must be unique across the population.
pub fn try_check_unique_ids(population: &[Employee]) -> Result<(), String> {
    let mut seen = BTreeSet::new();
    for employee in population {
        if !seen.insert(employee.id) {
            return Err(format!("[INVARIANT:duplicate_employee_id] employee id {} appears twice", employee.id));
        }
    }
    Ok(())
}

/// Field-level checks for a single employee record.
pub fn try_check_employee(employee: &Employee) -> Result<(), String> {
    if !(1..=5).contains(&employee.job_level) {
        return Err(format!(
            "[INVARIANT:job_level_range] employee {} has job level {}",
            employee.id, employee.job_level
        ));
    }
    if !is_positive(employee.current_salary) {
        return Err(format!(
            "[INVARIANT:positive_salary] employee {} has salary {}",
            employee.id, employee.current_salary
        ));
    }
    if !is_positive(employee.compa_ratio) {
        return Err(format!(
            "[INVARIANT:positive_compa_ratio] employee {} has compa-ratio {}",
            employee.id, employee.compa_ratio
        ));
    }
    if !employee.overtime_hours.is_finite() || employee.overtime_hours < MIN_OVERTIME_HOURS {
        return Err(format!(
            "[INVARIANT:overtime_floor] employee {} has {} overtime hours",
            employee.id, employee.overtime_hours
        ));
    }
    Ok(())
}

/// A vacancy must carry a positive frozen salary.
pub fn try_check_vacancy(vacancy: &Vacancy) -> Result<(), String> {
    if !is_positive(vacancy.reference_salary) {
        return Err(format!(
            "[INVARIANT:positive_reference_salary] vacancy left by {} has salary {}",
            vacancy.source_employee_id, vacancy.reference_salary
        ));
    }
    Ok(())
}

fn try_check_ledger(state: &SimulationState) -> Result<(), String> {
    let l = &state.ledger;
    for (name, value) in [
        ("inflation", l.inflation),
        ("agency", l.agency),
        ("opportunity", l.opportunity),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(format!("[INVARIANT:ledger_non_negative] {} loss is {}", name, value));
        }
    }
    Ok(())
}
