//! Monthly phase transitions.
//!
//! ALL state-mutation logic lives here. A step runs four phases in a fixed
//! order: hiring, attrition, spillover, recording. Hiring only sees vacancies
//! opened in earlier months; relief in phase 3 uses this month's hires.

use rand::Rng;
use tracing::debug;

use crate::arithmetic::{clamp, floor_at, mean_or_zero, monthly, to_reporting_unit, MIN_OVERTIME_HOURS};
use crate::config::{AttritionWeights, SimulationConfig};
use crate::domain::{Branch, Employee, EmployeeStatus, MonthlyRecord, Vacancy};
use crate::events::{EventRecord, SimEvent};
use crate::state::SimulationState;

/// Everything one step produced.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub record: MonthlyRecord,
    pub events: Vec<EventRecord>,
}

// ---------------------------------------------------------------------------
// Public entry points
// ---------------------------------------------------------------------------

/// Advance `state` by one month and return the month's record and events.
pub fn step(state: &mut SimulationState, config: &SimulationConfig, rng: &mut impl Rng) -> StepOutcome {
    let month = state.month;
    let mut events = Vec::new();

    let hired = apply_hiring(state, config, &mut events);
    let (resigned, pool) = apply_attrition(state, config, rng, &mut events);
    apply_spillover(state, config, pool, hired, &mut events);
    let record = record_month(state, config, hired, resigned);

    debug!(
        month,
        hired,
        resigned,
        spillover_hours = pool,
        open_vacancies = record.open_vacancies,
        cumulative_loss = record.cumulative_loss,
        "month advanced"
    );

    state.month += 1;
    StepOutcome {
        record,
        events: events
            .into_iter()
            .map(|e| EventRecord::new(month, e))
            .collect(),
    }
}

/// Monthly resignation probability of one employee.
///
/// `clamp(0, max, fw * max(0, threshold - compa) + ww * (ot / ref) * sens - offset)`
pub fn resignation_probability(employee: &Employee, weights: &AttritionWeights) -> f64 {
    let risk_financial = (weights.compa_threshold - employee.compa_ratio).max(0.0);
    let sensitivity = if employee.is_high_potential {
        weights.hp_sensitivity
    } else {
        weights.base_sensitivity
    };
    let risk_workload = employee.overtime_hours / weights.overtime_reference_hours * sensitivity;
    let raw = weights.financial_weight * risk_financial + weights.workload_weight * risk_workload;
    clamp(raw - weights.baseline_offset, 0.0, weights.max_probability)
}

// ---------------------------------------------------------------------------
// Phases (private)
// ---------------------------------------------------------------------------

/// Phase 1. Fill vacancies whose lead time has elapsed, charge the rest
/// opportunity loss. Returns the number of hires.
fn apply_hiring(state: &mut SimulationState, config: &SimulationConfig, events: &mut Vec<SimEvent>) -> u32 {
    let mut hired = 0;
    let open = std::mem::take(&mut state.vacancies);
    let mut still_open = Vec::with_capacity(open.len());

    for mut vacancy in open {
        if vacancy.months_open >= config.lead_time(vacancy.branch) {
            let old_salary = vacancy.reference_salary;
            let new_salary = old_salary * config.premium_for(vacancy.rating_bucket);
            let inflation_cost = new_salary - old_salary;
            let agency_cost = new_salary * config.hiring_fee_rate;

            state.ledger.inflation += inflation_cost;
            state.ledger.agency += agency_cost;
            hired += 1;

            events.push(SimEvent::VacancyFilled {
                branch: vacancy.branch,
                source_employee_id: vacancy.source_employee_id,
                months_open: vacancy.months_open,
                rating_bucket: vacancy.rating_bucket,
                old_salary,
                new_salary,
                inflation_cost,
                agency_cost,
            });
        } else {
            let opportunity_cost = monthly(vacancy.reference_salary) * config.opportunity_multiplier;
            state.ledger.opportunity += opportunity_cost;

            events.push(SimEvent::VacancyCarried {
                branch: vacancy.branch,
                source_employee_id: vacancy.source_employee_id,
                months_open: vacancy.months_open,
                opportunity_cost,
            });

            vacancy.months_open += 1;
            still_open.push(vacancy);
        }
    }

    state.vacancies = still_open;
    hired
}

/// Phase 2. One Bernoulli draw per active employee, in population order.
/// Returns (resignations, spillover pool in hours).
fn apply_attrition(
    state: &mut SimulationState,
    config: &SimulationConfig,
    rng: &mut impl Rng,
    events: &mut Vec<SimEvent>,
) -> (u32, f64) {
    let month = state.month;
    let mut resigned = 0;
    let mut pool = 0.0;
    let mut opened = Vec::new();

    for employee in state.population.iter_mut().filter(|e| e.is_active()) {
        let probability = resignation_probability(employee, &config.attrition);
        let draw: f64 = rng.gen();
        if draw >= probability {
            continue;
        }

        employee.status = EmployeeStatus::Resigned;
        let spillover_hours = (config.base_work_hours + employee.overtime_hours) * config.spillover_rate;
        pool += spillover_hours;
        resigned += 1;

        opened.push(Vacancy {
            branch: employee.branch,
            months_open: 0,
            reference_salary: employee.current_salary,
            rating_bucket: config.bucket_for(employee.rating),
            source_employee_id: employee.id,
            opened_month: month,
        });
        events.push(SimEvent::Resigned {
            employee_id: employee.id,
            branch: employee.branch,
            probability,
            spillover_hours,
        });
    }

    state.vacancies.extend(opened);
    (resigned, pool)
}

/// Phase 3. Spread the pool over active employees by absorption, then apply
/// hiring relief with the overtime floor. No-op without a pool or survivors.
fn apply_spillover(
    state: &mut SimulationState,
    config: &SimulationConfig,
    pool: f64,
    hired: u32,
    events: &mut Vec<SimEvent>,
) {
    let active = state.active_count();
    if active == 0 || pool <= 0.0 {
        return;
    }

    let total_absorption: f64 = state
        .active()
        .map(|e| config.rank(e.rating).absorption)
        .sum();

    let mut distributed_hours = 0.0;
    for employee in state.population.iter_mut().filter(|e| e.is_active()) {
        let share = config.rank(employee.rating).absorption / total_absorption * pool;
        employee.overtime_hours += share;
        distributed_hours += share;
    }

    let relief_per_head = if hired > 0 {
        f64::from(hired) * config.relief_hours_per_hire / active as f64
    } else {
        0.0
    };
    if hired > 0 {
        for employee in state.population.iter_mut().filter(|e| e.is_active()) {
            employee.overtime_hours = floor_at(employee.overtime_hours - relief_per_head, MIN_OVERTIME_HOURS);
        }
    }

    events.push(SimEvent::SpilloverApplied {
        pool_hours: pool,
        recipients: active as u32,
        distributed_hours,
        relief_per_head,
    });
}

/// Phase 4. Snapshot the month into an immutable record.
fn record_month(state: &SimulationState, config: &SimulationConfig, hired: u32, resigned: u32) -> MonthlyRecord {
    let hp_overtime_avg = mean_or_zero(
        state
            .active()
            .filter(|e| e.is_high_potential)
            .map(|e| e.overtime_hours),
    );
    let unit = config.reporting_unit;

    MonthlyRecord {
        month: state.month,
        hp_overtime_avg,
        urban_count: state.active_in(Branch::Urban) as u32,
        rural_count: state.active_in(Branch::Rural) as u32,
        cumulative_loss: to_reporting_unit(state.accumulated_loss(), unit),
        cumulative_cash_out: to_reporting_unit(state.ledger.cash_out(), unit),
        cumulative_opportunity_loss: to_reporting_unit(state.ledger.opportunity, unit),
        hired,
        resigned,
        open_vacancies: state.vacancies.len() as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Rating, RatingBucket};
    use crate::state::create_initial_state;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn employee(id: u32, rating: Rating, branch: Branch, compa_ratio: f64, overtime: f64) -> Employee {
        let config = SimulationConfig::default();
        Employee {
            id,
            age: 35,
            tenure_years: 10,
            job_level: 3,
            rating,
            branch,
            current_salary: 6_000_000.0,
            compa_ratio,
            status: EmployeeStatus::Active,
            overtime_hours: overtime,
            is_high_potential: config.is_high_potential(rating),
        }
    }

    fn vacancy(branch: Branch, months_open: u32, salary: f64) -> Vacancy {
        Vacancy {
            branch,
            months_open,
            reference_salary: salary,
            rating_bucket: RatingBucket::A,
            source_employee_id: 900,
            opened_month: 0,
        }
    }

    #[test]
    fn test_probability_reference_scenario() {
        let e = employee(0, Rating::B, Branch::Urban, 1.0, 20.0);
        let p = resignation_probability(&e, &AttritionWeights::default());
        assert!((p - 0.13).abs() < 1e-12, "p = {p}");
    }

    #[test]
    fn test_probability_high_potential_is_more_sensitive() {
        let weights = AttritionWeights::default();
        let hp = employee(0, Rating::S, Branch::Urban, 1.3, 60.0);
        let regular = employee(1, Rating::B, Branch::Urban, 1.3, 60.0);
        // 0.6 * 0.75 * 1.5 - 0.1 = 0.575 -> capped; 0.6 * 0.75 - 0.1 = 0.35
        assert_eq!(resignation_probability(&hp, &weights), 0.35);
        assert!((resignation_probability(&regular, &weights) - 0.35).abs() < 1e-12);
        let calm = employee(2, Rating::B, Branch::Urban, 1.5, 20.0);
        // 0.6 * 0.25 - 0.1 = 0.05
        assert!((resignation_probability(&calm, &weights) - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_probability_never_negative() {
        let mut weights = AttritionWeights::default();
        weights.baseline_offset = 0.5;
        let e = employee(0, Rating::D, Branch::Rural, 2.0, 20.0);
        assert_eq!(resignation_probability(&e, &weights), 0.0);
    }

    #[test]
    fn test_hiring_resolves_only_at_lead_time() {
        let config = SimulationConfig::default();
        let mut state = create_initial_state(
            Vec::new(),
            vec![vacancy(Branch::Urban, 4, 1_200_000.0), vacancy(Branch::Urban, 5, 1_200_000.0)],
        );
        let mut events = Vec::new();
        let hired = apply_hiring(&mut state, &config, &mut events);

        assert_eq!(hired, 1);
        assert_eq!(state.vacancies.len(), 1);
        assert_eq!(state.vacancies[0].months_open, 5);
        // opportunity: 1.2M / 12 * 1.5
        assert!((state.ledger.opportunity - 150_000.0).abs() < 1e-6);
        // inflation: 1.2M * 0.25; agency: 1.5M * 0.35
        assert!((state.ledger.inflation - 300_000.0).abs() < 1e-6);
        assert!((state.ledger.agency - 525_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_resignation_opens_vacancy_with_bucket_and_frozen_salary() {
        let mut config = SimulationConfig::default();
        config.attrition.max_probability = 1.0;
        config.attrition.baseline_offset = -1.0;
        let mut state = create_initial_state(vec![employee(4, Rating::APlus, Branch::Rural, 1.0, 30.0)], Vec::new());
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut events = Vec::new();

        let (resigned, pool) = apply_attrition(&mut state, &config, &mut rng, &mut events);

        assert_eq!(resigned, 1);
        assert!((pool - (160.0 + 30.0) * 0.7).abs() < 1e-9);
        assert_eq!(state.population[0].status, EmployeeStatus::Resigned);
        let v = &state.vacancies[0];
        assert_eq!(v.branch, Branch::Rural);
        assert_eq!(v.months_open, 0);
        assert_eq!(v.reference_salary, 6_000_000.0);
        assert_eq!(v.rating_bucket, RatingBucket::B);
        assert_eq!(v.source_employee_id, 4);
    }

    #[test]
    fn test_spillover_conserves_pool_and_weights_by_absorption() {
        let config = SimulationConfig::default();
        let mut state = create_initial_state(
            vec![
                employee(0, Rating::S, Branch::Urban, 1.2, 20.0),
                employee(1, Rating::D, Branch::Urban, 1.2, 20.0),
            ],
            Vec::new(),
        );
        let mut events = Vec::new();
        apply_spillover(&mut state, &config, 210.0, 0, &mut events);

        // absorption 1.6 vs 0.5 -> 160 and 50 hours
        assert!((state.population[0].overtime_hours - 180.0).abs() < 1e-9);
        assert!((state.population[1].overtime_hours - 70.0).abs() < 1e-9);
        match &events[0] {
            SimEvent::SpilloverApplied {
                distributed_hours, ..
            } => assert!((distributed_hours - 210.0).abs() < 1e-9),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_relief_respects_overtime_floor() {
        let config = SimulationConfig::default();
        let mut state = create_initial_state(
            vec![
                employee(0, Rating::B, Branch::Urban, 1.2, 20.0),
                employee(1, Rating::B, Branch::Urban, 1.2, 200.0),
            ],
            Vec::new(),
        );
        let mut events = Vec::new();
        // pool 20 -> +10 each; relief 3 * 120 / 2 = 180 each
        apply_spillover(&mut state, &config, 20.0, 3, &mut events);

        assert_eq!(state.population[0].overtime_hours, MIN_OVERTIME_HOURS);
        assert!((state.population[1].overtime_hours - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_spillover_skipped_without_active_employees() {
        let config = SimulationConfig::default();
        let mut resigned = employee(0, Rating::B, Branch::Urban, 1.2, 40.0);
        resigned.status = EmployeeStatus::Resigned;
        let mut state = create_initial_state(vec![resigned.clone()], Vec::new());
        let mut events = Vec::new();

        apply_spillover(&mut state, &config, 100.0, 2, &mut events);

        assert_eq!(state.population[0], resigned);
        assert!(events.is_empty());
    }

    #[test]
    fn test_spillover_skipped_without_pool_even_with_hires() {
        let config = SimulationConfig::default();
        let mut state = create_initial_state(vec![employee(0, Rating::B, Branch::Urban, 1.2, 90.0)], Vec::new());
        let mut events = Vec::new();

        apply_spillover(&mut state, &config, 0.0, 4, &mut events);

        assert_eq!(state.population[0].overtime_hours, 90.0);
        assert!(events.is_empty());
    }

    #[test]
    fn test_record_reports_zero_hp_average_without_hp() {
        let config = SimulationConfig::default();
        let state = create_initial_state(vec![employee(0, Rating::C, Branch::Rural, 1.2, 45.0)], Vec::new());
        let record = record_month(&state, &config, 0, 0);
        assert_eq!(record.hp_overtime_avg, 0.0);
        assert_eq!(record.rural_count, 1);
        assert_eq!(record.urban_count, 0);
    }

    #[test]
    fn test_step_advances_month_and_tags_events() {
        let config = SimulationConfig::default();
        let mut state = create_initial_state(Vec::new(), vec![vacancy(Branch::Rural, 0, 600_000.0)]);
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let first = step(&mut state, &config, &mut rng);
        let second = step(&mut state, &config, &mut rng);

        assert_eq!(first.record.month, 0);
        assert_eq!(second.record.month, 1);
        assert_eq!(state.month, 2);
        assert_eq!(second.events[0].month, 1);
        assert!(second.record.cumulative_loss > first.record.cumulative_loss);
    }

    #[test]
    fn test_record_reports_accumulated_loss_in_reporting_units() {
        let config = SimulationConfig::default();
        let mut state = create_initial_state(vec![employee(0, Rating::S, Branch::Urban, 1.0, 35.0)], Vec::new());
        state.ledger.inflation = 900_000.0;
        state.ledger.agency = 2_415_000.0;
        state.ledger.opportunity = 7_500_000.0;

        let record = record_month(&state, &config, 1, 0);
        assert!((state.accumulated_loss() - 10_815_000.0).abs() < 1e-6);
        assert!((record.cumulative_loss - state.accumulated_loss() / config.reporting_unit).abs() < 1e-12);
        assert!((record.cumulative_cash_out - 3.315).abs() < 1e-9);
        assert_eq!(record.hp_overtime_avg, 35.0);
        assert_eq!(record.urban_count, 1);
    }
}
