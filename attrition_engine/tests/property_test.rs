/// Property tests: invariants that must hold for any seed, size and lead
/// time combination.

use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use attrition_engine::arithmetic::MIN_OVERTIME_HOURS;
use attrition_engine::config::SimulationConfig;
use attrition_engine::domain::Branch;
use attrition_engine::engine::{simulate, AttritionEngine, SimulationRun};
use attrition_engine::generator::PopulationGenerator;
use attrition_engine::events::SimEvent;
use attrition_engine::transitions::resignation_probability;

fn run(seed: u64, employees: u32, months: u32, urban_lead: u32, rural_lead: u32) -> (SimulationConfig, SimulationRun) {
    let config = SimulationConfig::default()
        .with_lead_time(Branch::Urban, urban_lead)
        .with_lead_time(Branch::Rural, rural_lead);
    let run = simulate(&config, employees, months, seed).unwrap();
    (config, run)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn cumulative_loss_never_decreases(
        seed in any::<u64>(),
        employees in 1u32..150,
        months in 1u32..30,
        urban_lead in 1u32..8,
        rural_lead in 1u32..14,
    ) {
        let (_, run) = run(seed, employees, months, urban_lead, rural_lead);
        prop_assert_eq!(run.records.len(), months as usize);
        for pair in run.records.windows(2) {
            prop_assert!(pair[1].cumulative_loss >= pair[0].cumulative_loss);
            prop_assert!(pair[1].cumulative_cash_out >= pair[0].cumulative_cash_out);
            prop_assert!(pair[1].cumulative_opportunity_loss >= pair[0].cumulative_opportunity_loss);
        }
    }

    #[test]
    fn headcount_only_shrinks_and_matches_resignations(
        seed in any::<u64>(),
        employees in 1u32..150,
        months in 1u32..30,
    ) {
        let (_, run) = run(seed, employees, months, 5, 10);
        let mut previous_total = employees;
        let mut previous_open = 0u32;
        let mut previous_branch = [
            run.initial_population.iter().filter(|e| e.branch == Branch::Urban).count() as u32,
            run.initial_population.iter().filter(|e| e.branch == Branch::Rural).count() as u32,
        ];
        for record in &run.records {
            prop_assert_eq!(previous_total - record.total_active(), record.resigned);
            prop_assert_eq!(previous_open + record.resigned - record.hired, record.open_vacancies);
            prop_assert!(record.urban_count <= previous_branch[0]);
            prop_assert!(record.rural_count <= previous_branch[1]);
            previous_total = record.total_active();
            previous_open = record.open_vacancies;
            previous_branch = [record.urban_count, record.rural_count];
        }
    }

    #[test]
    fn overtime_floor_and_probability_bounds_hold(
        seed in any::<u64>(),
        employees in 1u32..150,
        months in 1u32..30,
    ) {
        let config = SimulationConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let population = PopulationGenerator::new(config.clone()).unwrap().generate(employees, &mut rng).unwrap();
        let mut engine = AttritionEngine::new(config.clone(), population, rng).unwrap();

        for _ in 0..months {
            engine.step();
            for employee in engine.population() {
                prop_assert!(employee.overtime_hours >= MIN_OVERTIME_HOURS);
                if employee.is_active() {
                    let p = resignation_probability(employee, &config.attrition);
                    prop_assert!(p >= 0.0);
                    prop_assert!(p <= config.attrition.max_probability);
                }
            }
        }
        for record in engine.events() {
            if let SimEvent::Resigned { probability, .. } = record.event {
                prop_assert!(probability > 0.0);
                prop_assert!(probability <= config.attrition.max_probability);
            }
        }
    }

    #[test]
    fn vacancies_resolve_exactly_at_lead_time(
        seed in any::<u64>(),
        employees in 20u32..150,
        months in 1u32..30,
        urban_lead in 1u32..8,
        rural_lead in 1u32..14,
    ) {
        let (config, run) = run(seed, employees, months, urban_lead, rural_lead);
        for record in &run.events {
            match record.event {
                SimEvent::VacancyFilled { branch, months_open, .. } => {
                    prop_assert_eq!(months_open, config.lead_time(branch));
                }
                SimEvent::VacancyCarried { branch, months_open, .. } => {
                    prop_assert!(months_open < config.lead_time(branch));
                }
                _ => {}
            }
        }
    }

    #[test]
    fn spillover_pool_is_fully_distributed(
        seed in any::<u64>(),
        employees in 2u32..150,
        months in 1u32..30,
    ) {
        let (_, run) = run(seed, employees, months, 5, 10);
        for record in &run.events {
            if let SimEvent::SpilloverApplied { pool_hours, distributed_hours, recipients, .. } = record.event {
                prop_assert!(recipients > 0);
                prop_assert!((pool_hours - distributed_hours).abs() <= 1e-9 * pool_hours.max(1.0));
            }
        }
    }
}
