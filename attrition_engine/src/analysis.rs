//! Read-only analysis over engine output.
//!
//! Nothing here mutates state; these are the series a rendering layer plots.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::SimulationConfig;
use crate::domain::{Branch, Employee, MonthlyRecord};
use crate::transitions::resignation_probability;

/// Overtime level widely treated as the overwork danger line (hours/month).
pub const OVERWORK_THRESHOLD_HOURS: f64 = 80.0;

// ---------------------------------------------------------------------------
// Retention
// ---------------------------------------------------------------------------

/// Headcount of `branch` as a percentage of the first record's headcount.
/// All zeros when the first record has nobody in that branch.
pub fn retention_series(records: &[MonthlyRecord], branch: Branch) -> Vec<f64> {
    let initial = match records.first() {
        Some(r) => r.active_count(branch),
        None => return Vec::new(),
    };
    records
        .iter()
        .map(|r| {
            if initial == 0 {
                0.0
            } else {
                f64::from(r.active_count(branch)) / f64::from(initial) * 100.0
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Overtime indicators
// ---------------------------------------------------------------------------

/// Month and value of the highest high-potential overtime average.
pub fn peak_hp_overtime(records: &[MonthlyRecord]) -> Option<(u32, f64)> {
    records
        .iter()
        .map(|r| (r.month, r.hp_overtime_avg))
        .fold(None, |best, (month, value)| match best {
            Some((_, v)) if v >= value => best,
            _ => Some((month, value)),
        })
}

/// Number of months whose high-potential overtime average exceeds `hours`.
pub fn months_over_threshold(records: &[MonthlyRecord], hours: f64) -> usize {
    records.iter().filter(|r| r.hp_overtime_avg > hours).count()
}

// ---------------------------------------------------------------------------
// Risk matrix
// ---------------------------------------------------------------------------

/// Mean resignation probability of one (branch, job level) cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskCell {
    pub headcount: u32,
    pub mean_probability: f64,
}

/// Attrition risk of active employees keyed by branch and job level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskMatrix {
    pub cells: BTreeMap<Branch, BTreeMap<u8, RiskCell>>,
}

impl RiskMatrix {
    pub fn get(&self, branch: Branch, job_level: u8) -> Option<&RiskCell> {
        self.cells.get(&branch).and_then(|row| row.get(&job_level))
    }
}

/// Current monthly resignation probability averaged per (branch, level).
/// Cells without active employees are omitted.
pub fn risk_matrix(population: &[Employee], config: &SimulationConfig) -> RiskMatrix {
    let mut sums: BTreeMap<(Branch, u8), (u32, f64)> = BTreeMap::new();
    for employee in population.iter().filter(|e| e.is_active()) {
        let p = resignation_probability(employee, &config.attrition);
        let entry = sums.entry((employee.branch, employee.job_level)).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += p;
    }

    let mut matrix = RiskMatrix::default();
    for ((branch, level), (headcount, total)) in sums {
        matrix.cells.entry(branch).or_default().insert(
            level,
            RiskCell {
                headcount,
                mean_probability: total / f64::from(headcount),
            },
        );
    }
    matrix
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EmployeeStatus, Rating};
    use crate::generator::PopulationGenerator;

    fn record(month: u32, hp: f64, urban: u32, rural: u32) -> MonthlyRecord {
        MonthlyRecord {
            month,
            hp_overtime_avg: hp,
            urban_count: urban,
            rural_count: rural,
            cumulative_loss: 0.0,
            cumulative_cash_out: 0.0,
            cumulative_opportunity_loss: 0.0,
            hired: 0,
            resigned: 0,
            open_vacancies: 0,
        }
    }

    #[test]
    fn test_retention_relative_to_first_month() {
        let records = vec![record(0, 20.0, 200, 0), record(1, 25.0, 150, 0)];
        assert_eq!(retention_series(&records, Branch::Urban), vec![100.0, 75.0]);
        assert_eq!(retention_series(&records, Branch::Rural), vec![0.0, 0.0]);
        assert!(retention_series(&[], Branch::Urban).is_empty());
    }

    #[test]
    fn test_peak_and_threshold() {
        let records = vec![record(0, 30.0, 1, 1), record(1, 95.0, 1, 1), record(2, 85.0, 1, 1)];
        assert_eq!(peak_hp_overtime(&records), Some((1, 95.0)));
        assert_eq!(months_over_threshold(&records, OVERWORK_THRESHOLD_HOURS), 2);
        assert_eq!(peak_hp_overtime(&[]), None);
    }

    #[test]
    fn test_risk_matrix_groups_active_employees() {
        let config = SimulationConfig::default();
        let g = PopulationGenerator::new(config.clone()).unwrap();
        let a = g.build_employee(0, 30, 5, 2, Rating::B, Branch::Urban);
        let b = g.build_employee(1, 30, 5, 2, Rating::B, Branch::Urban);
        let mut gone = g.build_employee(2, 50, 20, 4, Rating::C, Branch::Rural);
        gone.status = EmployeeStatus::Resigned;

        let matrix = risk_matrix(&[a.clone(), b, gone], &config);
        let cell = matrix.get(Branch::Urban, 2).unwrap();
        assert_eq!(cell.headcount, 2);
        let expected = resignation_probability(&a, &config.attrition);
        assert!((cell.mean_probability - expected).abs() < 1e-12);
        assert!(matrix.get(Branch::Rural, 4).is_none());
    }
}
