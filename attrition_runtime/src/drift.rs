//! Drift detection: determinism verification and history comparison.

use serde::{Deserialize, Serialize};
use tracing::info;

use attrition_engine::analysis::peak_hp_overtime;
use attrition_engine::domain::MonthlyRecord;

use crate::error::RuntimeError;
use crate::replay;
use crate::run::RunParams;

/// Run the same parameters twice and require identical history hashes.
/// Returns the agreed hash.
pub fn verify_determinism(params: &RunParams) -> Result<String, RuntimeError> {
    let first = replay::rebuild_hash(params)?;
    let second = replay::rebuild_hash(params)?;

    if first != second {
        return Err(RuntimeError::Determinism { first, second });
    }
    info!(hash = %first, "determinism verified");
    Ok(first)
}

/// Structured comparison of two record histories, `b` relative to `a`.
pub fn compare_histories(a: &[MonthlyRecord], b: &[MonthlyRecord]) -> DriftReport {
    let last_a = a.last();
    let last_b = b.last();

    let loss_a = last_a.map_or(0.0, |r| r.cumulative_loss);
    let loss_b = last_b.map_or(0.0, |r| r.cumulative_loss);
    let urban_a = last_a.map_or(0, |r| i64::from(r.urban_count));
    let urban_b = last_b.map_or(0, |r| i64::from(r.urban_count));
    let rural_a = last_a.map_or(0, |r| i64::from(r.rural_count));
    let rural_b = last_b.map_or(0, |r| i64::from(r.rural_count));
    let hp_a = last_a.map_or(0.0, |r| r.hp_overtime_avg);
    let hp_b = last_b.map_or(0.0, |r| r.hp_overtime_avg);
    let peak_a = peak_hp_overtime(a).map_or(0.0, |(_, v)| v);
    let peak_b = peak_hp_overtime(b).map_or(0.0, |(_, v)| v);

    // Records are compared field by field; any difference counts.
    let first_divergent_month = a
        .iter()
        .zip(b)
        .find(|(x, y)| x != y)
        .map(|(x, _)| x.month)
        .or_else(|| {
            if a.len() != b.len() {
                Some(a.len().min(b.len()) as u32)
            } else {
                None
            }
        });

    DriftReport {
        months_a: a.len(),
        months_b: b.len(),
        final_loss_a: loss_a,
        final_loss_b: loss_b,
        final_loss_delta: loss_b - loss_a,
        urban_headcount_a: urban_a,
        urban_headcount_b: urban_b,
        urban_headcount_delta: urban_b - urban_a,
        rural_headcount_a: rural_a,
        rural_headcount_b: rural_b,
        rural_headcount_delta: rural_b - rural_a,
        final_hp_overtime_a: hp_a,
        final_hp_overtime_b: hp_b,
        final_hp_overtime_delta: hp_b - hp_a,
        peak_hp_overtime_a: peak_a,
        peak_hp_overtime_b: peak_b,
        first_divergent_month,
    }
}

/// Structured drift report. Loss values are in the reporting unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftReport {
    pub months_a: usize,
    pub months_b: usize,
    pub final_loss_a: f64,
    pub final_loss_b: f64,
    pub final_loss_delta: f64,
    pub urban_headcount_a: i64,
    pub urban_headcount_b: i64,
    pub urban_headcount_delta: i64,
    pub rural_headcount_a: i64,
    pub rural_headcount_b: i64,
    pub rural_headcount_delta: i64,
    pub final_hp_overtime_a: f64,
    pub final_hp_overtime_b: f64,
    pub final_hp_overtime_delta: f64,
    pub peak_hp_overtime_a: f64,
    pub peak_hp_overtime_b: f64,
    /// First month whose records differ, or where one history ends early.
    pub first_divergent_month: Option<u32>,
}

impl DriftReport {
    pub fn is_identical(&self) -> bool {
        self.first_divergent_month.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(month: u32, loss: f64, urban: u32, rural: u32) -> MonthlyRecord {
        MonthlyRecord {
            month,
            hp_overtime_avg: 30.0,
            urban_count: urban,
            rural_count: rural,
            cumulative_loss: loss,
            cumulative_cash_out: 0.0,
            cumulative_opportunity_loss: loss,
            hired: 0,
            resigned: 0,
            open_vacancies: 0,
        }
    }

    #[test]
    fn test_identical_histories() {
        let h = vec![record(0, 1.0, 10, 5), record(1, 2.0, 9, 5)];
        let report = compare_histories(&h, &h);
        assert!(report.is_identical());
        assert_eq!(report.final_loss_delta, 0.0);
    }

    #[test]
    fn test_divergence_is_located() {
        let a = vec![record(0, 1.0, 10, 5), record(1, 2.0, 9, 5), record(2, 3.0, 9, 4)];
        let b = vec![record(0, 1.0, 10, 5), record(1, 2.5, 8, 5), record(2, 4.0, 7, 4)];
        let report = compare_histories(&a, &b);
        assert_eq!(report.first_divergent_month, Some(1));
        assert_eq!(report.final_loss_delta, 1.0);
        assert_eq!(report.urban_headcount_delta, -2);
        assert_eq!(report.rural_headcount_delta, 0);
    }

    #[test]
    fn test_shorter_history_diverges_where_it_ends() {
        let a = vec![record(0, 1.0, 10, 5), record(1, 2.0, 9, 5)];
        let b = vec![record(0, 1.0, 10, 5)];
        assert_eq!(compare_histories(&a, &b).first_divergent_month, Some(1));
    }

    #[test]
    fn test_verify_determinism_returns_hash() {
        let params = RunParams {
            employee_count: 80,
            months: 8,
            ..RunParams::default()
        };
        let hash = verify_determinism(&params).unwrap();
        assert_eq!(hash, replay::rebuild_hash(&params).unwrap());
    }
}
