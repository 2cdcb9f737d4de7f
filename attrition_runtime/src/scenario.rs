//! Lead-time sensitivity sweep.
//!
//! Re-runs one set of run parameters with a single branch's recruiting lead
//! time shifted by each delta and reports the final cumulative loss against
//! the unshifted base. Every point shares the base seed, so the population
//! and the first draws are identical across points.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use attrition_engine::domain::Branch;

use crate::error::RuntimeError;
use crate::run::RunParams;

/// Months added to the configured lead time at each sweep point.
pub const DEFAULT_LEAD_DELTAS: [i32; 6] = [-2, -1, 0, 1, 2, 3];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityPoint {
    pub branch: Branch,
    pub delta_months: i32,
    pub lead_time: u32,
    pub final_loss: f64,
    /// `final_loss` minus the base run's final loss.
    pub loss_delta: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityReport {
    pub base_final_loss: f64,
    pub points: Vec<SensitivityPoint>,
}

impl SensitivityReport {
    pub fn points_for(&self, branch: Branch) -> impl Iterator<Item = &SensitivityPoint> {
        self.points.iter().filter(move |p| p.branch == branch)
    }
}

fn run_final_loss(params: &RunParams) -> Result<f64, RuntimeError> {
    let run = params.simulate()?;
    Ok(run.records.last().map_or(0.0, |r| r.cumulative_loss))
}

/// Sweep `deltas` over both branches. Points whose lead time would fall
/// below one month are skipped.
pub fn lead_time_sensitivity(params: &RunParams, deltas: &[i32]) -> Result<SensitivityReport, RuntimeError> {
    let base_final_loss = run_final_loss(params)?;
    info!(base_final_loss, points = deltas.len() * Branch::ALL.len(), "sensitivity sweep started");

    let mut points = Vec::new();
    for branch in Branch::ALL {
        let base_lead = params.config.lead_time(branch);
        for &delta in deltas {
            let shifted = i64::from(base_lead) + i64::from(delta);
            if shifted < 1 {
                warn!(%branch, delta, base_lead, "lead time below one month, point skipped");
                continue;
            }
            let lead_time = shifted as u32;

            let final_loss = if delta == 0 {
                base_final_loss
            } else {
                let shifted_params = params
                    .clone()
                    .with_config(params.config.clone().with_lead_time(branch, lead_time));
                run_final_loss(&shifted_params)?
            };

            points.push(SensitivityPoint {
                branch,
                delta_months: delta,
                lead_time,
                final_loss,
                loss_delta: final_loss - base_final_loss,
            });
        }
    }

    Ok(SensitivityReport {
        base_final_loss,
        points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> RunParams {
        RunParams {
            employee_count: 150,
            months: 12,
            ..RunParams::default()
        }
    }

    #[test]
    fn test_zero_delta_equals_plain_run() {
        let params = params();
        let report = lead_time_sensitivity(&params, &[0]).unwrap();
        let plain = params.simulate().unwrap();
        let plain_loss = plain.records.last().unwrap().cumulative_loss;

        assert_eq!(report.base_final_loss, plain_loss);
        for point in &report.points {
            assert_eq!(point.final_loss, plain_loss);
            assert_eq!(point.loss_delta, 0.0);
        }
    }

    #[test]
    fn test_points_below_one_month_are_skipped() {
        let mut params = params();
        params.config = params.config.with_lead_time(Branch::Urban, 2);
        let report = lead_time_sensitivity(&params, &DEFAULT_LEAD_DELTAS).unwrap();

        let urban: Vec<i32> = report.points_for(Branch::Urban).map(|p| p.delta_months).collect();
        assert_eq!(urban, vec![-1, 0, 1, 2, 3]);
        assert_eq!(report.points_for(Branch::Rural).count(), DEFAULT_LEAD_DELTAS.len());
    }

    #[test]
    fn test_lead_times_follow_deltas() {
        let report = lead_time_sensitivity(&params(), &DEFAULT_LEAD_DELTAS).unwrap();
        let rural: Vec<u32> = report.points_for(Branch::Rural).map(|p| p.lead_time).collect();
        assert_eq!(rural, vec![8, 9, 10, 11, 12, 13]);
    }
}
