//! Error taxonomy for the kernel.
//!
//! Configuration problems and malformed inputs are reported before any month
//! executes. Nothing in here is raised mid-run: lookup misses fall back to
//! configured defaults and degenerate months are skipped.

use thiserror::Error;

use crate::domain::{Branch, Rating, RatingBucket};

/// Rejected configuration bundle or run parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("malformed configuration: {0}")]
    Parse(String),

    #[error("recruiting lead time for the {branch} branch must be at least one month")]
    NonPositiveLeadTime { branch: Branch },

    #[error("employee count must be positive")]
    NonPositiveEmployeeCount,

    #[error("month count must be positive")]
    NonPositiveMonths,

    #[error("rating distribution is empty")]
    EmptyRatingDistribution,

    #[error("probability {value} for rating {rating} is not in [0, 1]")]
    InvalidProbability { rating: Rating, value: f64 },

    #[error("rating distribution sums to {sum}, expected 1.0")]
    DistributionNotNormalized { sum: f64 },

    #[error("rating {0} is drawn by the generator but has no rank parameters")]
    MissingRankParams(Rating),

    #[error("rating bucket {0} is referenced but has no replacement premium")]
    MissingPremium(RatingBucket),

    #[error("no market base salary for job level {0}")]
    MissingMarketBase(u8),

    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    #[error("{field} = {value} is outside [{lo}, {hi}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        lo: f64,
        hi: f64,
    },

    #[error("age range [{min}, {max}) is empty")]
    InvalidAgeRange { min: u32, max: u32 },
}

/// Failure to construct an engine from a configuration and a population.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("duplicate employee id {0}")]
    DuplicateEmployeeId(u32),

    #[error("employee {employee_id} is invalid: {reason}")]
    InvalidEmployee { employee_id: u32, reason: String },

    #[error("vacancy left by employee {source_employee_id} is invalid: {reason}")]
    InvalidVacancy {
        source_employee_id: u32,
        reason: String,
    },
}
