//! Core domain types.
//!
//! Pure data plus trivial accessors. All state mutation lives in
//! `transitions`; this module never changes an employee or a vacancy.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ── Rank scale ────────────────────────────────────────────────────

/// Performance rating on the fixed nine-point rank scale.
///
/// Variant order is rank order (best first), so `BTreeMap<Rating, _>`
/// iterates S, A+, A, A-, B+, B, B-, C, D.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rating {
    #[serde(rename = "S")]
    S,
    #[serde(rename = "A+")]
    APlus,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "A-")]
    AMinus,
    #[serde(rename = "B+")]
    BPlus,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "B-")]
    BMinus,
    #[serde(rename = "C")]
    C,
    #[serde(rename = "D")]
    D,
}

impl Rating {
    pub const ALL: [Rating; 9] = [
        Rating::S,
        Rating::APlus,
        Rating::A,
        Rating::AMinus,
        Rating::BPlus,
        Rating::B,
        Rating::BMinus,
        Rating::C,
        Rating::D,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Rating::S => "S",
            Rating::APlus => "A+",
            Rating::A => "A",
            Rating::AMinus => "A-",
            Rating::BPlus => "B+",
            Rating::B => "B",
            Rating::BMinus => "B-",
            Rating::C => "C",
            Rating::D => "D",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Returned when a label is not on the rank scale.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown performance rating {0:?}")]
pub struct UnknownRating(pub String);

impl FromStr for Rating {
    type Err = UnknownRating;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rating::ALL
            .iter()
            .copied()
            .find(|r| r.label() == s)
            .ok_or_else(|| UnknownRating(s.to_string()))
    }
}

/// Coarse rating key used to price a replacement hire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RatingBucket {
    S,
    A,
    B,
    C,
    D,
}

impl fmt::Display for RatingBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RatingBucket::S => "S",
            RatingBucket::A => "A",
            RatingBucket::B => "B",
            RatingBucket::C => "C",
            RatingBucket::D => "D",
        };
        f.write_str(s)
    }
}

// ── Branch ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Branch {
    Urban,
    Rural,
}

impl Branch {
    pub const ALL: [Branch; 2] = [Branch::Urban, Branch::Rural];
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Branch::Urban => f.write_str("Urban"),
            Branch::Rural => f.write_str("Rural"),
        }
    }
}

/// One value per branch. Serialized as `{"Urban": .., "Rural": ..}`;
/// both keys are required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BranchTable<T> {
    #[serde(rename = "Urban")]
    pub urban: T,
    #[serde(rename = "Rural")]
    pub rural: T,
}

impl<T: Copy> BranchTable<T> {
    pub fn new(urban: T, rural: T) -> Self {
        Self { urban, rural }
    }

    pub fn get(&self, branch: Branch) -> T {
        match branch {
            Branch::Urban => self.urban,
            Branch::Rural => self.rural,
        }
    }

    pub fn set(&mut self, branch: Branch, value: T) {
        match branch {
            Branch::Urban => self.urban = value,
            Branch::Rural => self.rural = value,
        }
    }
}

// ── Employee ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmployeeStatus {
    Active,
    /// Terminal. A resigned employee never re-enters the population.
    Resigned,
}

/// A single member of the workforce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Employee {
    pub id: u32,
    pub age: u32,
    pub tenure_years: u32,
    pub job_level: u8, // 1..=5
    pub rating: Rating,
    pub branch: Branch,
    pub current_salary: f64,
    pub compa_ratio: f64,
    pub status: EmployeeStatus,
    pub overtime_hours: f64,
    pub is_high_potential: bool,
}

impl Employee {
    pub fn is_active(&self) -> bool {
        self.status == EmployeeStatus::Active
    }
}

// ── Vacancy ───────────────────────────────────────────────────────

/// An unfilled seat left behind by a resignation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Vacancy {
    pub branch: Branch,
    pub months_open: u32,
    /// Salary of the departing employee, frozen at departure.
    pub reference_salary: f64,
    pub rating_bucket: RatingBucket,
    pub source_employee_id: u32,
    pub opened_month: u32,
}

// ── Loss ledger ───────────────────────────────────────────────────

/// Raw-currency loss accumulators. Each component only ever grows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LossLedger {
    /// Wage inflation paid on replacement hires.
    pub inflation: f64,
    /// Agency fees paid on replacement hires.
    pub agency: f64,
    /// Value lost while seats stay empty.
    pub opportunity: f64,
}

impl LossLedger {
    /// Direct cash out: inflation plus agency fees.
    pub fn cash_out(&self) -> f64 {
        self.inflation + self.agency
    }

    pub fn total(&self) -> f64 {
        self.cash_out() + self.opportunity
    }
}

// ── Monthly record ────────────────────────────────────────────────

/// Immutable per-month output row. The only artifact handed to renderers.
///
/// Loss fields are cumulative and expressed in the configured reporting unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MonthlyRecord {
    pub month: u32,
    pub hp_overtime_avg: f64,
    pub urban_count: u32,
    pub rural_count: u32,
    pub cumulative_loss: f64,
    pub cumulative_cash_out: f64,
    pub cumulative_opportunity_loss: f64,
    pub hired: u32,
    pub resigned: u32,
    pub open_vacancies: u32,
}

impl MonthlyRecord {
    pub fn active_count(&self, branch: Branch) -> u32 {
        match branch {
            Branch::Urban => self.urban_count,
            Branch::Rural => self.rural_count,
        }
    }

    pub fn total_active(&self) -> u32 {
        self.urban_count + self.rural_count
    }
}
