//! Simulation configuration bundle.
//!
//! One immutable value passed to both the generator and the engine. Every
//! field has a default; a JSON document may override any subset of them.
//! Validation is eager: `validate` must pass before any month executes.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::arithmetic::{is_positive, MIN_OVERTIME_HOURS, PROBABILITY_SUM_TOLERANCE};
use crate::domain::{Branch, BranchTable, Rating, RatingBucket};
use crate::error::ConfigError;

/// Per-rank behaviour constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RankParams {
    /// Share of spilled-over workload this rank absorbs relative to peers.
    pub absorption: f64,
    /// Market value multiplier applied to the market base salary.
    pub perf_mult: f64,
}

impl RankParams {
    pub const fn new(absorption: f64, perf_mult: f64) -> Self {
        Self {
            absorption,
            perf_mult,
        }
    }
}

/// Internal salary formula, in pre-unit scale:
/// `base + age_coeff*age + tenure_coeff*tenure + level_coeff*level`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SalaryFormula {
    pub base: f64,
    pub age_coeff: f64,
    pub tenure_coeff: f64,
    pub level_coeff: f64,
    /// Monetary unit multiplier turning the formula into currency.
    pub unit: f64,
}

impl Default for SalaryFormula {
    fn default() -> Self {
        Self {
            base: 300.0,
            age_coeff: 6.0,
            tenure_coeff: 4.0,
            level_coeff: 40.0,
            unit: 10_000.0,
        }
    }
}

impl SalaryFormula {
    /// Internal salary before the unit multiplier.
    pub fn internal(&self, age: u32, tenure_years: u32, job_level: u8) -> f64 {
        self.base
            + self.age_coeff * f64::from(age)
            + self.tenure_coeff * f64::from(tenure_years)
            + self.level_coeff * f64::from(job_level)
    }
}

/// Shape of the synthetic workforce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkforceProfile {
    /// Inclusive lower bound of the age draw.
    pub min_age: u32,
    /// Exclusive upper bound of the age draw.
    pub max_age: u32,
    pub onboarding_age: u32,
    /// Tenure noise is drawn from `[0, tenure_noise_max)`.
    pub tenure_noise_max: u32,
    /// Job level band: `(age - level_band_offset) / level_band_width`.
    pub level_band_offset: u32,
    pub level_band_width: u32,
    /// Weights for the level perturbation `[-1, 0, +1]`.
    pub level_noise_weights: [f64; 3],
}

impl Default for WorkforceProfile {
    fn default() -> Self {
        Self {
            min_age: 22,
            max_age: 60,
            onboarding_age: 22,
            tenure_noise_max: 5,
            level_band_offset: 20,
            level_band_width: 8,
            level_noise_weights: [0.2, 0.6, 0.2],
        }
    }
}

/// Coefficients of the monthly resignation probability:
/// `clamp(0, max, fw*risk_financial + ww*risk_workload - offset)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AttritionWeights {
    pub financial_weight: f64,
    pub workload_weight: f64,
    pub baseline_offset: f64,
    /// Compa-ratio below which financial risk starts to accrue.
    pub compa_threshold: f64,
    pub overtime_reference_hours: f64,
    pub hp_sensitivity: f64,
    pub base_sensitivity: f64,
    pub max_probability: f64,
}

impl Default for AttritionWeights {
    fn default() -> Self {
        Self {
            financial_weight: 0.4,
            workload_weight: 0.6,
            baseline_offset: 0.1,
            compa_threshold: 1.2,
            overtime_reference_hours: 80.0,
            hp_sensitivity: 1.5,
            base_sensitivity: 1.0,
            max_probability: 0.35,
        }
    }
}

/// The complete, immutable parameter set of a simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Months a vacancy stays open before the replacement starts.
    pub recruit_lead_time: BranchTable<u32>,
    /// Wage inflation multiplier paid when backfilling, per rating bucket.
    pub replacement_premium: BTreeMap<RatingBucket, f64>,
    pub default_premium: f64,
    /// Rating -> bucket used to price a vacancy. Unlisted ratings use `default_bucket`.
    pub vacancy_buckets: BTreeMap<Rating, RatingBucket>,
    pub default_bucket: RatingBucket,
    /// Agency fee as a fraction of the new salary.
    pub hiring_fee_rate: f64,
    /// Fraction of a leaver's workload that stays with the survivors.
    pub spillover_rate: f64,
    pub base_work_hours: f64,
    pub opportunity_multiplier: f64,
    pub relief_hours_per_hire: f64,
    pub initial_overtime_hours: f64,
    pub rank_params: BTreeMap<Rating, RankParams>,
    /// Used for ratings absent from `rank_params`.
    pub default_rank: RankParams,
    pub high_potential: BTreeSet<Rating>,
    /// Probability that a generated employee sits in an Urban branch.
    pub urban_share: f64,
    pub rating_distribution: BTreeMap<Rating, f64>,
    /// Market base salary per job level, pre-unit scale.
    pub market_base: BTreeMap<u8, f64>,
    pub salary: SalaryFormula,
    pub workforce: WorkforceProfile,
    pub attrition: AttritionWeights,
    /// Divisor applied to currency amounts in monthly records.
    pub reporting_unit: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let replacement_premium = BTreeMap::from([
            (RatingBucket::S, 1.30),
            (RatingBucket::A, 1.25),
            (RatingBucket::B, 1.15),
            (RatingBucket::C, 1.10),
            (RatingBucket::D, 1.05),
        ]);
        // Only exact single-letter ratings own a bucket; the rest are priced as B.
        let vacancy_buckets = BTreeMap::from([
            (Rating::S, RatingBucket::S),
            (Rating::A, RatingBucket::A),
            (Rating::B, RatingBucket::B),
            (Rating::C, RatingBucket::C),
            (Rating::D, RatingBucket::D),
        ]);
        let rank_params = BTreeMap::from([
            (Rating::S, RankParams::new(1.6, 1.40)),
            (Rating::APlus, RankParams::new(1.4, 1.25)),
            (Rating::A, RankParams::new(1.3, 1.20)),
            (Rating::AMinus, RankParams::new(1.2, 1.15)),
            (Rating::BPlus, RankParams::new(1.1, 1.08)),
            (Rating::B, RankParams::new(1.0, 1.00)),
            (Rating::BMinus, RankParams::new(0.9, 0.95)),
            (Rating::C, RankParams::new(0.7, 0.85)),
            (Rating::D, RankParams::new(0.5, 0.70)),
        ]);
        let rating_distribution = BTreeMap::from([
            (Rating::S, 0.03),
            (Rating::APlus, 0.05),
            (Rating::A, 0.08),
            (Rating::AMinus, 0.10),
            (Rating::BPlus, 0.15),
            (Rating::B, 0.25),
            (Rating::BMinus, 0.15),
            (Rating::C, 0.12),
            (Rating::D, 0.07),
        ]);
        let market_base = BTreeMap::from([
            (1, 350.0),
            (2, 500.0),
            (3, 700.0),
            (4, 900.0),
            (5, 1200.0),
        ]);

        Self {
            recruit_lead_time: BranchTable::new(5, 10),
            replacement_premium,
            default_premium: 1.1,
            vacancy_buckets,
            default_bucket: RatingBucket::B,
            hiring_fee_rate: 0.35,
            spillover_rate: 0.7,
            base_work_hours: 160.0,
            opportunity_multiplier: 1.5,
            relief_hours_per_hire: 120.0,
            initial_overtime_hours: MIN_OVERTIME_HOURS,
            rank_params,
            default_rank: RankParams::new(1.0, 1.0),
            high_potential: BTreeSet::from([Rating::S, Rating::APlus, Rating::A, Rating::AMinus]),
            urban_share: 0.6,
            rating_distribution,
            market_base,
            salary: SalaryFormula::default(),
            workforce: WorkforceProfile::default(),
            attrition: AttritionWeights::default(),
            reporting_unit: 1_000_000.0,
        }
    }
}

impl SimulationConfig {
    /// Parse a JSON document and validate it. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SimulationConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Set the recruiting lead time for one branch.
    pub fn with_lead_time(mut self, branch: Branch, months: u32) -> Self {
        self.recruit_lead_time.set(branch, months);
        self
    }

    /// Set the Urban share of generated employees.
    pub fn with_urban_share(mut self, share: f64) -> Self {
        self.urban_share = share;
        self
    }

    /// Set the spillover retention rate.
    pub fn with_spillover_rate(mut self, rate: f64) -> Self {
        self.spillover_rate = rate;
        self
    }

    // ── Lookups ──────────────────────────────────────────────────

    pub fn lead_time(&self, branch: Branch) -> u32 {
        self.recruit_lead_time.get(branch)
    }

    pub fn bucket_for(&self, rating: Rating) -> RatingBucket {
        self.vacancy_buckets
            .get(&rating)
            .copied()
            .unwrap_or(self.default_bucket)
    }

    pub fn premium_for(&self, bucket: RatingBucket) -> f64 {
        self.replacement_premium
            .get(&bucket)
            .copied()
            .unwrap_or(self.default_premium)
    }

    pub fn rank(&self, rating: Rating) -> &RankParams {
        self.rank_params.get(&rating).unwrap_or(&self.default_rank)
    }

    pub fn is_high_potential(&self, rating: Rating) -> bool {
        self.high_potential.contains(&rating)
    }

    // ── Validation ───────────────────────────────────────────────

    /// Reject malformed configuration before any month executes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for branch in Branch::ALL {
            if self.lead_time(branch) == 0 {
                return Err(ConfigError::NonPositiveLeadTime { branch });
            }
        }

        for &premium in self.replacement_premium.values() {
            check_at_least("replacement_premium", premium, 1.0)?;
        }
        check_at_least("default_premium", self.default_premium, 1.0)?;
        for bucket in self
            .vacancy_buckets
            .values()
            .chain(std::iter::once(&self.default_bucket))
        {
            if !self.replacement_premium.contains_key(bucket) {
                return Err(ConfigError::MissingPremium(*bucket));
            }
        }

        check_range("hiring_fee_rate", self.hiring_fee_rate, 0.0, f64::MAX)?;
        check_range("spillover_rate", self.spillover_rate, 0.0, 1.0)?;
        check_range("base_work_hours", self.base_work_hours, 0.0, f64::MAX)?;
        check_range("opportunity_multiplier", self.opportunity_multiplier, 0.0, f64::MAX)?;
        check_range("relief_hours_per_hire", self.relief_hours_per_hire, 0.0, f64::MAX)?;
        check_range(
            "initial_overtime_hours",
            self.initial_overtime_hours,
            MIN_OVERTIME_HOURS,
            f64::MAX,
        )?;
        check_range("urban_share", self.urban_share, 0.0, 1.0)?;
        check_positive("reporting_unit", self.reporting_unit)?;

        for params in self
            .rank_params
            .values()
            .chain(std::iter::once(&self.default_rank))
        {
            check_positive("absorption", params.absorption)?;
            check_positive("perf_mult", params.perf_mult)?;
        }

        self.validate_rating_distribution()?;

        for level in 1..=5u8 {
            match self.market_base.get(&level) {
                Some(&base) => check_positive("market_base", base)?,
                None => return Err(ConfigError::MissingMarketBase(level)),
            }
        }

        self.validate_salary()?;
        self.validate_workforce()?;
        self.validate_attrition()?;

        let unbucketed: Vec<&str> = Rating::ALL
            .iter()
            .filter(|r| !self.vacancy_buckets.contains_key(*r))
            .map(|r| r.label())
            .collect();
        if !unbucketed.is_empty() {
            debug!(
                ratings = ?unbucketed,
                fallback = %self.default_bucket,
                "ratings without a vacancy bucket use the default bucket"
            );
        }

        Ok(())
    }

    fn validate_rating_distribution(&self) -> Result<(), ConfigError> {
        if self.rating_distribution.is_empty() {
            return Err(ConfigError::EmptyRatingDistribution);
        }
        let mut sum = 0.0;
        for (&rating, &p) in &self.rating_distribution {
            if !p.is_finite() || !(0.0..=1.0).contains(&p) {
                return Err(ConfigError::InvalidProbability { rating, value: p });
            }
            if p > 0.0 && !self.rank_params.contains_key(&rating) {
                return Err(ConfigError::MissingRankParams(rating));
            }
            sum += p;
        }
        if (sum - 1.0).abs() > PROBABILITY_SUM_TOLERANCE {
            return Err(ConfigError::DistributionNotNormalized { sum });
        }
        Ok(())
    }

    fn validate_salary(&self) -> Result<(), ConfigError> {
        let s = &self.salary;
        check_positive("salary.base", s.base)?;
        check_range("salary.age_coeff", s.age_coeff, 0.0, f64::MAX)?;
        check_range("salary.tenure_coeff", s.tenure_coeff, 0.0, f64::MAX)?;
        check_range("salary.level_coeff", s.level_coeff, 0.0, f64::MAX)?;
        check_positive("salary.unit", s.unit)
    }

    fn validate_workforce(&self) -> Result<(), ConfigError> {
        let w = &self.workforce;
        if w.min_age >= w.max_age {
            return Err(ConfigError::InvalidAgeRange {
                min: w.min_age,
                max: w.max_age,
            });
        }
        check_positive("workforce.tenure_noise_max", f64::from(w.tenure_noise_max))?;
        check_positive("workforce.level_band_width", f64::from(w.level_band_width))?;
        let mut total = 0.0;
        for &weight in &w.level_noise_weights {
            check_range("workforce.level_noise_weights", weight, 0.0, f64::MAX)?;
            total += weight;
        }
        check_positive("workforce.level_noise_weights (sum)", total)
    }

    fn validate_attrition(&self) -> Result<(), ConfigError> {
        let a = &self.attrition;
        check_range("attrition.financial_weight", a.financial_weight, 0.0, f64::MAX)?;
        check_range("attrition.workload_weight", a.workload_weight, 0.0, f64::MAX)?;
        check_range("attrition.baseline_offset", a.baseline_offset, f64::MIN, f64::MAX)?;
        check_range("attrition.compa_threshold", a.compa_threshold, 0.0, f64::MAX)?;
        check_positive("attrition.overtime_reference_hours", a.overtime_reference_hours)?;
        check_range("attrition.hp_sensitivity", a.hp_sensitivity, 0.0, f64::MAX)?;
        check_range("attrition.base_sensitivity", a.base_sensitivity, 0.0, f64::MAX)?;
        check_range("attrition.max_probability", a.max_probability, 0.0, 1.0)
    }
}

fn check_positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if is_positive(value) {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

fn check_range(field: &'static str, value: f64, lo: f64, hi: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= lo && value <= hi {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { field, value, lo, hi })
    }
}

fn check_at_least(field: &'static str, value: f64, lo: f64) -> Result<(), ConfigError> {
    check_range(field, value, lo, f64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        SimulationConfig::default().validate().unwrap();
    }

    #[test]
    fn test_default_lead_times() {
        let c = SimulationConfig::default();
        assert_eq!(c.lead_time(Branch::Urban), 5);
        assert_eq!(c.lead_time(Branch::Rural), 10);
    }

    #[test]
    fn test_zero_lead_time_rejected() {
        let c = SimulationConfig::default().with_lead_time(Branch::Rural, 0);
        assert_eq!(
            c.validate(),
            Err(ConfigError::NonPositiveLeadTime {
                branch: Branch::Rural
            })
        );
    }

    #[test]
    fn test_unnormalized_distribution_rejected() {
        let mut c = SimulationConfig::default();
        c.rating_distribution.insert(Rating::S, 0.5);
        assert!(matches!(
            c.validate(),
            Err(ConfigError::DistributionNotNormalized { .. })
        ));
    }

    #[test]
    fn test_negative_probability_rejected() {
        let mut c = SimulationConfig::default();
        c.rating_distribution.insert(Rating::D, -0.07);
        assert!(matches!(
            c.validate(),
            Err(ConfigError::InvalidProbability {
                rating: Rating::D,
                ..
            })
        ));
    }

    #[test]
    fn test_drawn_rating_without_rank_params_rejected() {
        let mut c = SimulationConfig::default();
        c.rank_params.remove(&Rating::C);
        assert_eq!(c.validate(), Err(ConfigError::MissingRankParams(Rating::C)));
    }

    #[test]
    fn test_bucket_without_premium_rejected() {
        let mut c = SimulationConfig::default();
        c.replacement_premium.remove(&RatingBucket::D);
        assert_eq!(c.validate(), Err(ConfigError::MissingPremium(RatingBucket::D)));
    }

    #[test]
    fn test_spillover_rate_out_of_range_rejected() {
        let c = SimulationConfig::default().with_spillover_rate(1.5);
        assert!(matches!(
            c.validate(),
            Err(ConfigError::OutOfRange {
                field: "spillover_rate",
                ..
            })
        ));
    }

    #[test]
    fn test_missing_market_base_rejected() {
        let mut c = SimulationConfig::default();
        c.market_base.remove(&3);
        assert_eq!(c.validate(), Err(ConfigError::MissingMarketBase(3)));
    }

    #[test]
    fn test_bucket_lookup_falls_back_to_default() {
        let c = SimulationConfig::default();
        assert_eq!(c.bucket_for(Rating::S), RatingBucket::S);
        assert_eq!(c.bucket_for(Rating::APlus), RatingBucket::B);
        assert_eq!(c.bucket_for(Rating::BMinus), RatingBucket::B);
    }

    #[test]
    fn test_premium_and_rank_fall_back_to_defaults() {
        let mut c = SimulationConfig::default();
        c.replacement_premium.remove(&RatingBucket::C);
        assert_eq!(c.premium_for(RatingBucket::C), 1.1);
        c.rank_params.remove(&Rating::D);
        assert_eq!(c.rank(Rating::D), &RankParams::new(1.0, 1.0));
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let c = SimulationConfig::from_json_str(
            r#"{"recruit_lead_time": {"Urban": 3, "Rural": 8}, "hiring_fee_rate": 0.3}"#,
        )
        .unwrap();
        assert_eq!(c.lead_time(Branch::Urban), 3);
        assert_eq!(c.hiring_fee_rate, 0.3);
        assert_eq!(c.spillover_rate, 0.7);
    }

    #[test]
    fn test_json_with_partial_lead_time_rejected() {
        let err = SimulationConfig::from_json_str(r#"{"recruit_lead_time": {"Urban": 3}}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_json_unknown_field_rejected() {
        let err = SimulationConfig::from_json_str(r#"{"lead_time": 3}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_json_round_trip_preserves_config() {
        let c = SimulationConfig::default();
        let json = serde_json::to_string(&c).unwrap();
        let back = SimulationConfig::from_json_str(&json).unwrap();
        assert_eq!(back, c);
    }
}
