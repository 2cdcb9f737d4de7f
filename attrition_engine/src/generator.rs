//! Population generator.
//!
//! Synthesizes the starting workforce from the configured distributions.
//! A pure function of the configuration and the random draws.

use rand::distributions::{Bernoulli, Distribution, WeightedIndex};
use rand::Rng;
use tracing::info;

use crate::config::SimulationConfig;
use crate::domain::{Branch, Employee, EmployeeStatus, Rating};
use crate::error::ConfigError;

/// Draws employee records from a validated configuration.
#[derive(Debug, Clone)]
pub struct PopulationGenerator {
    config: SimulationConfig,
    ratings: Vec<Rating>,
    rating_index: WeightedIndex<f64>,
    level_noise: WeightedIndex<f64>,
    urban: Bernoulli,
    market_base: [f64; 5],
}

impl PopulationGenerator {
    /// Validate `config` and prepare the samplers.
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let (ratings, weights): (Vec<Rating>, Vec<f64>) = config
            .rating_distribution
            .iter()
            .map(|(&r, &p)| (r, p))
            .unzip();
        let rating_index = WeightedIndex::new(&weights).map_err(|_| {
            ConfigError::DistributionNotNormalized {
                sum: weights.iter().sum(),
            }
        })?;

        let noise_weights = config.workforce.level_noise_weights;
        let level_noise =
            WeightedIndex::new(noise_weights).map_err(|_| ConfigError::NotPositive {
                field: "workforce.level_noise_weights (sum)",
                value: noise_weights.iter().sum(),
            })?;

        let urban = Bernoulli::new(config.urban_share).map_err(|_| ConfigError::OutOfRange {
            field: "urban_share",
            value: config.urban_share,
            lo: 0.0,
            hi: 1.0,
        })?;

        let mut market_base = [0.0; 5];
        for (slot, level) in market_base.iter_mut().zip(1..=5u8) {
            *slot = config
                .market_base
                .get(&level)
                .copied()
                .ok_or(ConfigError::MissingMarketBase(level))?;
        }

        Ok(Self {
            config,
            ratings,
            rating_index,
            level_noise,
            urban,
            market_base,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Generate `n` active employees with IDs `0..n`.
    pub fn generate(&self, n: u32, rng: &mut impl Rng) -> Result<Vec<Employee>, ConfigError> {
        if n == 0 {
            return Err(ConfigError::NonPositiveEmployeeCount);
        }
        let w = &self.config.workforce;

        let mut population = Vec::with_capacity(n as usize);
        for id in 0..n {
            let age = rng.gen_range(w.min_age..w.max_age);
            let noise = rng.gen_range(0..w.tenure_noise_max);
            let tenure = age.saturating_sub(w.onboarding_age).saturating_sub(noise);
            let level = self.draw_job_level(age, rng);
            let rating = self.ratings[self.rating_index.sample(rng)];
            let branch = if self.urban.sample(rng) {
                Branch::Urban
            } else {
                Branch::Rural
            };
            population.push(self.build_employee(id, age, tenure, level, rating, branch));
        }

        let hp = population.iter().filter(|e| e.is_high_potential).count();
        let urban = population.iter().filter(|e| e.branch == Branch::Urban).count();
        info!(count = n, high_potential = hp, urban, "generated population");
        Ok(population)
    }

    /// Build one active employee with derived salary and compa-ratio.
    ///
    /// `job_level` is clamped to 1..=5.
    pub fn build_employee(
        &self,
        id: u32,
        age: u32,
        tenure_years: u32,
        job_level: u8,
        rating: Rating,
        branch: Branch,
    ) -> Employee {
        let level = job_level.clamp(1, 5);
        let internal = self.config.salary.internal(age, tenure_years, level);
        let market = self.market_base[usize::from(level - 1)] * self.config.rank(rating).perf_mult;

        Employee {
            id,
            age,
            tenure_years,
            job_level: level,
            rating,
            branch,
            current_salary: internal * self.config.salary.unit,
            compa_ratio: internal / market,
            status: EmployeeStatus::Active,
            overtime_hours: self.config.initial_overtime_hours,
            is_high_potential: self.config.is_high_potential(rating),
        }
    }

    /// Age band, then a {-1, 0, +1} perturbation, clamped to 1..=5.
    fn draw_job_level(&self, age: u32, rng: &mut impl Rng) -> u8 {
        let w = &self.config.workforce;
        let band = (i64::from(age) - i64::from(w.level_band_offset)) / i64::from(w.level_band_width);
        let base = band.clamp(1, 5);
        let noise = self.level_noise.sample(rng) as i64 - 1;
        (base + noise).clamp(1, 5) as u8
    }
}
