//! Numeric primitives shared by the generator and the phase transitions.

/// Overtime floor in hours/month. No employee ever drops below it.
pub const MIN_OVERTIME_HOURS: f64 = 20.0;

/// Months per year, for converting annual salaries to a monthly cost.
pub const MONTHS_PER_YEAR: f64 = 12.0;

/// Tolerance used when checking that a probability table sums to one.
pub const PROBABILITY_SUM_TOLERANCE: f64 = 1e-6;

/// Clamp `value` into `[lo, hi]`. `lo` must not exceed `hi`.
pub fn clamp(value: f64, lo: f64, hi: f64) -> f64 {
    value.max(lo).min(hi)
}

/// Raise `value` to `floor` if it falls below it.
pub fn floor_at(value: f64, floor: f64) -> f64 {
    if value < floor {
        floor
    } else {
        value
    }
}

/// Monthly cost of an annual amount.
pub fn monthly(annual: f64) -> f64 {
    annual / MONTHS_PER_YEAR
}

/// Rescale a raw currency amount into the reporting unit (e.g. millions).
pub fn to_reporting_unit(amount: f64, unit: f64) -> f64 {
    amount / unit
}

/// Arithmetic mean, or 0.0 for an empty input.
pub fn mean_or_zero<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = values
        .into_iter()
        .fold((0.0_f64, 0_usize), |(s, n), v| (s + v, n + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// True when `value` is finite and strictly positive.
pub fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_bounds() {
        assert_eq!(clamp(-0.2, 0.0, 0.35), 0.0);
        assert_eq!(clamp(0.9, 0.0, 0.35), 0.35);
        assert_eq!(clamp(0.13, 0.0, 0.35), 0.13);
    }

    #[test]
    fn test_floor_at() {
        assert_eq!(floor_at(12.5, MIN_OVERTIME_HOURS), 20.0);
        assert_eq!(floor_at(31.0, MIN_OVERTIME_HOURS), 31.0);
    }

    #[test]
    fn test_mean_or_zero_empty() {
        assert_eq!(mean_or_zero(Vec::<f64>::new()), 0.0);
        assert_eq!(mean_or_zero(vec![20.0, 40.0]), 30.0);
    }

    #[test]
    fn test_monthly_and_reporting_unit() {
        assert_eq!(monthly(1_200.0), 100.0);
        assert_eq!(to_reporting_unit(2_500_000.0, 1_000_000.0), 2.5);
    }

    #[test]
    fn test_is_positive() {
        assert!(is_positive(0.5));
        assert!(!is_positive(0.0));
        assert!(!is_positive(f64::NAN));
        assert!(!is_positive(f64::INFINITY));
    }
}
