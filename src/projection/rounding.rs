//! Currency rounding rules used by every reported figure

use crate::error::ProjectionError;

/// Round to whole cents, ties toward positive infinity.
///
/// Same rule as `Math.round(x * 100) / 100`: 10.125 -> 10.13, -0.125 -> -0.12.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0 + 0.5).floor() / 100.0
}

/// Round to cents, failing when the rounded figure is not a finite number.
///
/// Balances near `f64::MAX` are finite but overflow once scaled to cents.
pub fn finite_cents(value: f64, what: &str) -> Result<f64, ProjectionError> {
    let rounded = round_cents(value);
    if !rounded.is_finite() {
        return Err(ProjectionError::ComputationOverflow(format!(
            "{} is too large to report",
            what
        )));
    }
    Ok(rounded)
}

/// Round a ratio to a percentage with two decimals: `round(ratio * 10000) / 100`
pub fn round_percent(ratio: f64) -> f64 {
    (ratio * 10_000.0 + 0.5).floor() / 100.0
}

/// Round up to the next whole currency unit
pub fn ceil_units(value: f64) -> f64 {
    value.ceil()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_cents_half_up() {
        assert_eq!(round_cents(100.0), 100.0);
        assert_eq!(round_cents(10.125), 10.13);
        assert_eq!(round_cents(1268.2503), 1268.25);
        // Ties go toward +inf, not away from zero
        assert_eq!(round_cents(-0.125), -0.12);
    }

    #[test]
    fn test_finite_cents_rejects_overflow() {
        assert_eq!(finite_cents(1_268.2503, "balance"), Ok(1_268.25));
        assert!(matches!(
            finite_cents(1e307, "balance"),
            Err(ProjectionError::ComputationOverflow(msg)) if msg.contains("balance")
        ));
        assert!(finite_cents(f64::NAN, "balance").is_err());
    }

    #[test]
    fn test_round_percent() {
        assert_eq!(round_percent(0.126825), 12.68);
        assert_eq!(round_percent(0.0), 0.0);
    }

    #[test]
    fn test_ceil_units() {
        assert_eq!(ceil_units(99.01), 100.0);
        assert_eq!(ceil_units(100.0), 100.0);
        assert_eq!(ceil_units(0.0), 0.0);
    }
}
