//! Exact decimal arithmetic helpers.
//!
//! All credit amounts are [`rust_decimal::Decimal`] values. Arithmetic is
//! exact; nothing here ever rounds. Rounding exists in exactly one place
//! in the whole module — the payment-coin boundary in the marketplace —
//! and uses banker's rounding at integer precision (see
//! [`round_to_coin`]).

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{EcoError, Result};

/// Parse a non-negative decimal from its string form.
///
/// # Errors
/// Returns [`EcoError::InvalidDecimal`] if the string does not parse or
/// the value is negative.
pub fn non_negative(s: &str, path: &str) -> Result<Decimal> {
    let d = parse(s, path)?;
    if d.is_sign_negative() && !d.is_zero() {
        return Err(EcoError::InvalidDecimal(format!(
            "{path}: expected a non-negative decimal, got {s}"
        )));
    }
    Ok(d)
}

/// Parse a strictly positive decimal from its string form.
///
/// # Errors
/// Returns [`EcoError::InvalidDecimal`] if the string does not parse or
/// the value is zero or negative.
pub fn positive(s: &str, path: &str) -> Result<Decimal> {
    let d = parse(s, path)?;
    if !d.is_sign_positive() || d.is_zero() {
        return Err(EcoError::InvalidDecimal(format!(
            "{path}: expected a positive decimal, got {s}"
        )));
    }
    Ok(d)
}

/// Parse an optional amount field: the empty string reads as zero.
///
/// # Errors
/// Returns [`EcoError::InvalidDecimal`] on malformed or negative input.
pub fn non_negative_or_zero(s: &str, path: &str) -> Result<Decimal> {
    if s.is_empty() {
        return Ok(Decimal::ZERO);
    }
    non_negative(s, path)
}

/// Check that `d` carries no more fractional digits than `precision`
/// allows. Trailing zeros do not count: `10.000000` respects precision 0.
///
/// # Errors
/// Returns [`EcoError::InvalidDecimal`] on a precision violation.
pub fn check_precision(d: Decimal, precision: u32, path: &str) -> Result<()> {
    let scale = d.normalize().scale();
    if scale > precision {
        return Err(EcoError::InvalidDecimal(format!(
            "{path}: {d} exceeds maximum decimal places: {precision}"
        )));
    }
    Ok(())
}

/// Exact subtraction that refuses to go negative.
///
/// # Errors
/// Returns [`EcoError::InsufficientFunds`] if `b > a`.
pub fn checked_sub(a: Decimal, b: Decimal, path: &str) -> Result<Decimal> {
    if b > a {
        return Err(EcoError::InsufficientFunds {
            path: path.to_string(),
            needed: b,
            available: a,
        });
    }
    Ok(a - b)
}

/// Round a payment amount to integer precision using banker's rounding
/// (round half to even). Only the marketplace settlement path calls this.
#[must_use]
pub fn round_to_coin(d: Decimal) -> Decimal {
    d.round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven)
}

fn parse(s: &str, path: &str) -> Result<Decimal> {
    if s.is_empty() {
        return Err(EcoError::InvalidDecimal(format!(
            "{path}: decimal string cannot be empty"
        )));
    }
    Decimal::from_str_exact(s)
        .map_err(|e| EcoError::InvalidDecimal(format!("{path}: {s}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_negative_accepts_zero() {
        assert_eq!(non_negative("0", "x").unwrap(), Decimal::ZERO);
        assert_eq!(non_negative("0.000", "x").unwrap(), Decimal::ZERO);
    }

    #[test]
    fn non_negative_rejects_negative() {
        assert!(non_negative("-1", "x").is_err());
        assert!(non_negative("-0.5", "x").is_err());
    }

    #[test]
    fn positive_rejects_zero_and_negative() {
        assert!(positive("0", "x").is_err());
        assert!(positive("-3", "x").is_err());
        assert_eq!(positive("4.5", "x").unwrap(), Decimal::new(45, 1));
    }

    #[test]
    fn empty_string_is_zero_only_when_optional() {
        assert_eq!(non_negative_or_zero("", "x").unwrap(), Decimal::ZERO);
        assert!(non_negative("", "x").is_err());
        assert!(positive("", "x").is_err());
    }

    #[test]
    fn garbage_rejected() {
        assert!(non_negative("abc", "x").is_err());
        assert!(non_negative("1.2.3", "x").is_err());
        assert!(non_negative("1e5", "x").is_err());
    }

    #[test]
    fn precision_check_ignores_trailing_zeros() {
        let d = Decimal::from_str_exact("10.000000").unwrap();
        assert!(check_precision(d, 0, "x").is_ok());
        let d = Decimal::from_str_exact("4.5").unwrap();
        assert!(check_precision(d, 1, "x").is_ok());
        assert!(check_precision(d, 0, "x").is_err());
    }

    #[test]
    fn precision_violation_names_path() {
        let d = Decimal::from_str_exact("1.2345678").unwrap();
        let err = check_precision(d, 6, "quantity").unwrap_err();
        assert!(format!("{err}").contains("quantity"));
    }

    #[test]
    fn checked_sub_exact() {
        let a = Decimal::from_str_exact("10.000000").unwrap();
        let b = Decimal::from_str_exact("4.5").unwrap();
        assert_eq!(
            checked_sub(a, b, "x").unwrap(),
            Decimal::from_str_exact("5.5").unwrap()
        );
    }

    #[test]
    fn checked_sub_underflow_is_insufficient_funds() {
        let err = checked_sub(Decimal::ONE, Decimal::TWO, "tradable").unwrap_err();
        assert!(matches!(err, EcoError::InsufficientFunds { .. }));
        assert!(format!("{err}").contains("tradable"));
    }

    #[test]
    fn bankers_rounding_at_coin_boundary() {
        assert_eq!(
            round_to_coin(Decimal::from_str_exact("2.5").unwrap()),
            Decimal::TWO
        );
        assert_eq!(
            round_to_coin(Decimal::from_str_exact("3.5").unwrap()),
            Decimal::new(4, 0)
        );
        assert_eq!(
            round_to_coin(Decimal::from_str_exact("2.4").unwrap()),
            Decimal::TWO
        );
    }
}
