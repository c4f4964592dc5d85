//! Payment coins.
//!
//! Credits are priced and paid for in host-chain coins. Coin amounts are
//! whole integers of the smallest denomination (e.g. `uregen`); the
//! decimal representation is used so the amount survives the string wire
//! form unchanged.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EcoError, Result};

/// A coin of a single payment denom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: Decimal,
}

impl Coin {
    #[must_use]
    pub fn new(denom: impl Into<String>, amount: Decimal) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }

    /// Validate denom grammar and that the amount is a positive integer.
    ///
    /// # Errors
    /// Returns [`EcoError::InvalidRequest`] naming `path` on any defect.
    pub fn validate(&self, path: &str) -> Result<()> {
        if self.denom.is_empty() {
            return Err(EcoError::InvalidRequest(format!(
                "{path}: denom cannot be empty"
            )));
        }
        validate_denom(&self.denom)
            .map_err(|e| EcoError::InvalidRequest(format!("{path}: {e}")))?;
        if self.amount.is_sign_negative() || self.amount.is_zero() {
            return Err(EcoError::InvalidRequest(format!(
                "{path}: amount must be a positive integer"
            )));
        }
        if self.amount.normalize().scale() != 0 {
            return Err(EcoError::InvalidRequest(format!(
                "{path}: amount must be a positive integer"
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount.normalize(), self.denom)
    }
}

/// Validate a coin denom: 3–128 characters, a leading letter, then
/// letters, digits, or one of `/ : . _ -`.
///
/// # Errors
/// Returns [`EcoError::InvalidRequest`] on grammar violations.
pub fn validate_denom(denom: &str) -> Result<()> {
    let err = || EcoError::InvalidRequest(format!("invalid denom: {denom}"));

    if denom.len() < 3 || denom.len() > 128 {
        return Err(err());
    }
    let mut chars = denom.chars();
    let first = chars.next().ok_or_else(err)?;
    if !first.is_ascii_alphabetic() {
        return Err(err());
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | ':' | '.' | '_' | '-')) {
        return Err(err());
    }
    Ok(())
}
