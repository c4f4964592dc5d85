//! Canonical account addresses.
//!
//! The host chain provides bech32-encoded account addresses. This module
//! performs purely syntactic validation of their canonical string form;
//! key management and signature verification are host concerns.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EcoError, Result};

/// Bech32 data-part charset (excludes `1`, `b`, `i`, `o`).
const BECH32_CHARSET: &str = "qpzry9x8gf2tvdw0s3jn54khce6mua7l";

/// Maximum length of a bech32 string per BIP-173.
const MAX_ADDRESS_LENGTH: usize = 90;

/// A validated account address in canonical bech32 string form.
///
/// Ordering and equality are on the canonical string, which makes the
/// address usable as a deterministic state key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Parse and validate a canonical address string.
    ///
    /// # Errors
    /// Returns [`EcoError::InvalidAddress`] if the string is not a
    /// well-formed bech32 address.
    pub fn new(s: impl Into<String>) -> Result<Self> {
        let s = s.into();
        validate_address(&s)?;
        Ok(Self(s))
    }

    /// The canonical string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validate the syntactic shape of a bech32 address string.
///
/// # Errors
/// Returns [`EcoError::InvalidAddress`] naming the defect.
pub fn validate_address(s: &str) -> Result<()> {
    let err = |reason: &str| EcoError::InvalidAddress(format!("{s}: {reason}"));

    if s.is_empty() {
        return Err(EcoError::InvalidAddress("empty address string".into()));
    }
    if s.len() > MAX_ADDRESS_LENGTH {
        return Err(err("exceeds maximum bech32 length"));
    }
    let Some(sep) = s.rfind('1') else {
        return Err(err("missing bech32 separator"));
    };
    let (hrp, data) = (&s[..sep], &s[sep + 1..]);
    if hrp.is_empty() {
        return Err(err("empty human-readable prefix"));
    }
    if !hrp.chars().all(|c| c.is_ascii_lowercase()) {
        return Err(err("prefix must be lowercase letters"));
    }
    if data.len() < 6 {
        return Err(err("data part too short"));
    }
    if !data.chars().all(|c| BECH32_CHARSET.contains(c)) {
        return Err(err("invalid character in data part"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_address_parses() {
        let addr = Address::new("regen1df675r9vnf7pdedn4sf26svdsem3ugavgxmy46").unwrap();
        assert_eq!(
            addr.as_str(),
            "regen1df675r9vnf7pdedn4sf26svdsem3ugavgxmy46"
        );
    }

    #[test]
    fn empty_address_rejected() {
        assert!(Address::new("").is_err());
    }

    #[test]
    fn missing_separator_rejected() {
        assert!(Address::new("regenqqqqqq").is_err());
    }

    #[test]
    fn uppercase_prefix_rejected() {
        assert!(Address::new("REGEN1qqqqqq").is_err());
    }

    #[test]
    fn invalid_charset_rejected() {
        // 'b' is not in the bech32 data charset
        assert!(Address::new("regen1bbbbbb").is_err());
    }

    #[test]
    fn too_long_rejected() {
        let s = format!("regen1{}", "q".repeat(100));
        assert!(Address::new(s).is_err());
    }

    #[test]
    fn ordering_is_on_canonical_string() {
        let a = Address::new("regen1aqqqqqq").unwrap();
        let b = Address::new("regen1zqqqqqq").unwrap();
        assert!(a < b);
    }

    #[test]
    fn serde_is_transparent() {
        let addr = Address::new("regen1df675r9vnf7pdedn4sf26svdsem3ugavgxmy46").unwrap();
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, "\"regen1df675r9vnf7pdedn4sf26svdsem3ugavgxmy46\"");
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(addr, back);
    }
}
