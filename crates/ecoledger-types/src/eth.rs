//! Ethereum-side validators for bridged origin transactions.
//!
//! Bridged batches carry an attested reference to the off-chain event
//! that authorized the mint: a transaction hash and the contract that
//! emitted it. Both are validated syntactically; mixed-case contract
//! addresses must additionally satisfy the EIP-55 checksum.

use sha3::{Digest, Keccak256};

use crate::error::{EcoError, Result};

/// Validate an Ethereum transaction hash: `0x` + 64 hex digits.
///
/// # Errors
/// Returns [`EcoError::InvalidRequest`] on grammar violations.
pub fn validate_eth_tx_hash(hash: &str) -> Result<()> {
    let err = || {
        EcoError::InvalidRequest(format!(
            "origin tx id must be a valid ethereum transaction hash: got {hash}"
        ))
    };

    let hex_part = hash.strip_prefix("0x").ok_or_else(err)?;
    let bytes = hex::decode(hex_part).map_err(|_| err())?;
    if bytes.len() != 32 {
        return Err(err());
    }
    Ok(())
}

/// Validate an Ethereum contract address: `0x` + 40 hex digits.
///
/// All-lowercase and all-uppercase hex forms carry no checksum and are
/// accepted as-is; any mixed-case form must satisfy the EIP-55 checksum.
///
/// # Errors
/// Returns [`EcoError::InvalidRequest`] on grammar or checksum violations.
pub fn validate_eth_contract_addr(addr: &str) -> Result<()> {
    let err = |reason: &str| {
        EcoError::InvalidRequest(format!("origin tx contract: {reason}: got {addr}"))
    };

    let hex_part = addr
        .strip_prefix("0x")
        .ok_or_else(|| err("must be a valid ethereum contract address"))?;
    let bytes = hex::decode(hex_part)
        .map_err(|_| err("must be a valid ethereum contract address"))?;
    if bytes.len() != 20 {
        return Err(err("must be a valid ethereum contract address"));
    }

    let has_lower = hex_part.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = hex_part.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper && hex_part != eip55_checksum(hex_part) {
        return Err(err("eip-55 checksum mismatch"));
    }
    Ok(())
}

/// EIP-55 checksummed form of a 40-digit lowercase-able hex string.
fn eip55_checksum(hex_part: &str) -> String {
    let lower = hex_part.to_ascii_lowercase();
    let hash = Keccak256::digest(lower.as_bytes());
    lower
        .chars()
        .enumerate()
        .map(|(i, c)| {
            let nibble = if i % 2 == 0 {
                hash[i / 2] >> 4
            } else {
                hash[i / 2] & 0x0f
            };
            if c.is_ascii_alphabetic() && nibble >= 8 {
                c.to_ascii_uppercase()
            } else {
                c
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_tx_hash() {
        let hash = format!("0x{}", "ab12".repeat(16));
        assert!(validate_eth_tx_hash(&hash).is_ok());
    }

    #[test]
    fn tx_hash_rejections() {
        assert!(validate_eth_tx_hash("").is_err());
        assert!(validate_eth_tx_hash("0x").is_err());
        assert!(validate_eth_tx_hash(&"a".repeat(66)).is_err()); // no 0x
        assert!(validate_eth_tx_hash(&format!("0x{}", "g".repeat(64))).is_err());
        assert!(validate_eth_tx_hash(&format!("0x{}", "a".repeat(63))).is_err());
    }

    #[test]
    fn eip55_reference_vectors() {
        // Test vectors from the EIP-55 specification.
        for addr in [
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
            "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
            "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
            "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb",
        ] {
            assert!(validate_eth_contract_addr(addr).is_ok(), "{addr}");
        }
    }

    #[test]
    fn eip55_checksum_mismatch_rejected() {
        // First letter's case flipped relative to the valid checksum.
        assert!(
            validate_eth_contract_addr("0x5AAeb6053F3E94C9b9A09f33669435E7Ef1BeAed").is_err()
        );
    }

    #[test]
    fn checksum_free_forms_accepted() {
        assert!(
            validate_eth_contract_addr("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed").is_ok()
        );
        assert!(
            validate_eth_contract_addr("0x5AAEB6053F3E94C9B9A09F33669435E7EF1BEAED").is_ok()
        );
    }

    #[test]
    fn contract_addr_rejections() {
        assert!(validate_eth_contract_addr("").is_err());
        assert!(validate_eth_contract_addr("0x1234").is_err());
        assert!(
            validate_eth_contract_addr(&format!("0x{}", "z".repeat(40))).is_err()
        );
    }
}
