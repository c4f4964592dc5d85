//! Persisted entities of the credit namespace.
//!
//! Rows are never deleted: retirement and cancellation move value into
//! terminal pools instead. Parent pointers are one-way surrogate `u64`
//! keys (batch → project → class → credit type); balances and supply
//! reference a batch by key, never the reverse.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    address::Address,
    coin::Coin,
    constants::BRIDGE_SOURCE_POLYGON,
    error::{EcoError, Result},
    eth,
};

/// A top-level credit category (e.g. carbon `C`) with a declared decimal
/// precision that every amount underneath it must respect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditType {
    pub abbreviation: String,
    /// Maximum fractional digits for amounts of this type (≤ 6).
    pub precision: u32,
}

/// A credit class: a group of projects sharing a credit type and admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Class {
    /// Surrogate key assigned by the state store.
    pub key: u64,
    /// Unique natural id, e.g. `C01`.
    pub id: String,
    pub admin: Address,
    pub credit_type_abbrev: String,
    pub metadata: String,
}

/// A project under a class, tied to a jurisdiction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub key: u64,
    /// Unique natural id, e.g. `C01-001`.
    pub id: String,
    pub class_key: u64,
    pub admin: Address,
    pub jurisdiction: String,
    /// Caller-supplied handle for off-chain reconciliation. Not unique.
    pub reference_id: String,
    pub metadata: String,
}

/// A fungible credit batch issued under a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    pub key: u64,
    /// Unique denom, e.g. `C01-001-20200101-20210101-001`.
    pub denom: String,
    pub project_key: u64,
    pub issuer: Address,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub issuance_date: DateTime<Utc>,
    /// Whether further minting into this batch is permitted (bridged
    /// batches stay open; ordinary issuance closes the batch).
    pub open: bool,
    pub metadata: String,
}

/// Per-batch supply, partitioned into tradable, retired, and cancelled
/// pools. Escrowed credits are counted under `tradable` at the supply
/// level; only balances distinguish escrow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSupply {
    pub tradable: Decimal,
    pub retired: Decimal,
    pub cancelled: Decimal,
}

impl BatchSupply {
    /// The total pool ever issued into this batch. Non-decreasing.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.tradable + self.retired + self.cancelled
    }
}

/// Per-(address, batch) balance, partitioned into tradable, retired, and
/// escrowed pools.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchBalance {
    pub tradable: Decimal,
    pub retired: Decimal,
    pub escrowed: Decimal,
}

impl BatchBalance {
    /// Whether this entry holds no value in any pool.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.tradable.is_zero() && self.retired.is_zero() && self.escrowed.is_zero()
    }
}

/// A passive sell order holding escrowed credits at a declared ask.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellOrder {
    /// Monotonic order id, unique across the module's lifetime.
    pub id: u64,
    pub seller: Address,
    pub batch_key: u64,
    /// Remaining quantity; the same amount sits in the seller's escrow.
    pub quantity: Decimal,
    pub ask: Coin,
    /// When true, buyers may keep the credits tradable; otherwise every
    /// fill auto-retires.
    pub disable_auto_retire: bool,
    pub expiration: Option<DateTime<Utc>>,
}

impl SellOrder {
    /// Whether the order is past its expiration at the given block time.
    #[must_use]
    pub fn is_expired(&self, block_time: DateTime<Utc>) -> bool {
        self.expiration.is_some_and(|exp| block_time >= exp)
    }
}

/// An attested reference to the off-chain event that authorized an
/// on-chain mint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginTx {
    /// Ethereum transaction hash of the off-chain event.
    pub id: String,
    /// Source chain tag. `polygon` is the only accepted value.
    pub source: String,
    /// Address of the contract that emitted the event.
    pub contract: String,
    /// Optional free-form note.
    #[serde(default)]
    pub note: String,
}

impl OriginTx {
    /// Validate all origin tx fields for the bridge-receive path.
    ///
    /// # Errors
    /// Returns [`EcoError::InvalidRequest`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        eth::validate_eth_tx_hash(&self.id)?;
        if self.source != BRIDGE_SOURCE_POLYGON {
            return Err(EcoError::InvalidRequest(format!(
                "origin tx source must be {BRIDGE_SOURCE_POLYGON}: got {}",
                self.source
            )));
        }
        if self.contract.is_empty() {
            return Err(EcoError::InvalidRequest(
                "origin tx contract cannot be empty".into(),
            ));
        }
        eth::validate_eth_contract_addr(&self.contract)
    }
}
