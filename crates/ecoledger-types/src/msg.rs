//! Batch-lifecycle messages and their basic validation.
//!
//! Every state-changing message exposes a pure `validate_basic` that runs
//! before any state access: it parses addresses, checks grammars and
//! length bounds, and parses amounts, but never consults the store.
//! Error strings carry the field path (e.g. `credits[1]: retirement
//! jurisdiction: ...`) so callers can surface per-element diagnostics.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    address::validate_address,
    constants::{MAX_METADATA_LENGTH, MAX_NOTE_LENGTH, MAX_REFERENCE_ID_LENGTH},
    dec,
    entity::OriginTx,
    error::{EcoError, Result},
    ids,
};

fn validate_metadata(metadata: &str, path: &str, required: bool) -> Result<()> {
    if required && metadata.is_empty() {
        return Err(EcoError::InvalidRequest(format!(
            "{path}: metadata cannot be empty"
        )));
    }
    if metadata.len() > MAX_METADATA_LENGTH {
        return Err(EcoError::MaxLimitExceeded(format!(
            "{path}: metadata: max length {MAX_METADATA_LENGTH}"
        )));
    }
    Ok(())
}

fn validate_addr_field(addr: &str, path: &str) -> Result<()> {
    validate_address(addr).map_err(|e| EcoError::InvalidAddress(format!("{path}: {e}")))
}

// ---------------------------------------------------------------------------
// MsgCreateClass
// ---------------------------------------------------------------------------

/// Create a credit class under an existing credit type. The signer
/// becomes the class admin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MsgCreateClass {
    pub admin: String,
    pub issuers: Vec<String>,
    pub metadata: String,
    pub credit_type_abbrev: String,
}

impl MsgCreateClass {
    /// # Errors
    /// Returns a structured error naming the offending field.
    pub fn validate_basic(&self) -> Result<()> {
        validate_addr_field(&self.admin, "admin")?;
        if self.issuers.is_empty() {
            return Err(EcoError::InvalidRequest("issuers cannot be empty".into()));
        }
        for (i, issuer) in self.issuers.iter().enumerate() {
            validate_addr_field(issuer, &format!("issuers[{i}]"))?;
            if self.issuers[..i].contains(issuer) {
                return Err(EcoError::InvalidRequest(format!(
                    "issuers[{i}]: duplicate issuer {issuer}"
                )));
            }
        }
        validate_metadata(&self.metadata, "class", true)?;
        ids::validate_credit_type_abbrev(&self.credit_type_abbrev)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgCreateClassResponse {
    pub class_id: String,
}

// ---------------------------------------------------------------------------
// MsgCreateProject
// ---------------------------------------------------------------------------

/// Create a project under a class. Only the class admin may create.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MsgCreateProject {
    pub admin: String,
    pub class_id: String,
    pub metadata: String,
    pub jurisdiction: String,
    pub reference_id: String,
}

impl MsgCreateProject {
    /// # Errors
    /// Returns a structured error naming the offending field.
    pub fn validate_basic(&self) -> Result<()> {
        validate_addr_field(&self.admin, "admin")?;
        ids::validate_class_id(&self.class_id)?;
        validate_metadata(&self.metadata, "project", false)?;
        ids::validate_jurisdiction(&self.jurisdiction)?;
        if self.reference_id.len() > MAX_REFERENCE_ID_LENGTH {
            return Err(EcoError::MaxLimitExceeded(format!(
                "project reference id: max length {MAX_REFERENCE_ID_LENGTH}"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgCreateProjectResponse {
    pub project_id: String,
}

// ---------------------------------------------------------------------------
// MsgCreateBatch
// ---------------------------------------------------------------------------

/// One issuance line of a new batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchIssuance {
    pub recipient: String,
    /// Decimal string; empty reads as zero.
    #[serde(default)]
    pub tradable_amount: String,
    /// Decimal string; empty reads as zero.
    #[serde(default)]
    pub retired_amount: String,
    /// Required iff `retired_amount` is non-zero.
    #[serde(default)]
    pub retirement_jurisdiction: String,
}

impl BatchIssuance {
    fn validate(&self, path: &str) -> Result<()> {
        validate_addr_field(&self.recipient, &format!("{path}: recipient"))?;
        let tradable =
            dec::non_negative_or_zero(&self.tradable_amount, &format!("{path}: tradable amount"))?;
        let retired =
            dec::non_negative_or_zero(&self.retired_amount, &format!("{path}: retired amount"))?;
        if tradable.is_zero() && retired.is_zero() {
            return Err(EcoError::InvalidRequest(format!(
                "{path}: tradable amount or retired amount required"
            )));
        }
        if !retired.is_zero() {
            ids::validate_jurisdiction(&self.retirement_jurisdiction).map_err(|e| {
                EcoError::InvalidRequest(format!("{path}: retirement jurisdiction: {e}"))
            })?;
        }
        Ok(())
    }
}

/// Issue a new credit batch under a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MsgCreateBatch {
    pub issuer: String,
    pub project_id: String,
    pub issuance: Vec<BatchIssuance>,
    pub metadata: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// When false, no further minting into this batch is permitted.
    pub open: bool,
    /// Present only for batches minted on behalf of a bridge.
    #[serde(default)]
    pub origin_tx: Option<OriginTx>,
}

impl MsgCreateBatch {
    /// # Errors
    /// Returns a structured error naming the offending field.
    pub fn validate_basic(&self) -> Result<()> {
        validate_addr_field(&self.issuer, "issuer")?;
        ids::validate_project_id(&self.project_id)?;
        if self.issuance.is_empty() {
            return Err(EcoError::InvalidRequest("issuance cannot be empty".into()));
        }
        for (i, entry) in self.issuance.iter().enumerate() {
            entry.validate(&format!("issuance[{i}]"))?;
        }
        validate_metadata(&self.metadata, "batch", false)?;
        if self.start_date > self.end_date {
            return Err(EcoError::InvalidRequest(
                "batch start date cannot be after batch end date".into(),
            ));
        }
        if let Some(origin_tx) = &self.origin_tx {
            origin_tx.validate()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgCreateBatchResponse {
    pub batch_denom: String,
}

// ---------------------------------------------------------------------------
// MsgSend
// ---------------------------------------------------------------------------

/// One credit line of a send.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendCredits {
    pub batch_denom: String,
    /// Decimal string; empty reads as zero.
    #[serde(default)]
    pub tradable_amount: String,
    /// Decimal string; empty reads as zero. A non-zero retired amount is
    /// retired directly into the recipient's balance.
    #[serde(default)]
    pub retired_amount: String,
    #[serde(default)]
    pub retirement_jurisdiction: String,
}

/// Transfer tradable credits, optionally retiring part of them on
/// receipt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MsgSend {
    pub sender: String,
    pub recipient: String,
    pub credits: Vec<SendCredits>,
}

impl MsgSend {
    /// # Errors
    /// Returns a structured error naming the offending field.
    pub fn validate_basic(&self) -> Result<()> {
        validate_addr_field(&self.sender, "sender")?;
        validate_addr_field(&self.recipient, "recipient")?;
        if self.credits.is_empty() {
            return Err(EcoError::InvalidRequest("credits cannot be empty".into()));
        }
        for (i, credits) in self.credits.iter().enumerate() {
            let path = format!("credits[{i}]");
            ids::validate_batch_denom(&credits.batch_denom)
                .map_err(|e| EcoError::InvalidRequest(format!("{path}: {e}")))?;
            let tradable = dec::non_negative_or_zero(
                &credits.tradable_amount,
                &format!("{path}: tradable amount"),
            )?;
            let retired = dec::non_negative_or_zero(
                &credits.retired_amount,
                &format!("{path}: retired amount"),
            )?;
            if tradable.is_zero() && retired.is_zero() {
                return Err(EcoError::InvalidRequest(format!(
                    "{path}: tradable amount or retired amount required"
                )));
            }
            if !retired.is_zero() {
                ids::validate_jurisdiction(&credits.retirement_jurisdiction).map_err(|e| {
                    EcoError::InvalidRequest(format!("{path}: retirement jurisdiction: {e}"))
                })?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgSendResponse {}

// ---------------------------------------------------------------------------
// MsgRetire / MsgCancel
// ---------------------------------------------------------------------------

/// A (batch denom, amount) pair used by retire and cancel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credits {
    pub batch_denom: String,
    pub amount: String,
}

impl Credits {
    fn validate(&self, path: &str) -> Result<()> {
        ids::validate_batch_denom(&self.batch_denom)
            .map_err(|e| EcoError::InvalidRequest(format!("{path}: {e}")))?;
        dec::positive(&self.amount, &format!("{path}: amount"))?;
        Ok(())
    }
}

/// Terminally move credits from tradable to retired with an attested
/// jurisdiction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MsgRetire {
    pub owner: String,
    pub credits: Vec<Credits>,
    pub jurisdiction: String,
}

impl MsgRetire {
    /// # Errors
    /// Returns a structured error naming the offending field.
    pub fn validate_basic(&self) -> Result<()> {
        validate_addr_field(&self.owner, "owner")?;
        if self.credits.is_empty() {
            return Err(EcoError::InvalidRequest("credits cannot be empty".into()));
        }
        for (i, credits) in self.credits.iter().enumerate() {
            credits.validate(&format!("credits[{i}]"))?;
        }
        ids::validate_jurisdiction(&self.jurisdiction)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgRetireResponse {}

/// Destroy credits from supply entirely (e.g. to reflect an off-chain
/// burn).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MsgCancel {
    pub owner: String,
    pub credits: Vec<Credits>,
    pub reason: String,
}

impl MsgCancel {
    /// # Errors
    /// Returns a structured error naming the offending field.
    pub fn validate_basic(&self) -> Result<()> {
        validate_addr_field(&self.owner, "owner")?;
        if self.credits.is_empty() {
            return Err(EcoError::InvalidRequest("credits cannot be empty".into()));
        }
        for (i, credits) in self.credits.iter().enumerate() {
            credits.validate(&format!("credits[{i}]"))?;
        }
        if self.reason.is_empty() {
            return Err(EcoError::InvalidRequest("reason cannot be empty".into()));
        }
        if self.reason.len() > MAX_NOTE_LENGTH {
            return Err(EcoError::MaxLimitExceeded(format!(
                "reason: max length {MAX_NOTE_LENGTH}"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgCancelResponse {}

// ---------------------------------------------------------------------------
// MsgBridgeReceive
// ---------------------------------------------------------------------------

/// Project description carried by a bridge receipt. The project is
/// resolved by `(class, reference_id)` or created on first receipt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeProject {
    pub reference_id: String,
    pub jurisdiction: String,
    pub metadata: String,
}

/// Batch description carried by a bridge receipt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeBatch {
    pub recipient: String,
    pub amount: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub metadata: String,
}

/// Mint a batch from an attested off-chain source. Idempotent by origin
/// tx: replaying the same `(source, id)` returns the existing batch
/// denom and writes nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MsgBridgeReceive {
    pub issuer: String,
    pub class_id: String,
    pub project: BridgeProject,
    pub batch: BridgeBatch,
    pub origin_tx: OriginTx,
}

impl MsgBridgeReceive {
    /// # Errors
    /// Returns a structured error naming the offending field.
    pub fn validate_basic(&self) -> Result<()> {
        validate_addr_field(&self.issuer, "issuer")?;
        ids::validate_class_id(&self.class_id)?;

        // project validation
        if self.project.reference_id.is_empty() {
            return Err(EcoError::InvalidRequest(
                "project reference id cannot be empty".into(),
            ));
        }
        if self.project.reference_id.len() > MAX_REFERENCE_ID_LENGTH {
            return Err(EcoError::MaxLimitExceeded(format!(
                "project reference id: max length {MAX_REFERENCE_ID_LENGTH}"
            )));
        }
        ids::validate_jurisdiction(&self.project.jurisdiction)?;
        validate_metadata(&self.project.metadata, "project", true)?;

        // batch validation
        validate_addr_field(&self.batch.recipient, "batch recipient")?;
        dec::positive(&self.batch.amount, "batch amount")?;
        if self.batch.start_date > self.batch.end_date {
            return Err(EcoError::InvalidRequest(
                "batch start date cannot be after batch end date".into(),
            ));
        }
        validate_metadata(&self.batch.metadata, "batch", true)?;

        // origin tx validation
        self.origin_tx.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgBridgeReceiveResponse {
    pub batch_denom: String,
    pub project_id: String,
}
