//! Batch issuance and the credit movements over issued batches.

use chrono::{DateTime, Utc};

use ecoledger_state::{State, atomically, balance};
use ecoledger_types::{
    Address, Batch, EcoError, MsgCancel, MsgCancelResponse, MsgCreateBatch,
    MsgCreateBatchResponse, MsgRetire, MsgRetireResponse, MsgSend, MsgSendResponse, Result, dec,
    ids,
};
use tracing::info;

use crate::keeper::CoreKeeper;

impl CoreKeeper {
    /// Issue a new credit batch under a project. The issuer must hold
    /// issuance rights on the parent class. The issuance date is the
    /// supplied block time.
    ///
    /// # Errors
    /// `NotFound` for an unknown project; `Unauthorized` for a
    /// non-issuer; `DuplicateBridgeReceive` when the optional origin tx
    /// was already registered.
    pub fn create_batch(
        &self,
        state: &mut State,
        msg: &MsgCreateBatch,
        block_time: DateTime<Utc>,
    ) -> Result<MsgCreateBatchResponse> {
        msg.validate_basic()?;
        let issuer = Address::new(&msg.issuer)?;

        let project = state
            .project_by_id(&msg.project_id)
            .ok_or_else(|| EcoError::NotFound(format!("project {}", msg.project_id)))?;
        let project_key = project.key;
        let class_key = project.class_key;
        if !state.is_class_issuer(class_key, &issuer) {
            return Err(EcoError::Unauthorized(format!(
                "{issuer} is not an issuer of the class of project {}",
                msg.project_id
            )));
        }
        let precision = class_precision(state, class_key)?;

        let denom = atomically(state, |tx| {
            let seq = tx.next_batch_seq(project_key);
            let denom = ids::format_batch_denom(&msg.project_id, msg.start_date, msg.end_date, seq);
            let batch_key = tx.insert_batch(Batch {
                key: 0,
                denom: denom.clone(),
                project_key,
                issuer: issuer.clone(),
                start_date: msg.start_date,
                end_date: msg.end_date,
                issuance_date: block_time,
                open: msg.open,
                metadata: msg.metadata.clone(),
            })?;

            for (i, entry) in msg.issuance.iter().enumerate() {
                let path = format!("issuance[{i}]");
                let recipient = Address::new(&entry.recipient)?;
                let tradable = dec::non_negative_or_zero(
                    &entry.tradable_amount,
                    &format!("{path}: tradable amount"),
                )?;
                let retired = dec::non_negative_or_zero(
                    &entry.retired_amount,
                    &format!("{path}: retired amount"),
                )?;
                dec::check_precision(tradable, precision, &format!("{path}: tradable amount"))?;
                dec::check_precision(retired, precision, &format!("{path}: retired amount"))?;
                balance::issue(tx, &recipient, batch_key, tradable, retired);
            }

            if let Some(origin_tx) = &msg.origin_tx {
                tx.register_origin_tx(&origin_tx.source, &origin_tx.id, batch_key)?;
            }
            Ok(denom)
        })?;

        info!(batch_denom = denom, issuer = %issuer, "created credit batch");
        Ok(MsgCreateBatchResponse { batch_denom: denom })
    }

    /// Transfer tradable credits, retiring the per-line retired portion
    /// directly into the recipient's balance. Self-send is a no-op.
    ///
    /// # Errors
    /// `NotFound` for an unknown batch denom; `InsufficientFunds` on any
    /// underflow. The whole message is atomic.
    pub fn send(&self, state: &mut State, msg: &MsgSend) -> Result<MsgSendResponse> {
        msg.validate_basic()?;
        let sender = Address::new(&msg.sender)?;
        let recipient = Address::new(&msg.recipient)?;

        atomically(state, |tx| {
            for (i, line) in msg.credits.iter().enumerate() {
                let path = format!("credits[{i}]");
                let batch_key = batch_key_of(tx, &line.batch_denom)?;
                let precision = tx.precision_for_batch(batch_key)?;
                let tradable = dec::non_negative_or_zero(
                    &line.tradable_amount,
                    &format!("{path}: tradable amount"),
                )?;
                let retired = dec::non_negative_or_zero(
                    &line.retired_amount,
                    &format!("{path}: retired amount"),
                )?;
                dec::check_precision(tradable, precision, &format!("{path}: tradable amount"))?;
                dec::check_precision(retired, precision, &format!("{path}: retired amount"))?;

                if !tradable.is_zero() {
                    balance::transfer_tradable(tx, &sender, &recipient, batch_key, tradable)?;
                }
                if !retired.is_zero() {
                    balance::transfer_retired(tx, &sender, &recipient, batch_key, retired)?;
                }
            }
            Ok(())
        })?;

        info!(sender = %sender, recipient = %recipient, lines = msg.credits.len(), "sent credits");
        Ok(MsgSendResponse {})
    }

    /// Terminally retire the owner's tradable credits under an attested
    /// jurisdiction.
    ///
    /// # Errors
    /// `NotFound` for an unknown batch denom; `InsufficientFunds` on
    /// underflow.
    pub fn retire(&self, state: &mut State, msg: &MsgRetire) -> Result<MsgRetireResponse> {
        msg.validate_basic()?;
        let owner = Address::new(&msg.owner)?;

        atomically(state, |tx| {
            for (i, line) in msg.credits.iter().enumerate() {
                let path = format!("credits[{i}]");
                let batch_key = batch_key_of(tx, &line.batch_denom)?;
                let precision = tx.precision_for_batch(batch_key)?;
                let amount = dec::positive(&line.amount, &format!("{path}: amount"))?;
                dec::check_precision(amount, precision, &format!("{path}: amount"))?;
                balance::retire(tx, &owner, batch_key, amount)?;
            }
            Ok(())
        })?;

        info!(owner = %owner, jurisdiction = msg.jurisdiction, "retired credits");
        Ok(MsgRetireResponse {})
    }

    /// Destroy the owner's tradable credits from supply entirely.
    ///
    /// # Errors
    /// `NotFound` for an unknown batch denom; `InsufficientFunds` on
    /// underflow.
    pub fn cancel(&self, state: &mut State, msg: &MsgCancel) -> Result<MsgCancelResponse> {
        msg.validate_basic()?;
        let owner = Address::new(&msg.owner)?;

        atomically(state, |tx| {
            for (i, line) in msg.credits.iter().enumerate() {
                let path = format!("credits[{i}]");
                let batch_key = batch_key_of(tx, &line.batch_denom)?;
                let precision = tx.precision_for_batch(batch_key)?;
                let amount = dec::positive(&line.amount, &format!("{path}: amount"))?;
                dec::check_precision(amount, precision, &format!("{path}: amount"))?;
                balance::cancel(tx, &owner, batch_key, amount)?;
            }
            Ok(())
        })?;

        info!(owner = %owner, reason = msg.reason, "cancelled credits");
        Ok(MsgCancelResponse {})
    }
}

pub(crate) fn batch_key_of(state: &State, denom: &str) -> Result<u64> {
    state
        .batch_by_denom(denom)
        .map(|b| b.key)
        .ok_or_else(|| EcoError::NotFound(format!("batch {denom}")))
}

pub(crate) fn class_precision(state: &State, class_key: u64) -> Result<u32> {
    let class = state
        .class(class_key)
        .ok_or_else(|| EcoError::NotFound(format!("class key {class_key}")))?;
    state
        .credit_type(&class.credit_type_abbrev)
        .map(|ct| ct.precision)
        .ok_or_else(|| EcoError::NotFound(format!("credit type {}", class.credit_type_abbrev)))
}
