//! Bridge intake: minting batches from attested off-chain events.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use ecoledger_state::{State, atomically, balance};
use ecoledger_types::{
    Address, Batch, EcoError, MsgBridgeReceive, MsgBridgeReceiveResponse, Project, Result, dec,
    ids,
};
use tracing::info;

use crate::batch::class_precision;
use crate::keeper::CoreKeeper;

impl CoreKeeper {
    /// Mint a batch from a bridge receipt. Idempotent by origin tx:
    /// replaying the same `(source, id)` returns the existing batch
    /// denom and writes nothing.
    ///
    /// The project is resolved by `(class, reference_id)` and created on
    /// first receipt, with the bridge issuer as its admin. Bridged
    /// batches stay open.
    ///
    /// # Errors
    /// `NotFound` for an unknown class; `Unauthorized` when the issuer
    /// does not hold issuance rights on the class.
    pub fn bridge_receive(
        &self,
        state: &mut State,
        msg: &MsgBridgeReceive,
        block_time: DateTime<Utc>,
    ) -> Result<MsgBridgeReceiveResponse> {
        msg.validate_basic()?;
        let issuer = Address::new(&msg.issuer)?;

        // Replay resolves to the batch the origin tx already minted.
        if let Some(batch_key) = state.origin_tx_batch(&msg.origin_tx.source, &msg.origin_tx.id) {
            let batch = state
                .batch(batch_key)
                .ok_or_else(|| EcoError::Internal(format!("origin tx points at missing batch {batch_key}")))?;
            let project = state.project(batch.project_key).ok_or_else(|| {
                EcoError::Internal(format!("batch points at missing project {}", batch.project_key))
            })?;
            info!(
                origin_tx = msg.origin_tx.id,
                batch_denom = batch.denom,
                "bridge receive replayed, returning existing batch"
            );
            return Ok(MsgBridgeReceiveResponse {
                batch_denom: batch.denom.clone(),
                project_id: project.id.clone(),
            });
        }

        let class = state
            .class_by_id(&msg.class_id)
            .ok_or_else(|| EcoError::NotFound(format!("class {}", msg.class_id)))?;
        let class_key = class.key;
        if !state.is_class_issuer(class_key, &issuer) {
            return Err(EcoError::Unauthorized(format!(
                "{issuer} is not an issuer of class {}",
                msg.class_id
            )));
        }
        let precision = class_precision(state, class_key)?;
        let amount = dec::positive(&msg.batch.amount, "batch amount")?;
        dec::check_precision(amount, precision, "batch amount")?;

        let recipient = Address::new(&msg.batch.recipient)?;
        let (project_id, denom) = atomically(state, |tx| {
            let (project_key, project_id) =
                match tx.project_by_reference(class_key, &msg.project.reference_id) {
                    Some(project) => (project.key, project.id.clone()),
                    None => {
                        let seq = tx.next_project_seq(class_key);
                        let project_id = ids::format_project_id(&msg.class_id, seq);
                        let key = tx.insert_project(Project {
                            key: 0,
                            id: project_id.clone(),
                            class_key,
                            admin: issuer.clone(),
                            jurisdiction: msg.project.jurisdiction.clone(),
                            reference_id: msg.project.reference_id.clone(),
                            metadata: msg.project.metadata.clone(),
                        })?;
                        (key, project_id)
                    }
                };

            let seq = tx.next_batch_seq(project_key);
            let denom = ids::format_batch_denom(
                &project_id,
                msg.batch.start_date,
                msg.batch.end_date,
                seq,
            );
            let batch_key = tx.insert_batch(Batch {
                key: 0,
                denom: denom.clone(),
                project_key,
                issuer: issuer.clone(),
                start_date: msg.batch.start_date,
                end_date: msg.batch.end_date,
                issuance_date: block_time,
                open: true,
                metadata: msg.batch.metadata.clone(),
            })?;
            balance::issue(tx, &recipient, batch_key, amount, Decimal::ZERO);
            tx.register_origin_tx(&msg.origin_tx.source, &msg.origin_tx.id, batch_key)?;
            Ok((project_id, denom))
        })?;

        info!(
            origin_tx = msg.origin_tx.id,
            batch_denom = denom,
            project_id,
            recipient = %recipient,
            "bridge receive minted batch"
        );
        Ok(MsgBridgeReceiveResponse {
            batch_denom: denom,
            project_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use ecoledger_state::invariant;
    use ecoledger_types::{
        BridgeBatch, BridgeProject, CoreParams, MemoryBank, OriginTx,
    };
    use rust_decimal::Decimal;

    use super::*;
    use crate::batch::batch_key_of;
    use crate::keeper::tests::{ALICE, BOB, addr, create_class_msg, keeper, state_with_credit_type};

    fn bridge_msg(tx_id: &str) -> MsgBridgeReceive {
        MsgBridgeReceive {
            issuer: ALICE.into(),
            class_id: "C01".into(),
            project: BridgeProject {
                reference_id: "VCS-001".into(),
                jurisdiction: "US-WA".into(),
                metadata: "project metadata".into(),
            },
            batch: BridgeBatch {
                recipient: BOB.into(),
                amount: "100".into(),
                start_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
                metadata: "batch metadata".into(),
            },
            origin_tx: OriginTx {
                id: tx_id.into(),
                source: "polygon".into(),
                contract: "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed".into(),
                note: String::new(),
            },
        }
    }

    fn tx_hash(fill: &str) -> String {
        format!("0x{}", fill.repeat(32))
    }

    fn state_with_class() -> (CoreKeeper, State) {
        let keeper = keeper(CoreParams::default());
        let mut state = state_with_credit_type();
        let mut bank = MemoryBank::new();
        keeper
            .create_class(&mut state, &mut bank, &create_class_msg())
            .unwrap();
        (keeper, state)
    }

    #[test]
    fn bridge_receive_creates_project_and_open_batch() {
        let (keeper, mut state) = state_with_class();
        let resp = keeper
            .bridge_receive(&mut state, &bridge_msg(&tx_hash("ab")), Utc::now())
            .unwrap();
        assert_eq!(resp.project_id, "C01-001");
        assert_eq!(resp.batch_denom, "C01-001-20200101-20210101-001");

        let batch_key = batch_key_of(&state, &resp.batch_denom).unwrap();
        assert!(state.batch(batch_key).unwrap().open);
        assert_eq!(
            state.balance(&addr(BOB), batch_key).tradable,
            Decimal::new(100, 0)
        );
        invariant::verify_all(&state).unwrap();
    }

    #[test]
    fn bridge_receive_is_idempotent() {
        let (keeper, mut state) = state_with_class();
        let msg = bridge_msg(&tx_hash("ab"));
        let first = keeper.bridge_receive(&mut state, &msg, Utc::now()).unwrap();

        let batches_before = state.batches().count();
        let batch_key = batch_key_of(&state, &first.batch_denom).unwrap();
        let supply_before = state.supply(batch_key);

        let replay = keeper.bridge_receive(&mut state, &msg, Utc::now()).unwrap();
        assert_eq!(replay.batch_denom, first.batch_denom);
        assert_eq!(replay.project_id, first.project_id);
        assert_eq!(state.batches().count(), batches_before);
        assert_eq!(state.supply(batch_key), supply_before);
    }

    #[test]
    fn second_receipt_reuses_the_project_by_reference() {
        let (keeper, mut state) = state_with_class();
        keeper
            .bridge_receive(&mut state, &bridge_msg(&tx_hash("ab")), Utc::now())
            .unwrap();
        let resp = keeper
            .bridge_receive(&mut state, &bridge_msg(&tx_hash("cd")), Utc::now())
            .unwrap();
        assert_eq!(resp.project_id, "C01-001");
        assert_eq!(resp.batch_denom, "C01-001-20200101-20210101-002");
    }

    #[test]
    fn different_reference_creates_a_new_project() {
        let (keeper, mut state) = state_with_class();
        keeper
            .bridge_receive(&mut state, &bridge_msg(&tx_hash("ab")), Utc::now())
            .unwrap();
        let mut msg = bridge_msg(&tx_hash("cd"));
        msg.project.reference_id = "VCS-002".into();
        let resp = keeper.bridge_receive(&mut state, &msg, Utc::now()).unwrap();
        assert_eq!(resp.project_id, "C01-002");
    }

    #[test]
    fn bridge_receive_requires_issuer_role() {
        let (keeper, mut state) = state_with_class();
        let mut msg = bridge_msg(&tx_hash("ab"));
        msg.issuer = BOB.into();
        let err = keeper
            .bridge_receive(&mut state, &msg, Utc::now())
            .unwrap_err();
        assert!(matches!(err, EcoError::Unauthorized(_)));
    }

    #[test]
    fn bridge_receive_requires_known_class() {
        let (keeper, mut state) = state_with_class();
        let mut msg = bridge_msg(&tx_hash("ab"));
        msg.class_id = "C99".into();
        let err = keeper
            .bridge_receive(&mut state, &msg, Utc::now())
            .unwrap_err();
        assert!(matches!(err, EcoError::NotFound(_)));
    }
}
