//! Sell-order management: posting, updating, cancelling, and pruning.

use chrono::{DateTime, Utc};

use ecoledger_state::{State, atomically, balance};
use ecoledger_types::{
    Address, EcoError, MsgCancelSellOrder, MsgCancelSellOrderResponse, MsgSell, MsgSellResponse,
    MsgUpdateSellOrders, MsgUpdateSellOrdersResponse, Result, SellOrder, dec,
};
use tracing::{info, warn};

use crate::keeper::MarketKeeper;

impl MarketKeeper {
    /// Post new sell orders, escrowing the offered credits.
    ///
    /// # Errors
    /// `NotFound` for an unknown batch denom; `DenomNotAllowed` for a
    /// non-whitelisted ask denom; `InvalidRequest` for an expiration at
    /// or before the block time; `InsufficientFunds` on escrow underflow.
    pub fn sell(
        &self,
        state: &mut State,
        msg: &MsgSell,
        block_time: DateTime<Utc>,
    ) -> Result<MsgSellResponse> {
        msg.validate_basic()?;
        let seller = Address::new(&msg.seller)?;

        let order_ids = atomically(state, |tx| {
            let mut order_ids = Vec::with_capacity(msg.orders.len());
            for (i, spec) in msg.orders.iter().enumerate() {
                let path = format!("orders[{i}]");
                let batch_key = tx
                    .batch_by_denom(&spec.batch_denom)
                    .map(|b| b.key)
                    .ok_or_else(|| EcoError::NotFound(format!("batch {}", spec.batch_denom)))?;
                if !self.params.is_denom_allowed(&spec.ask_price.denom) {
                    return Err(EcoError::DenomNotAllowed(spec.ask_price.denom.clone()));
                }
                let quantity = dec::positive(&spec.quantity, &format!("{path}: quantity"))?;
                let precision = tx.precision_for_batch(batch_key)?;
                dec::check_precision(quantity, precision, &format!("{path}: quantity"))?;
                check_expiration(spec.expiration, block_time, &path)?;

                balance::escrow(tx, &seller, batch_key, quantity)?;
                let id = tx.next_sell_order_id();
                tx.insert_sell_order(SellOrder {
                    id,
                    seller: seller.clone(),
                    batch_key,
                    quantity,
                    ask: spec.ask_price.clone(),
                    disable_auto_retire: spec.disable_auto_retire,
                    expiration: spec.expiration,
                });
                order_ids.push(id);
            }
            Ok(order_ids)
        })?;

        info!(seller = %seller, ?order_ids, "posted sell orders");
        Ok(MsgSellResponse {
            sell_order_ids: order_ids,
        })
    }

    /// Update the signer's sell orders. Quantity changes move the delta
    /// between tradable and escrowed; a new ask denom must still be
    /// whitelisted.
    ///
    /// # Errors
    /// `NotFound` for an unknown order; `Unauthorized` for a non-owner;
    /// `OrderExpired` for an order past its expiration.
    pub fn update_sell_orders(
        &self,
        state: &mut State,
        msg: &MsgUpdateSellOrders,
        block_time: DateTime<Utc>,
    ) -> Result<MsgUpdateSellOrdersResponse> {
        msg.validate_basic()?;
        let seller = Address::new(&msg.seller)?;

        atomically(state, |tx| {
            for (i, update) in msg.updates.iter().enumerate() {
                let path = format!("updates[{i}]");
                let mut order = owned_order(tx, update.sell_order_id, &seller)?;
                if order.is_expired(block_time) {
                    return Err(EcoError::OrderExpired(order.id));
                }

                if let Some(ask) = &update.new_ask_price {
                    if !self.params.is_denom_allowed(&ask.denom) {
                        return Err(EcoError::DenomNotAllowed(ask.denom.clone()));
                    }
                    order.ask = ask.clone();
                }
                if let Some(quantity) = &update.new_quantity {
                    let quantity = dec::positive(quantity, &format!("{path}: new quantity"))?;
                    let precision = tx.precision_for_batch(order.batch_key)?;
                    dec::check_precision(quantity, precision, &format!("{path}: new quantity"))?;
                    if quantity > order.quantity {
                        balance::escrow(tx, &seller, order.batch_key, quantity - order.quantity)?;
                    } else if quantity < order.quantity {
                        balance::unescrow(
                            tx,
                            &seller,
                            order.batch_key,
                            order.quantity - quantity,
                        )?;
                    }
                    order.quantity = quantity;
                }
                if let Some(expiration) = update.new_expiration {
                    check_expiration(Some(expiration), block_time, &path)?;
                    order.expiration = Some(expiration);
                }
                if let Some(disable) = update.new_disable_auto_retire {
                    order.disable_auto_retire = disable;
                }
                tx.insert_sell_order(order);
            }
            Ok(())
        })?;

        info!(seller = %seller, updates = msg.updates.len(), "updated sell orders");
        Ok(MsgUpdateSellOrdersResponse {})
    }

    /// Cancel one of the signer's sell orders, returning its escrow.
    ///
    /// # Errors
    /// `NotFound` for an unknown order; `Unauthorized` for a non-owner.
    pub fn cancel_sell_order(
        &self,
        state: &mut State,
        msg: &MsgCancelSellOrder,
    ) -> Result<MsgCancelSellOrderResponse> {
        msg.validate_basic()?;
        let seller = Address::new(&msg.seller)?;

        atomically(state, |tx| {
            let order = owned_order(tx, msg.sell_order_id, &seller)?;
            balance::unescrow(tx, &seller, order.batch_key, order.quantity)?;
            tx.remove_sell_order(order.id);
            Ok(())
        })?;

        info!(seller = %seller, sell_order_id = msg.sell_order_id, "cancelled sell order");
        Ok(MsgCancelSellOrderResponse {})
    }

    /// Delete every order past its expiration, returning its escrow to
    /// the seller. Run by the host at block boundaries. Returns the ids
    /// of the pruned orders.
    ///
    /// # Errors
    /// `InsufficientFunds` on an escrow mismatch, which indicates a
    /// bookkeeping bug.
    pub fn prune_expired_orders(
        &self,
        state: &mut State,
        block_time: DateTime<Utc>,
    ) -> Result<Vec<u64>> {
        atomically(state, |tx| {
            let expired: Vec<SellOrder> = tx
                .sell_orders()
                .filter(|o| o.is_expired(block_time))
                .cloned()
                .collect();
            let mut pruned = Vec::with_capacity(expired.len());
            for order in expired {
                balance::unescrow(tx, &order.seller, order.batch_key, order.quantity)?;
                tx.remove_sell_order(order.id);
                warn!(
                    sell_order_id = order.id,
                    seller = %order.seller,
                    quantity = %order.quantity,
                    "pruned expired sell order"
                );
                pruned.push(order.id);
            }
            Ok(pruned)
        })
    }
}

/// Look up an order and check the caller owns it.
pub(crate) fn owned_order(state: &State, id: u64, seller: &Address) -> Result<SellOrder> {
    let order = state
        .sell_order(id)
        .ok_or_else(|| EcoError::NotFound(format!("sell order {id}")))?;
    if &order.seller != seller {
        return Err(EcoError::Unauthorized(format!(
            "{seller} does not own sell order {id}"
        )));
    }
    Ok(order.clone())
}

fn check_expiration(
    expiration: Option<DateTime<Utc>>,
    block_time: DateTime<Utc>,
    path: &str,
) -> Result<()> {
    if let Some(expiration) = expiration {
        if expiration <= block_time {
            return Err(EcoError::InvalidRequest(format!(
                "{path}: expiration must be after the current block time"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use chrono::{Duration, NaiveDate, TimeZone};
    use ecoledger_core::CoreKeeper;
    use ecoledger_state::invariant;
    use ecoledger_types::{
        BatchIssuance, Coin, CoreParams, CreditType, MarketParams, MemoryBank, MsgCreateBatch,
        MsgCreateClass, MsgCreateProject, SellOrderSpec, SellOrderUpdate,
    };
    use rust_decimal::Decimal;

    use super::*;

    pub(crate) const ALICE: &str = "regen1aqqqqqq";
    pub(crate) const BOB: &str = "regen1cqqqqqq";
    pub(crate) const DENOM: &str = "C01-001-20200101-20210101-001";

    pub(crate) fn d(s: &str) -> Decimal {
        Decimal::from_str_exact(s).unwrap()
    }

    pub(crate) fn addr(s: &str) -> Address {
        Address::new(s).unwrap()
    }

    pub(crate) fn block_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap()
    }

    pub(crate) fn market_keeper() -> MarketKeeper {
        MarketKeeper::new(MarketParams {
            allowed_denoms: ["uregen".to_string()].into_iter().collect(),
        })
    }

    /// Credit type C, class C01, project C01-001, batch issued 10.000000
    /// tradable to alice.
    pub(crate) fn issued_state() -> State {
        let mut state = State::new();
        state
            .add_credit_type(CreditType {
                abbreviation: "C".into(),
                precision: 6,
            })
            .unwrap();
        let core = CoreKeeper::new(CoreParams::default(), addr("regen1fqqqqqq"));
        let mut bank = MemoryBank::new();
        core.create_class(
            &mut state,
            &mut bank,
            &MsgCreateClass {
                admin: ALICE.into(),
                issuers: vec![ALICE.into()],
                metadata: "metadata".into(),
                credit_type_abbrev: "C".into(),
            },
        )
        .unwrap();
        core.create_project(
            &mut state,
            &MsgCreateProject {
                admin: ALICE.into(),
                class_id: "C01".into(),
                metadata: "metadata".into(),
                jurisdiction: "US-WA".into(),
                reference_id: String::new(),
            },
        )
        .unwrap();
        core.create_batch(
            &mut state,
            &MsgCreateBatch {
                issuer: ALICE.into(),
                project_id: "C01-001".into(),
                issuance: vec![BatchIssuance {
                    recipient: ALICE.into(),
                    tradable_amount: "10.000000".into(),
                    retired_amount: String::new(),
                    retirement_jurisdiction: String::new(),
                }],
                metadata: "metadata".into(),
                start_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
                open: false,
                origin_tx: None,
            },
            block_time(),
        )
        .unwrap();
        state
    }

    pub(crate) fn batch_key(state: &State) -> u64 {
        state.batch_by_denom(DENOM).unwrap().key
    }

    pub(crate) fn sell_msg(quantity: &str, ask: Coin) -> MsgSell {
        MsgSell {
            seller: ALICE.into(),
            orders: vec![SellOrderSpec {
                batch_denom: DENOM.into(),
                quantity: quantity.into(),
                ask_price: ask,
                disable_auto_retire: false,
                expiration: None,
            }],
        }
    }

    pub(crate) fn uregen(amount: i64) -> Coin {
        Coin::new("uregen", Decimal::new(amount, 0))
    }

    #[test]
    fn sell_escrows_and_assigns_ids() {
        let keeper = market_keeper();
        let mut state = issued_state();
        let resp = keeper
            .sell(&mut state, &sell_msg("5", uregen(10)), block_time())
            .unwrap();
        assert_eq!(resp.sell_order_ids, vec![1]);

        let key = batch_key(&state);
        let alice = state.balance(&addr(ALICE), key);
        assert_eq!(alice.tradable, d("5"));
        assert_eq!(alice.escrowed, d("5"));
        let order = state.sell_order(1).unwrap();
        assert_eq!(order.quantity, d("5"));
        assert_eq!(order.ask, uregen(10));
        invariant::verify_all(&state).unwrap();
    }

    #[test]
    fn sell_rejects_non_whitelisted_denom() {
        let keeper = market_keeper();
        let mut state = issued_state();
        let err = keeper
            .sell(
                &mut state,
                &sell_msg("5", Coin::new("uatom", Decimal::TEN)),
                block_time(),
            )
            .unwrap_err();
        assert!(matches!(err, EcoError::DenomNotAllowed(_)));
    }

    #[test]
    fn sell_rejects_over_precision_quantity() {
        let keeper = market_keeper();
        let mut state = issued_state();
        let err = keeper
            .sell(&mut state, &sell_msg("1.2345678", uregen(10)), block_time())
            .unwrap_err();
        assert!(matches!(err, EcoError::InvalidDecimal(_)));
    }

    #[test]
    fn sell_rejects_past_expiration() {
        let keeper = market_keeper();
        let mut state = issued_state();
        let mut msg = sell_msg("5", uregen(10));
        msg.orders[0].expiration = Some(block_time() - Duration::hours(1));
        assert!(keeper.sell(&mut state, &msg, block_time()).is_err());
    }

    #[test]
    fn sell_beyond_balance_fails_and_writes_nothing() {
        let keeper = market_keeper();
        let mut state = issued_state();
        let err = keeper
            .sell(&mut state, &sell_msg("11", uregen(10)), block_time())
            .unwrap_err();
        assert!(matches!(err, EcoError::InsufficientFunds { .. }));
        assert!(state.sell_order(1).is_none());
        assert_eq!(
            state.balance(&addr(ALICE), batch_key(&state)).escrowed,
            Decimal::ZERO
        );
    }

    #[test]
    fn cancel_restores_the_seller_exactly() {
        let keeper = market_keeper();
        let mut state = issued_state();
        keeper
            .sell(&mut state, &sell_msg("5", uregen(10)), block_time())
            .unwrap();
        keeper
            .cancel_sell_order(
                &mut state,
                &MsgCancelSellOrder {
                    seller: ALICE.into(),
                    sell_order_id: 1,
                },
            )
            .unwrap();

        let alice = state.balance(&addr(ALICE), batch_key(&state));
        assert_eq!(alice.tradable, d("10"));
        assert_eq!(alice.escrowed, Decimal::ZERO);
        assert!(state.sell_order(1).is_none());
        invariant::verify_all(&state).unwrap();
    }

    #[test]
    fn cancel_by_non_owner_is_unauthorized() {
        let keeper = market_keeper();
        let mut state = issued_state();
        keeper
            .sell(&mut state, &sell_msg("5", uregen(10)), block_time())
            .unwrap();
        let err = keeper
            .cancel_sell_order(
                &mut state,
                &MsgCancelSellOrder {
                    seller: BOB.into(),
                    sell_order_id: 1,
                },
            )
            .unwrap_err();
        assert!(matches!(err, EcoError::Unauthorized(_)));
        assert!(state.sell_order(1).is_some());
    }

    fn update(order_id: u64) -> SellOrderUpdate {
        SellOrderUpdate {
            sell_order_id: order_id,
            new_quantity: None,
            new_ask_price: None,
            new_expiration: None,
            new_disable_auto_retire: None,
        }
    }

    #[test]
    fn update_quantity_moves_the_escrow_delta() {
        let keeper = market_keeper();
        let mut state = issued_state();
        keeper
            .sell(&mut state, &sell_msg("5", uregen(10)), block_time())
            .unwrap();

        // Grow: 5 → 8 escrows three more.
        keeper
            .update_sell_orders(
                &mut state,
                &MsgUpdateSellOrders {
                    seller: ALICE.into(),
                    updates: vec![SellOrderUpdate {
                        new_quantity: Some("8".into()),
                        ..update(1)
                    }],
                },
                block_time(),
            )
            .unwrap();
        let key = batch_key(&state);
        assert_eq!(state.balance(&addr(ALICE), key).escrowed, d("8"));
        assert_eq!(state.sell_order(1).unwrap().quantity, d("8"));

        // Shrink: 8 → 2 releases six.
        keeper
            .update_sell_orders(
                &mut state,
                &MsgUpdateSellOrders {
                    seller: ALICE.into(),
                    updates: vec![SellOrderUpdate {
                        new_quantity: Some("2".into()),
                        ..update(1)
                    }],
                },
                block_time(),
            )
            .unwrap();
        assert_eq!(state.balance(&addr(ALICE), key).escrowed, d("2"));
        assert_eq!(state.balance(&addr(ALICE), key).tradable, d("8"));
        invariant::verify_all(&state).unwrap();
    }

    #[test]
    fn update_new_ask_must_be_whitelisted() {
        let keeper = market_keeper();
        let mut state = issued_state();
        keeper
            .sell(&mut state, &sell_msg("5", uregen(10)), block_time())
            .unwrap();
        let err = keeper
            .update_sell_orders(
                &mut state,
                &MsgUpdateSellOrders {
                    seller: ALICE.into(),
                    updates: vec![SellOrderUpdate {
                        new_ask_price: Some(Coin::new("uatom", Decimal::TEN)),
                        ..update(1)
                    }],
                },
                block_time(),
            )
            .unwrap_err();
        assert!(matches!(err, EcoError::DenomNotAllowed(_)));
    }

    #[test]
    fn update_of_expired_order_fails() {
        let keeper = market_keeper();
        let mut state = issued_state();
        let mut msg = sell_msg("5", uregen(10));
        msg.orders[0].expiration = Some(block_time() + Duration::hours(1));
        keeper.sell(&mut state, &msg, block_time()).unwrap();

        let later = block_time() + Duration::hours(2);
        let err = keeper
            .update_sell_orders(
                &mut state,
                &MsgUpdateSellOrders {
                    seller: ALICE.into(),
                    updates: vec![SellOrderUpdate {
                        new_quantity: Some("2".into()),
                        ..update(1)
                    }],
                },
                later,
            )
            .unwrap_err();
        assert!(matches!(err, EcoError::OrderExpired(1)));
    }

    #[test]
    fn prune_returns_escrow_and_deletes_expired_orders() {
        let keeper = market_keeper();
        let mut state = issued_state();
        let mut msg = sell_msg("5", uregen(10));
        msg.orders[0].expiration = Some(block_time() + Duration::hours(1));
        keeper.sell(&mut state, &msg, block_time()).unwrap();
        // A second, open-ended order survives the prune.
        keeper
            .sell(&mut state, &sell_msg("2", uregen(10)), block_time())
            .unwrap();

        let pruned = keeper
            .prune_expired_orders(&mut state, block_time() + Duration::hours(2))
            .unwrap();
        assert_eq!(pruned, vec![1]);
        assert!(state.sell_order(1).is_none());
        assert!(state.sell_order(2).is_some());

        let alice = state.balance(&addr(ALICE), batch_key(&state));
        assert_eq!(alice.tradable, d("8"));
        assert_eq!(alice.escrowed, d("2"));
        invariant::verify_all(&state).unwrap();
    }
}
