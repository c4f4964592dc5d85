//! Direct buys against posted sell orders.

use chrono::{DateTime, Utc};

use ecoledger_state::{State, atomically, balance};
use ecoledger_types::{
    Address, Bank, BuyOrderResult, Coin, EcoError, MsgBuyDirect, MsgBuyDirectResponse, Result,
    dec, ids,
};
use tracing::debug;

use crate::keeper::MarketKeeper;

impl MarketKeeper {
    /// Fill sell orders at their ask price. Orders are processed in
    /// message position; the whole message is atomic.
    ///
    /// Each fill clamps to the sell order's remaining quantity and
    /// reports the dropped excess in its result; the payment is
    /// `fill · ask`, banker's-rounded to integer precision, and a fill
    /// that would cost zero is rejected. Credits auto-retire unless both
    /// sides disabled auto-retire.
    ///
    /// # Errors
    /// `NotFound`, `OrderExpired`, `BidPriceDenomMismatch`,
    /// `BidPriceTooLow`, or `InsufficientFunds` from the payment layer.
    pub fn buy_direct(
        &self,
        state: &mut State,
        bank: &mut dyn Bank,
        msg: &MsgBuyDirect,
        block_time: DateTime<Utc>,
    ) -> Result<MsgBuyDirectResponse> {
        msg.validate_basic()?;
        let buyer = Address::new(&msg.buyer)?;

        let fills = atomically(state, |tx| {
            let mut fills = Vec::with_capacity(msg.orders.len());
            for (i, buy) in msg.orders.iter().enumerate() {
                let path = format!("orders[{i}]");
                let order = tx
                    .sell_order(buy.sell_order_id)
                    .cloned()
                    .ok_or_else(|| EcoError::NotFound(format!("sell order {}", buy.sell_order_id)))?;
                if order.is_expired(block_time) {
                    return Err(EcoError::OrderExpired(order.id));
                }
                if buy.bid_price.denom != order.ask.denom {
                    return Err(EcoError::BidPriceDenomMismatch {
                        bid: buy.bid_price.denom.clone(),
                        ask: order.ask.denom.clone(),
                    });
                }
                if buy.bid_price.amount < order.ask.amount {
                    return Err(EcoError::BidPriceTooLow {
                        bid: buy.bid_price.amount,
                        ask: order.ask.amount,
                    });
                }

                let quantity = dec::positive(&buy.quantity, &format!("{path}: quantity"))?;
                let precision = tx.precision_for_batch(order.batch_key)?;
                dec::check_precision(quantity, precision, &format!("{path}: quantity"))?;

                // Clamp to the order; excess is dropped, not carried over.
                let fill = quantity.min(order.quantity);
                let unfilled = quantity - fill;

                let cost = dec::round_to_coin(fill * order.ask.amount);
                if cost.is_zero() {
                    return Err(EcoError::InvalidRequest(format!(
                        "{path}: quantity {fill} at ask {} settles to a zero payment",
                        order.ask.amount
                    )));
                }
                let payment = Coin::new(&order.ask.denom, cost);
                bank.send(&buyer, &order.seller, &[payment.clone()])?;

                let retired = !(buy.disable_auto_retire && order.disable_auto_retire);
                if retired {
                    ids::validate_jurisdiction(&buy.retirement_jurisdiction).map_err(|e| {
                        EcoError::InvalidRequest(format!(
                            "{path}: retirement jurisdiction: {e}"
                        ))
                    })?;
                    balance::fill_retired(tx, &order.seller, &buyer, order.batch_key, fill)?;
                } else {
                    balance::fill_tradable(tx, &order.seller, &buyer, order.batch_key, fill)?;
                }

                let remaining = order.quantity - fill;
                if remaining.is_zero() {
                    tx.remove_sell_order(order.id);
                } else {
                    let mut updated = order.clone();
                    updated.quantity = remaining;
                    tx.insert_sell_order(updated);
                }

                let batch_denom = tx
                    .batch(order.batch_key)
                    .map(|b| b.denom.clone())
                    .ok_or_else(|| {
                        EcoError::Internal(format!("sell order points at missing batch {}", order.batch_key))
                    })?;
                debug!(
                    buyer = %buyer,
                    seller = %order.seller,
                    batch_denom,
                    quantity = %fill,
                    total_price = %payment,
                    retired,
                    "filled sell order"
                );
                fills.push(BuyOrderResult {
                    sell_order_id: order.id,
                    seller: order.seller.to_string(),
                    batch_denom,
                    quantity_filled: fill,
                    quantity_unfilled: unfilled,
                    total_price: payment,
                    retired,
                });
            }
            Ok(fills)
        })?;

        Ok(MsgBuyDirectResponse { fills })
    }
}
