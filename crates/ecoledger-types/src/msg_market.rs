//! Marketplace messages and their basic validation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    address::validate_address,
    coin::Coin,
    dec,
    error::{EcoError, Result},
    ids,
};

fn validate_addr_field(addr: &str, path: &str) -> Result<()> {
    validate_address(addr).map_err(|e| EcoError::InvalidAddress(format!("{path}: {e}")))
}

// ---------------------------------------------------------------------------
// MsgSell
// ---------------------------------------------------------------------------

/// One new sell order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SellOrderSpec {
    pub batch_denom: String,
    pub quantity: String,
    pub ask_price: Coin,
    pub disable_auto_retire: bool,
    #[serde(default)]
    pub expiration: Option<DateTime<Utc>>,
}

/// Post one or more sell orders, escrowing the offered credits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MsgSell {
    pub seller: String,
    pub orders: Vec<SellOrderSpec>,
}

impl MsgSell {
    /// # Errors
    /// Returns a structured error naming the offending field.
    pub fn validate_basic(&self) -> Result<()> {
        validate_addr_field(&self.seller, "seller")?;
        if self.orders.is_empty() {
            return Err(EcoError::InvalidRequest("orders cannot be empty".into()));
        }
        for (i, order) in self.orders.iter().enumerate() {
            let path = format!("orders[{i}]");
            ids::validate_batch_denom(&order.batch_denom)
                .map_err(|e| EcoError::InvalidRequest(format!("{path}: {e}")))?;
            dec::positive(&order.quantity, &format!("{path}: quantity"))?;
            order.ask_price.validate(&format!("{path}: ask price"))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgSellResponse {
    pub sell_order_ids: Vec<u64>,
}

// ---------------------------------------------------------------------------
// MsgUpdateSellOrders
// ---------------------------------------------------------------------------

/// An update to one existing sell order. Unset fields keep their value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SellOrderUpdate {
    pub sell_order_id: u64,
    /// New remaining quantity. Zero is rejected — cancel instead.
    #[serde(default)]
    pub new_quantity: Option<String>,
    #[serde(default)]
    pub new_ask_price: Option<Coin>,
    #[serde(default)]
    pub new_expiration: Option<DateTime<Utc>>,
    #[serde(default)]
    pub new_disable_auto_retire: Option<bool>,
}

/// Update one or more of the signer's sell orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MsgUpdateSellOrders {
    pub seller: String,
    pub updates: Vec<SellOrderUpdate>,
}

impl MsgUpdateSellOrders {
    /// # Errors
    /// Returns a structured error naming the offending field.
    pub fn validate_basic(&self) -> Result<()> {
        validate_addr_field(&self.seller, "seller")?;
        if self.updates.is_empty() {
            return Err(EcoError::InvalidRequest("updates cannot be empty".into()));
        }
        for (i, update) in self.updates.iter().enumerate() {
            let path = format!("updates[{i}]");
            if update.sell_order_id == 0 {
                return Err(EcoError::InvalidRequest(format!(
                    "{path}: sell order id cannot be empty"
                )));
            }
            if let Some(quantity) = &update.new_quantity {
                dec::positive(quantity, &format!("{path}: new quantity"))?;
            }
            if let Some(ask) = &update.new_ask_price {
                ask.validate(&format!("{path}: new ask price"))?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgUpdateSellOrdersResponse {}

// ---------------------------------------------------------------------------
// MsgCancelSellOrder
// ---------------------------------------------------------------------------

/// Cancel one of the signer's sell orders, returning its escrow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MsgCancelSellOrder {
    pub seller: String,
    pub sell_order_id: u64,
}

impl MsgCancelSellOrder {
    /// # Errors
    /// Returns a structured error naming the offending field.
    pub fn validate_basic(&self) -> Result<()> {
        validate_addr_field(&self.seller, "seller")?;
        if self.sell_order_id == 0 {
            return Err(EcoError::InvalidRequest(
                "sell order id cannot be empty".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgCancelSellOrderResponse {}

// ---------------------------------------------------------------------------
// MsgBuyDirect
// ---------------------------------------------------------------------------

/// One direct buy against a referenced sell order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuyOrder {
    pub sell_order_id: u64,
    pub quantity: String,
    pub bid_price: Coin,
    /// Honored only if the sell order also disables auto-retire.
    pub disable_auto_retire: bool,
    /// Required iff the fill auto-retires; ignored otherwise.
    #[serde(default)]
    pub retirement_jurisdiction: String,
}

/// Fill one or more sell orders. Orders are processed in message
/// position; the whole message is atomic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MsgBuyDirect {
    pub buyer: String,
    pub orders: Vec<BuyOrder>,
}

impl MsgBuyDirect {
    /// # Errors
    /// Returns a structured error naming the offending field.
    pub fn validate_basic(&self) -> Result<()> {
        if self.buyer.is_empty() {
            return Err(EcoError::InvalidRequest("buyer cannot be empty".into()));
        }
        validate_addr_field(&self.buyer, "buyer")?;
        if self.orders.is_empty() {
            return Err(EcoError::InvalidRequest("orders cannot be empty".into()));
        }
        for (i, order) in self.orders.iter().enumerate() {
            let path = format!("orders[{i}]");
            if order.sell_order_id == 0 {
                return Err(EcoError::InvalidRequest(format!(
                    "{path}: sell order id cannot be empty"
                )));
            }
            dec::positive(&order.quantity, &format!("{path}: quantity"))?;
            order.bid_price.validate(&format!("{path}: bid price"))?;
            if !order.disable_auto_retire {
                ids::validate_jurisdiction(&order.retirement_jurisdiction)
                    .map_err(|e| EcoError::InvalidRequest(format!("{path}: {e}")))?;
            }
        }
        Ok(())
    }
}

/// The outcome of one buy order within a `MsgBuyDirect`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyOrderResult {
    pub sell_order_id: u64,
    pub seller: String,
    pub batch_denom: String,
    /// Quantity actually transferred (clamped to the sell order).
    pub quantity_filled: Decimal,
    /// Requested quantity in excess of the sell order; not carried over
    /// to other orders. Callers retry the remainder explicitly.
    pub quantity_unfilled: Decimal,
    /// Settlement payment at the ask price.
    pub total_price: Coin,
    /// Whether the fill auto-retired the credits.
    pub retired: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgBuyDirectResponse {
    pub fills: Vec<BuyOrderResult>,
}
