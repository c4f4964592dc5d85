//! Balance and supply mutation primitives.
//!
//! Every keeper operation is composed from these moves. Each primitive
//! is exact decimal arithmetic and refuses to drive any pool negative;
//! the sum invariants of the batch hold after every successful call:
//!
//! ```text
//! Σ balances.tradable + Σ balances.escrowed = supply.tradable
//! Σ balances.retired                        = supply.retired
//! ```

use rust_decimal::Decimal;

use ecoledger_types::{Address, Result, dec};

use crate::store::State;

/// Mint issuance into a recipient's balance and the batch supply.
pub fn issue(
    state: &mut State,
    recipient: &Address,
    batch_key: u64,
    tradable: Decimal,
    retired: Decimal,
) {
    let mut balance = state.balance(recipient, batch_key);
    balance.tradable += tradable;
    balance.retired += retired;
    state.set_balance(recipient, batch_key, balance);

    let mut supply = state.supply(batch_key);
    supply.tradable += tradable;
    supply.retired += retired;
    state.set_supply(batch_key, supply);
}

/// Move tradable credits between two holders. Supply is unchanged.
///
/// # Errors
/// Returns [`ecoledger_types::EcoError::InsufficientFunds`] on underflow.
pub fn transfer_tradable(
    state: &mut State,
    from: &Address,
    to: &Address,
    batch_key: u64,
    amount: Decimal,
) -> Result<()> {
    let mut sender = state.balance(from, batch_key);
    sender.tradable = dec::checked_sub(sender.tradable, amount, "tradable balance")?;
    state.set_balance(from, batch_key, sender);

    let mut recipient = state.balance(to, batch_key);
    recipient.tradable += amount;
    state.set_balance(to, batch_key, recipient);
    Ok(())
}

/// Move tradable credits from `from` into `to`'s retired pool,
/// retiring them at the supply level as well.
///
/// # Errors
/// Returns [`ecoledger_types::EcoError::InsufficientFunds`] on underflow.
pub fn transfer_retired(
    state: &mut State,
    from: &Address,
    to: &Address,
    batch_key: u64,
    amount: Decimal,
) -> Result<()> {
    let mut sender = state.balance(from, batch_key);
    sender.tradable = dec::checked_sub(sender.tradable, amount, "tradable balance")?;
    state.set_balance(from, batch_key, sender);

    let mut recipient = state.balance(to, batch_key);
    recipient.retired += amount;
    state.set_balance(to, batch_key, recipient);

    retire_supply(state, batch_key, amount)
}

/// Retire an owner's own tradable credits.
///
/// # Errors
/// Returns [`ecoledger_types::EcoError::InsufficientFunds`] on underflow.
pub fn retire(state: &mut State, owner: &Address, batch_key: u64, amount: Decimal) -> Result<()> {
    let mut balance = state.balance(owner, batch_key);
    balance.tradable = dec::checked_sub(balance.tradable, amount, "tradable balance")?;
    balance.retired += amount;
    state.set_balance(owner, batch_key, balance);

    retire_supply(state, batch_key, amount)
}

/// Cancel an owner's tradable credits, destroying them from supply.
///
/// # Errors
/// Returns [`ecoledger_types::EcoError::InsufficientFunds`] on underflow.
pub fn cancel(state: &mut State, owner: &Address, batch_key: u64, amount: Decimal) -> Result<()> {
    let mut balance = state.balance(owner, batch_key);
    balance.tradable = dec::checked_sub(balance.tradable, amount, "tradable balance")?;
    state.set_balance(owner, batch_key, balance);

    let mut supply = state.supply(batch_key);
    supply.tradable = dec::checked_sub(supply.tradable, amount, "tradable supply")?;
    supply.cancelled += amount;
    state.set_supply(batch_key, supply);
    Ok(())
}

/// Lock an owner's tradable credits into escrow (sell-order creation).
///
/// # Errors
/// Returns [`ecoledger_types::EcoError::InsufficientFunds`] on underflow.
pub fn escrow(state: &mut State, owner: &Address, batch_key: u64, amount: Decimal) -> Result<()> {
    let mut balance = state.balance(owner, batch_key);
    balance.tradable = dec::checked_sub(balance.tradable, amount, "tradable balance")?;
    balance.escrowed += amount;
    state.set_balance(owner, batch_key, balance);
    Ok(())
}

/// Release escrowed credits back to tradable (cancel / expire / shrink).
///
/// # Errors
/// Returns [`ecoledger_types::EcoError::InsufficientFunds`] on underflow.
pub fn unescrow(state: &mut State, owner: &Address, batch_key: u64, amount: Decimal) -> Result<()> {
    let mut balance = state.balance(owner, batch_key);
    balance.escrowed = dec::checked_sub(balance.escrowed, amount, "escrowed balance")?;
    balance.tradable += amount;
    state.set_balance(owner, batch_key, balance);
    Ok(())
}

/// Settle a fill without retirement: seller escrow → buyer tradable.
///
/// # Errors
/// Returns [`ecoledger_types::EcoError::InsufficientFunds`] on underflow.
pub fn fill_tradable(
    state: &mut State,
    seller: &Address,
    buyer: &Address,
    batch_key: u64,
    amount: Decimal,
) -> Result<()> {
    let mut escrowed = state.balance(seller, batch_key);
    escrowed.escrowed = dec::checked_sub(escrowed.escrowed, amount, "escrowed balance")?;
    state.set_balance(seller, batch_key, escrowed);

    let mut recipient = state.balance(buyer, batch_key);
    recipient.tradable += amount;
    state.set_balance(buyer, batch_key, recipient);
    Ok(())
}

/// Settle an auto-retiring fill: seller escrow → buyer retired, with the
/// matching supply move.
///
/// # Errors
/// Returns [`ecoledger_types::EcoError::InsufficientFunds`] on underflow.
pub fn fill_retired(
    state: &mut State,
    seller: &Address,
    buyer: &Address,
    batch_key: u64,
    amount: Decimal,
) -> Result<()> {
    let mut escrowed = state.balance(seller, batch_key);
    escrowed.escrowed = dec::checked_sub(escrowed.escrowed, amount, "escrowed balance")?;
    state.set_balance(seller, batch_key, escrowed);

    let mut recipient = state.balance(buyer, batch_key);
    recipient.retired += amount;
    state.set_balance(buyer, batch_key, recipient);

    retire_supply(state, batch_key, amount)
}

fn retire_supply(state: &mut State, batch_key: u64, amount: Decimal) -> Result<()> {
    let mut supply = state.supply(batch_key);
    supply.tradable = dec::checked_sub(supply.tradable, amount, "tradable supply")?;
    supply.retired += amount;
    state.set_supply(batch_key, supply);
    Ok(())
}
