//! Supply conservation checks.
//!
//! Per batch, the balance table and the supply row are two views of the
//! same credits and must always agree:
//!
//! ```text
//! Σ balances.tradable + Σ balances.escrowed = supply.tradable
//! Σ balances.retired                        = supply.retired
//! ```
//!
//! A violation means a handler wrote a partial update, which the
//! all-or-nothing transaction contract is supposed to make impossible.
//! These checks exist for tests and for host-side audit hooks.

use rust_decimal::Decimal;

use ecoledger_types::{EcoError, Result};
use tracing::error;

use crate::store::State;

/// Check supply conservation for one batch.
///
/// # Errors
/// Returns [`EcoError::Internal`] describing the first mismatch found.
pub fn verify_batch(state: &State, batch_key: u64) -> Result<()> {
    let supply = state.supply(batch_key);

    let mut tradable = Decimal::ZERO;
    let mut retired = Decimal::ZERO;
    for (_, balance) in state.balances_for_batch(batch_key) {
        tradable += balance.tradable + balance.escrowed;
        retired += balance.retired;
    }

    if tradable != supply.tradable {
        error!(
            batch_key,
            %tradable,
            supply = %supply.tradable,
            "tradable supply conservation violated"
        );
        return Err(EcoError::Internal(format!(
            "batch {batch_key}: tradable balances sum to {tradable}, supply says {}",
            supply.tradable
        )));
    }
    if retired != supply.retired {
        error!(
            batch_key,
            %retired,
            supply = %supply.retired,
            "retired supply conservation violated"
        );
        return Err(EcoError::Internal(format!(
            "batch {batch_key}: retired balances sum to {retired}, supply says {}",
            supply.retired
        )));
    }
    Ok(())
}

/// Check supply conservation for every batch in the store.
///
/// # Errors
/// Returns the first violation in batch-key order.
pub fn verify_all(state: &State) -> Result<()> {
    for batch in state.batches() {
        verify_batch(state, batch.key)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use ecoledger_types::{Address, BatchBalance};
    use rust_decimal::Decimal;

    use super::*;
    use crate::balance;

    fn d(s: &str) -> Decimal {
        Decimal::from_str_exact(s).unwrap()
    }

    fn addr(s: &str) -> Address {
        Address::new(s).unwrap()
    }

    #[test]
    fn fresh_state_conserves() {
        let state = State::new();
        assert!(verify_batch(&state, 1).is_ok());
        assert!(verify_all(&state).is_ok());
    }

    #[test]
    fn moves_preserve_conservation() {
        let mut state = State::new();
        let alice = addr("regen1aqqqqqq");
        let bob = addr("regen1cqqqqqq");

        balance::issue(&mut state, &alice, 1, d("100"), d("5"));
        balance::transfer_tradable(&mut state, &alice, &bob, 1, d("30")).unwrap();
        balance::retire(&mut state, &bob, 1, d("10")).unwrap();
        balance::escrow(&mut state, &alice, 1, d("20")).unwrap();
        balance::fill_retired(&mut state, &alice, &bob, 1, d("15")).unwrap();
        balance::cancel(&mut state, &bob, 1, d("2")).unwrap();

        assert!(verify_batch(&state, 1).is_ok());
    }

    #[test]
    fn detects_tradable_mismatch() {
        let mut state = State::new();
        let alice = addr("regen1aqqqqqq");
        balance::issue(&mut state, &alice, 1, d("10"), Decimal::ZERO);

        // Corrupt the balance table directly, bypassing the primitives.
        state.set_balance(
            &alice,
            1,
            BatchBalance {
                tradable: d("11"),
                retired: Decimal::ZERO,
                escrowed: Decimal::ZERO,
            },
        );
        let err = verify_batch(&state, 1).unwrap_err();
        assert!(matches!(err, EcoError::Internal(_)));
    }

    #[test]
    fn detects_retired_mismatch() {
        let mut state = State::new();
        let alice = addr("regen1aqqqqqq");
        balance::issue(&mut state, &alice, 1, d("10"), d("1"));

        state.set_balance(
            &alice,
            1,
            BatchBalance {
                tradable: d("10"),
                retired: d("2"),
                escrowed: Decimal::ZERO,
            },
        );
        assert!(verify_batch(&state, 1).is_err());
    }
}
