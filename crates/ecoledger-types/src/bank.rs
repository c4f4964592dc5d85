//! The coin-transfer collaborator.
//!
//! Payment coins live in the host's bank subsystem, not in this module.
//! Keepers see the bank through the [`Bank`] trait only. The host runs
//! every message handler inside a single transactional cache: coin
//! movements performed through this trait commit or revert together with
//! the module's own state writes.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::{
    address::Address,
    coin::Coin,
    error::{EcoError, Result},
};

/// Coin-transfer primitive provided by the host chain.
pub trait Bank {
    /// Debit `coins` from `from` and credit them to `to` atomically.
    ///
    /// # Errors
    /// Returns [`EcoError::InsufficientFunds`] if `from` cannot cover the
    /// transfer.
    fn send(&mut self, from: &Address, to: &Address, coins: &[Coin]) -> Result<()>;
}

/// In-memory [`Bank`] for tests and embedders without a host chain.
#[derive(Debug, Default, Clone)]
pub struct MemoryBank {
    balances: BTreeMap<(Address, String), Decimal>,
}

impl MemoryBank {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint coins into an account.
    pub fn deposit(&mut self, addr: &Address, denom: &str, amount: Decimal) {
        *self
            .balances
            .entry((addr.clone(), denom.to_string()))
            .or_default() += amount;
    }

    /// Current balance of a (address, denom) pair.
    #[must_use]
    pub fn balance(&self, addr: &Address, denom: &str) -> Decimal {
        self.balances
            .get(&(addr.clone(), denom.to_string()))
            .copied()
            .unwrap_or_default()
    }
}

impl Bank for MemoryBank {
    fn send(&mut self, from: &Address, to: &Address, coins: &[Coin]) -> Result<()> {
        // Verify the full transfer before mutating anything.
        for coin in coins {
            let available = self.balance(from, &coin.denom);
            if available < coin.amount {
                return Err(EcoError::InsufficientFunds {
                    path: format!("bank balance of {from} in {}", coin.denom),
                    needed: coin.amount,
                    available,
                });
            }
        }
        for coin in coins {
            *self
                .balances
                .entry((from.clone(), coin.denom.clone()))
                .or_default() -= coin.amount;
            *self
                .balances
                .entry((to.clone(), coin.denom.clone()))
                .or_default() += coin.amount;
        }
        Ok(())
    }
}
