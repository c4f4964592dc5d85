//! # ecoledger-state
//!
//! The persisted state of the credit module and the primitives that
//! mutate it:
//!
//! - [`store::State`]: every table (credit types, classes, projects,
//!   batches, supplies, balances, sell orders, origin txs) plus the
//!   persisted sequences, all over `BTreeMap` for deterministic order
//! - [`store::atomically`]: the all-or-nothing transaction wrapper
//! - [`balance`]: exact balance/supply moves (issue, transfer, retire,
//!   cancel, escrow, fill)
//! - [`invariant`]: supply conservation checks
//! - [`query`]: keyset-paginated read queries

pub mod balance;
pub mod invariant;
pub mod query;
pub mod store;

pub use query::{Page, PageRequest};
pub use store::{State, atomically};
