//! # ecoledger-types
//!
//! Shared types for the **ecoledger** ecological credit module.
//!
//! This crate is the leaf dependency of the workspace — every other crate
//! depends on it. It defines:
//!
//! - **Grammars**: class / project / batch identifiers, jurisdictions,
//!   Ethereum tx hashes and contract addresses ([`ids`], [`eth`])
//! - **Decimals**: exact arithmetic helpers over `rust_decimal` ([`dec`])
//! - **Entities**: [`CreditType`], [`Class`], [`Project`], [`Batch`],
//!   [`BatchSupply`], [`BatchBalance`], [`SellOrder`], [`OriginTx`]
//! - **Messages**: every state-changing message with a pure
//!   `validate_basic` ([`msg`], [`msg_market`])
//! - **Parameters**: [`CoreParams`], [`MarketParams`]
//! - **Collaborators**: the [`Bank`] coin-transfer trait
//! - **Errors**: [`EcoError`] with `ECO_ERR_` prefix codes
//! - **Sign bytes**: the canonical JSON projection ([`sign`])

pub mod address;
pub mod bank;
pub mod coin;
pub mod constants;
pub mod dec;
pub mod entity;
pub mod error;
pub mod eth;
pub mod ids;
pub mod msg;
pub mod msg_market;
pub mod params;
pub mod sign;

pub use address::Address;
pub use bank::{Bank, MemoryBank};
pub use coin::Coin;
pub use entity::*;
pub use error::{EcoError, Result};
pub use msg::*;
pub use msg_market::*;
pub use params::{CoreParams, MarketParams};

// Grammar validators and decimal helpers are accessed via their modules
// (`ids::validate_class_id`, `dec::positive`, ...) to keep call sites
// self-describing.
