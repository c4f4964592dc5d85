//! # ecoledger-market
//!
//! The marketplace keeper: passive sell orders over credit batches and
//! direct buys against them.
//!
//! Sell orders escrow the offered credits in the seller's balance; buys
//! settle payment at the ask price through the [`ecoledger_types::Bank`]
//! collaborator and move the credits out of escrow, auto-retiring them
//! unless both sides opted out. Expired orders fail lazily on access and
//! are swept by [`MarketKeeper::prune_expired_orders`] at block
//! boundaries.

mod buy;
mod keeper;
mod sell;

pub use keeper::MarketKeeper;
