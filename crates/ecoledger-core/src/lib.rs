//! # ecoledger-core
//!
//! The batch lifecycle keeper: credit class and project creation, batch
//! issuance, sends with per-line retirement, retire, cancel, and the
//! bridge intake.
//!
//! Every handler validates its message, checks authorization against the
//! current state, and then applies its writes through
//! [`ecoledger_state::atomically`], so a failure anywhere leaves the
//! state untouched. Payment coins move through the [`ecoledger_types::Bank`]
//! collaborator inside the same transaction.

mod batch;
mod bridge;
mod keeper;

pub use keeper::CoreKeeper;
