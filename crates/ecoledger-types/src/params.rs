//! Governance-controlled parameters.
//!
//! Parameter governance itself is out of scope; keepers hold a snapshot
//! of these values and consult them read-only.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{address::Address, coin::Coin};

/// Parameters consulted by the batch lifecycle keeper.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreParams {
    /// Fee charged on class creation. Empty means free.
    pub credit_class_fee: Vec<Coin>,
    /// When true, only `allowed_class_creators` may create classes.
    pub allowlist_enabled: bool,
    /// Consulted iff `allowlist_enabled`.
    pub allowed_class_creators: Vec<Address>,
}

/// Parameters consulted by the marketplace keeper.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketParams {
    /// Payment denoms that may be used as ask and bid.
    pub allowed_denoms: BTreeSet<String>,
}

impl MarketParams {
    #[must_use]
    pub fn is_denom_allowed(&self, denom: &str) -> bool {
        self.allowed_denoms.contains(denom)
    }
}
