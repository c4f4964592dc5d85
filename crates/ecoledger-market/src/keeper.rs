//! The marketplace keeper.

use ecoledger_types::MarketParams;

/// The marketplace keeper: sell-order management and direct buys.
/// Holds a read-only snapshot of the marketplace governance params.
#[derive(Debug, Clone)]
pub struct MarketKeeper {
    pub(crate) params: MarketParams,
}

impl MarketKeeper {
    #[must_use]
    pub fn new(params: MarketParams) -> Self {
        Self { params }
    }
}
