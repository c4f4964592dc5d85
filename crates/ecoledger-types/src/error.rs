//! Error types for the ecoledger credit module.
//!
//! All errors use the `ECO_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Request / grammar / address errors
//! - 2xx: Authorization errors
//! - 3xx: Balance / supply errors
//! - 4xx: Not-found errors
//! - 5xx: Marketplace errors
//! - 6xx: Bridge errors
//! - 9xx: General / internal errors
//!
//! Every message handler returns either a typed response or exactly one
//! of these errors; the host discards all pending state writes on error.

use rust_decimal::Decimal;
use thiserror::Error;

/// Central error enum for all ecoledger operations.
#[derive(Debug, Error)]
pub enum EcoError {
    // =================================================================
    // Request Errors (1xx)
    // =================================================================
    /// Malformed input caught by `validate_basic` or a keeper precondition.
    /// The payload is the field path plus the reason, e.g.
    /// `orders[2]: bid price: amount must be a positive integer`.
    #[error("ECO_ERR_100: invalid request: {0}")]
    InvalidRequest(String),

    /// An address field failed to parse to the canonical address form.
    #[error("ECO_ERR_101: invalid address: {0}")]
    InvalidAddress(String),

    /// A decimal field failed to parse, was negative where it may not be,
    /// or carried more fractional digits than the credit type allows.
    #[error("ECO_ERR_102: invalid decimal: {0}")]
    InvalidDecimal(String),

    /// A string field exceeded its maximum length.
    #[error("ECO_ERR_103: max limit exceeded: {0}")]
    MaxLimitExceeded(String),

    // =================================================================
    // Authorization Errors (2xx)
    // =================================================================
    /// The signer is not permitted to perform the operation.
    #[error("ECO_ERR_200: unauthorized: {0}")]
    Unauthorized(String),

    // =================================================================
    // Balance Errors (3xx)
    // =================================================================
    /// A balance or supply pool would underflow.
    #[error("ECO_ERR_300: insufficient funds: {path}: need {needed}, have {available}")]
    InsufficientFunds {
        path: String,
        needed: Decimal,
        available: Decimal,
    },

    // =================================================================
    // Not-Found Errors (4xx)
    // =================================================================
    /// A referenced entity does not exist.
    #[error("ECO_ERR_400: not found: {0}")]
    NotFound(String),

    // =================================================================
    // Marketplace Errors (5xx)
    // =================================================================
    /// The referenced sell order is past its expiration.
    #[error("ECO_ERR_500: sell order {0} has expired")]
    OrderExpired(u64),

    /// The bid denom does not match the sell order's ask denom.
    #[error("ECO_ERR_501: bid price denom {bid} does not match ask price denom {ask}")]
    BidPriceDenomMismatch { bid: String, ask: String },

    /// The bid amount is below the sell order's ask amount.
    #[error("ECO_ERR_502: bid price {bid} is below ask price {ask}")]
    BidPriceTooLow { bid: Decimal, ask: Decimal },

    /// The payment denom is not in the allowed-denoms parameter.
    #[error("ECO_ERR_503: denom {0} is not allowed to be used in sell orders")]
    DenomNotAllowed(String),

    // =================================================================
    // Bridge Errors (6xx)
    // =================================================================
    /// Credits were already issued for this origin tx. Non-fatal for
    /// `bridge_receive`, which resolves it to the existing batch denom.
    // The field is named `source_chain` rather than `source` because
    // thiserror reserves a field named `source` for error-chaining.
    #[error("ECO_ERR_600: credits already issued for origin tx {id} from {source_chain}")]
    DuplicateBridgeReceive { id: String, source_chain: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("ECO_ERR_900: internal error: {0}")]
    Internal(String),
}

impl EcoError {
    /// Stable numeric code for clients. Codes never change meaning
    /// across releases.
    #[must_use]
    pub fn code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 100,
            Self::InvalidAddress(_) => 101,
            Self::InvalidDecimal(_) => 102,
            Self::MaxLimitExceeded(_) => 103,
            Self::Unauthorized(_) => 200,
            Self::InsufficientFunds { .. } => 300,
            Self::NotFound(_) => 400,
            Self::OrderExpired(_) => 500,
            Self::BidPriceDenomMismatch { .. } => 501,
            Self::BidPriceTooLow { .. } => 502,
            Self::DenomNotAllowed(_) => 503,
            Self::DuplicateBridgeReceive { .. } => 600,
            Self::Internal(_) => 900,
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, EcoError>;
