//! Module-wide constants for the ecoledger credit module.

/// Maximum length of any metadata field (classes, projects, batches).
pub const MAX_METADATA_LENGTH: usize = 256;

/// Maximum length of a project reference id.
pub const MAX_REFERENCE_ID_LENGTH: usize = 32;

/// Maximum length of a free-form note (e.g. a cancellation reason).
pub const MAX_NOTE_LENGTH: usize = 512;

/// Maximum decimal precision a credit type may declare.
pub const MAX_PRECISION: u32 = 6;

/// The only bridge source currently accepted for `MsgBridgeReceive`.
pub const BRIDGE_SOURCE_POLYGON: &str = "polygon";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Module name.
pub const MODULE_NAME: &str = "ecoledger";
