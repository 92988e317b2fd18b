//! Inventory error types.

use thiserror::Error;

/// Errors that can occur during direct ledger mutations.
///
/// Unavailable and out-of-stock conditions during reservation are not
/// errors: they are normal saga outcomes published as events, because the
/// order's publisher must never be blocked by downstream inventory state.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// Stock was added for an item that is not in the catalog.
    #[error("unknown item: {0}")]
    UnknownItem(String),

    /// Serialization error while publishing.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience type alias for ledger results.
pub type Result<T> = std::result::Result<T, InventoryError>;
