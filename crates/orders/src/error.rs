//! Order registry error types.

use common::OrderId;
use thiserror::Error;

/// Errors that can occur during order registry operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// A required field is missing or empty. The caller must fix the input;
    /// retrying the same request cannot succeed.
    #[error("missing required field: {field}")]
    Validation { field: &'static str },

    /// The order ID is already taken. The caller decides whether to treat
    /// this as an idempotent no-op or a hard failure; the registry never
    /// overwrites the existing record.
    #[error("duplicate order: {0}")]
    DuplicateOrder(OrderId),

    /// Serialization error while publishing.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience type alias for registry results.
pub type Result<T> = std::result::Result<T, OrderError>;
