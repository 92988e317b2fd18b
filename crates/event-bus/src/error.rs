//! Bus error types.

use thiserror::Error;

/// Errors produced by a subscriber during dispatch.
///
/// A `HandlerError` never propagates to the publisher: the bus catches it,
/// reports it to the diagnostics sink, and continues with the remaining
/// subscribers. Returning one is how a handler signals "this delivery
/// failed" without breaking the saga for anyone else.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The handler could not decode the event payload.
    #[error("payload decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The handler's own processing failed.
    #[error("handler failed: {0}")]
    Failed(String),
}

impl HandlerError {
    /// Creates a processing failure from any displayable error.
    pub fn failed(reason: impl std::fmt::Display) -> Self {
        HandlerError::Failed(reason.to_string())
    }
}

/// Convenience type alias for handler results.
pub type Result<T> = std::result::Result<T, HandlerError>;
