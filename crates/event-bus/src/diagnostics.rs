//! Diagnostics side channel for handler failures.
//!
//! Dispatch failures are never surfaced to publishers, so they need a
//! structured exit path. The sink is pluggable: production wiring logs via
//! `tracing`, tests use [`RecordingSink`] to assert on failures without
//! parsing log output.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use common::SubscriptionId;

/// A record of one handler failing during dispatch.
#[derive(Debug, Clone)]
pub struct DispatchFailure {
    /// Topic of the event being dispatched.
    pub topic: String,

    /// Identity of the failing subscription.
    pub subscription_id: SubscriptionId,

    /// Rendered error (or panic) message.
    pub error: String,

    /// When the failure was observed.
    pub occurred_at: DateTime<Utc>,
}

/// Receives handler failures observed by the bus.
pub trait DiagnosticsSink: Send + Sync {
    /// Called once per failed handler invocation.
    fn handler_failure(&self, failure: DispatchFailure);
}

/// Default sink: emits a `tracing` warning per failure.
#[derive(Debug, Default)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn handler_failure(&self, failure: DispatchFailure) {
        tracing::warn!(
            topic = %failure.topic,
            subscription_id = %failure.subscription_id,
            error = %failure.error,
            "handler failed during dispatch"
        );
    }
}

/// Sink that keeps every failure in memory for test assertions.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    failures: Arc<RwLock<Vec<DispatchFailure>>>,
}

impl RecordingSink {
    /// Creates a new empty recording sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all recorded failures.
    pub fn failures(&self) -> Vec<DispatchFailure> {
        self.failures.read().unwrap().clone()
    }

    /// Returns the number of recorded failures.
    pub fn failure_count(&self) -> usize {
        self.failures.read().unwrap().len()
    }
}

impl DiagnosticsSink for RecordingSink {
    fn handler_failure(&self, failure: DispatchFailure) {
        self.failures.write().unwrap().push(failure);
    }
}
