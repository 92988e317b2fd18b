//! The topic registry and dispatch loop.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::Utc;
use common::SubscriptionId;
use futures_util::FutureExt;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::diagnostics::{DiagnosticsSink, DispatchFailure, TracingSink};
use crate::event::Event;
use crate::handler::EventHandler;

#[derive(Clone)]
struct Subscription {
    id: SubscriptionId,
    handler: Arc<dyn EventHandler>,
}

/// Proof of a registration, required to unsubscribe.
///
/// The handle identifies exactly one subscription; two registrations of the
/// same handler value get distinct handles and are removed independently.
#[derive(Debug, Clone)]
pub struct SubscriptionHandle {
    topic: String,
    id: SubscriptionId,
}

impl SubscriptionHandle {
    /// The topic this subscription is registered on.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// The stable identity of this subscription.
    pub fn id(&self) -> SubscriptionId {
        self.id
    }
}

/// Named-topic publish/subscribe bus with synchronous, isolated dispatch.
///
/// Cloning is cheap; all clones share the same topic registry.
#[derive(Clone)]
pub struct EventBus {
    topics: Arc<RwLock<HashMap<String, Vec<Subscription>>>>,
    sink: Arc<dyn DiagnosticsSink>,
}

impl EventBus {
    /// Creates a bus that reports handler failures via `tracing`.
    pub fn new() -> Self {
        Self::with_diagnostics(Arc::new(TracingSink))
    }

    /// Creates a bus with a custom diagnostics sink.
    pub fn with_diagnostics(sink: Arc<dyn DiagnosticsSink>) -> Self {
        Self {
            topics: Arc::new(RwLock::new(HashMap::new())),
            sink,
        }
    }

    /// Registers a handler for a topic.
    ///
    /// Handlers are invoked in registration order. There is no limit on the
    /// number of subscriptions per topic.
    pub async fn subscribe(
        &self,
        topic: &str,
        handler: Arc<dyn EventHandler>,
    ) -> SubscriptionHandle {
        let id = SubscriptionId::new();
        let mut topics = self.topics.write().await;
        topics
            .entry(topic.to_string())
            .or_default()
            .push(Subscription { id, handler });

        tracing::debug!(%topic, subscription_id = %id, "handler subscribed");
        SubscriptionHandle {
            topic: topic.to_string(),
            id,
        }
    }

    /// Removes the subscription identified by the handle.
    ///
    /// Unknown handles are ignored. When a topic's last subscriber leaves,
    /// the topic disappears from [`EventBus::topics`]; publishing to it
    /// remains a valid no-op.
    pub async fn unsubscribe(&self, handle: &SubscriptionHandle) {
        let mut topics = self.topics.write().await;
        if let Some(subs) = topics.get_mut(&handle.topic) {
            subs.retain(|s| s.id != handle.id);
            if subs.is_empty() {
                topics.remove(&handle.topic);
            }
        }
        tracing::debug!(topic = %handle.topic, subscription_id = %handle.id, "handler unsubscribed");
    }

    /// Publishes an event, running every current subscriber before returning.
    ///
    /// The subscriber list is snapshotted at the moment of the call, so
    /// handlers added or removed mid-dispatch do not affect this pass. The
    /// registry lock is released before any handler runs, which is what makes
    /// re-entrant publishing from inside a handler safe.
    pub async fn publish(&self, topic: &str, payload: serde_json::Value) {
        let event = Event::new(topic, payload);

        let snapshot: Vec<Subscription> = {
            let topics = self.topics.read().await;
            topics.get(topic).cloned().unwrap_or_default()
        };

        metrics::counter!("bus_events_published_total").increment(1);
        if snapshot.is_empty() {
            tracing::trace!(%topic, "published with no subscribers");
            return;
        }
        tracing::debug!(%topic, subscribers = snapshot.len(), "dispatching event");

        for sub in snapshot {
            let outcome = AssertUnwindSafe(sub.handler.handle(&event))
                .catch_unwind()
                .await;

            let error = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => e.to_string(),
                Err(panic) => panic_message(panic),
            };

            metrics::counter!("bus_handler_failures_total").increment(1);
            self.sink.handler_failure(DispatchFailure {
                topic: topic.to_string(),
                subscription_id: sub.id,
                error,
                occurred_at: Utc::now(),
            });
        }
    }

    /// Serializes a typed payload and publishes it.
    pub async fn publish_json<T: Serialize>(
        &self,
        topic: &str,
        payload: &T,
    ) -> Result<(), serde_json::Error> {
        let value = serde_json::to_value(payload)?;
        self.publish(topic, value).await;
        Ok(())
    }

    /// Returns the currently active topics, sorted. Diagnostics only.
    pub async fn topics(&self) -> Vec<String> {
        let topics = self.topics.read().await;
        let mut names: Vec<String> = topics.keys().cloned().collect();
        names.sort();
        names
    }

    /// Returns the number of subscribers on a topic. Diagnostics only.
    pub async fn subscriber_count(&self, topic: &str) -> usize {
        let topics = self.topics.read().await;
        topics.get(topic).map(Vec::len).unwrap_or(0)
    }

    /// Returns the subscription identities on a topic, in registration order.
    pub async fn subscription_ids(&self, topic: &str) -> Vec<SubscriptionId> {
        let topics = self.topics.read().await;
        topics
            .get(topic)
            .map(|subs| subs.iter().map(|s| s.id).collect())
            .unwrap_or_default()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("handler panicked: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("handler panicked: {s}")
    } else {
        "handler panicked".to_string()
    }
}
