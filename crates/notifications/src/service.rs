//! The notification service and its handlers.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderId, topics};
use event_bus::{Event, EventBus, EventHandler, HandlerError, SubscriptionHandle};
use serde::Deserialize;
use tokio::sync::RwLock;

/// What a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// Sent when an order is accepted.
    OrderConfirmation,

    /// Sent when a shipment is created.
    ShippingUpdate,

    /// Sent when an order reaches `delivered` or `cancelled`.
    StatusChange,
}

/// A customer-facing notification record.
///
/// Body formatting is someone else's concern; this is the durable fact that
/// a notice was produced, with enough context to assert on in tests.
#[derive(Debug, Clone)]
pub struct Notification {
    pub order_id: Option<OrderId>,
    pub email: Option<String>,
    pub kind: NotificationKind,
    pub subject: String,
    pub sent_at: DateTime<Utc>,
}

/// Collects notifications from order lifecycle events.
///
/// Cloning is cheap; all clones share the same outbox.
#[derive(Clone, Default)]
pub struct NotificationService {
    outbox: Arc<RwLock<Vec<Notification>>>,
}

/// Loose view of any order-shaped payload. Every field is optional so a
/// partial payload still produces a (partial) notification record.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderView {
    order_id: Option<OrderId>,
    email: Option<String>,
    tracking_number: Option<String>,
    status: Option<String>,
}

impl NotificationService {
    /// Creates an empty notification service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes the service's handlers to the bus.
    pub async fn attach(&self, bus: &EventBus) -> Vec<SubscriptionHandle> {
        vec![
            bus.subscribe(
                topics::ORDER_CREATED,
                Arc::new(Notify {
                    service: self.clone(),
                    kind: NotificationKind::OrderConfirmation,
                }),
            )
            .await,
            bus.subscribe(
                topics::ORDER_SHIPPED,
                Arc::new(Notify {
                    service: self.clone(),
                    kind: NotificationKind::ShippingUpdate,
                }),
            )
            .await,
            bus.subscribe(
                topics::ORDER_STATUS_UPDATED,
                Arc::new(Notify {
                    service: self.clone(),
                    kind: NotificationKind::StatusChange,
                }),
            )
            .await,
        ]
    }

    /// Returns all notifications in the order they were produced.
    pub async fn all(&self) -> Vec<Notification> {
        self.outbox.read().await.clone()
    }

    /// Returns notifications about one order.
    pub async fn for_order(&self, order_id: &OrderId) -> Vec<Notification> {
        self.outbox
            .read()
            .await
            .iter()
            .filter(|n| n.order_id.as_ref() == Some(order_id))
            .cloned()
            .collect()
    }

    /// Returns the number of notifications produced so far.
    pub async fn count(&self) -> usize {
        self.outbox.read().await.len()
    }

    async fn record(&self, kind: NotificationKind, view: OrderView) {
        let order_label = view
            .order_id
            .as_ref()
            .map(OrderId::to_string)
            .unwrap_or_else(|| "unknown".to_string());

        let subject = match kind {
            NotificationKind::OrderConfirmation => {
                format!("Order {order_label} confirmed")
            }
            NotificationKind::ShippingUpdate => match &view.tracking_number {
                Some(tracking) => format!("Order {order_label} shipped ({tracking})"),
                None => format!("Order {order_label} shipped"),
            },
            NotificationKind::StatusChange => {
                let status = view.status.as_deref().unwrap_or("updated");
                format!("Order {order_label} {status}")
            }
        };

        tracing::info!(order_id = %order_label, %subject, "notification produced");
        self.outbox.write().await.push(Notification {
            order_id: view.order_id,
            email: view.email,
            kind,
            subject,
            sent_at: Utc::now(),
        });
    }
}

struct Notify {
    service: NotificationService,
    kind: NotificationKind,
}

#[async_trait]
impl EventHandler for Notify {
    async fn handle(&self, event: &Event) -> Result<(), HandlerError> {
        // Never fail dispatch over a notification: bad payloads are skipped.
        let view: OrderView = match event.decode() {
            Ok(view) => view,
            Err(e) => {
                tracing::debug!(topic = %event.topic, error = %e, "unreadable payload skipped");
                return Ok(());
            }
        };

        if self.kind == NotificationKind::StatusChange
            && !matches!(view.status.as_deref(), Some("delivered") | Some("cancelled"))
        {
            return Ok(());
        }

        self.service.record(self.kind, view).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn wired() -> (EventBus, NotificationService) {
        let bus = EventBus::new();
        let service = NotificationService::new();
        service.attach(&bus).await;
        (bus, service)
    }

    #[tokio::test]
    async fn test_order_created_produces_confirmation() {
        let (bus, service) = wired().await;

        bus.publish(
            topics::ORDER_CREATED,
            serde_json::json!({"orderId": "ORD1", "email": "a@x.com", "item": "Widget"}),
        )
        .await;

        let notifications = service.all().await;
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].kind, NotificationKind::OrderConfirmation);
        assert_eq!(notifications[0].email.as_deref(), Some("a@x.com"));
        assert_eq!(notifications[0].subject, "Order ORD1 confirmed");
    }

    #[tokio::test]
    async fn test_shipped_includes_tracking_number() {
        let (bus, service) = wired().await;

        bus.publish(
            topics::ORDER_SHIPPED,
            serde_json::json!({"orderId": "ORD1", "trackingNumber": "TRK-1-ABCDEF"}),
        )
        .await;

        let notifications = service.all().await;
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].kind, NotificationKind::ShippingUpdate);
        assert!(notifications[0].subject.contains("TRK-1-ABCDEF"));
    }

    #[tokio::test]
    async fn test_status_updates_filtered_to_terminal_states() {
        let (bus, service) = wired().await;

        for status in ["reserved", "shipped", "delivered", "cancelled"] {
            bus.publish(
                topics::ORDER_STATUS_UPDATED,
                serde_json::json!({"orderId": "ORD1", "status": status}),
            )
            .await;
        }

        let notifications = service.all().await;
        assert_eq!(notifications.len(), 2);
        assert_eq!(notifications[0].subject, "Order ORD1 delivered");
        assert_eq!(notifications[1].subject, "Order ORD1 cancelled");
    }

    #[tokio::test]
    async fn test_malformed_payload_is_skipped_without_error() {
        let (bus, service) = wired().await;

        bus.publish(topics::ORDER_CREATED, serde_json::json!("garbage")).await;
        bus.publish(
            topics::ORDER_CREATED,
            serde_json::json!({"orderId": "ORD2", "email": "b@x.com"}),
        )
        .await;

        // The bad payload left no record and did not block the good one.
        let notifications = service.all().await;
        assert_eq!(notifications.len(), 1);
        assert_eq!(
            notifications[0].order_id.as_ref().map(|id| id.as_str().to_string()),
            Some("ORD2".to_string())
        );
    }

    #[tokio::test]
    async fn test_for_order_filters_by_id() {
        let (bus, service) = wired().await;

        bus.publish(
            topics::ORDER_CREATED,
            serde_json::json!({"orderId": "ORD1", "email": "a@x.com"}),
        )
        .await;
        bus.publish(
            topics::ORDER_CREATED,
            serde_json::json!({"orderId": "ORD2", "email": "b@x.com"}),
        )
        .await;

        assert_eq!(service.count().await, 2);
        let for_one = service.for_order(&OrderId::new("ORD1")).await;
        assert_eq!(for_one.len(), 1);
        assert_eq!(for_one[0].email.as_deref(), Some("a@x.com"));
    }
}
