//! The order registry service.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{OrderId, topics};
use event_bus::{Event, EventBus, EventHandler, HandlerError, SubscriptionHandle};
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::error::OrderError;
use crate::order::{Order, OrderRequest, StatusUpdatedPayload};
use crate::status::OrderStatus;

/// Owns the canonical order map and the status field of every order.
///
/// Cloning is cheap; all clones share the same storage.
#[derive(Clone)]
pub struct OrderRegistry {
    bus: EventBus,
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
}

impl OrderRegistry {
    /// Creates a registry publishing on the given bus.
    pub fn new(bus: EventBus) -> Self {
        Self {
            bus,
            orders: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Validates and stores a new order, then publishes `order:created`.
    ///
    /// The duplicate check and the insert happen under one write guard, so
    /// two concurrent creations with the same ID cannot both succeed.
    pub async fn create_order(&self, request: OrderRequest) -> Result<Order, OrderError> {
        let order_id = required(request.order_id, "orderId")?;
        let email = required(request.email, "email")?;
        let item = required(request.item, "item")?;

        let now = Utc::now();
        let order = Order {
            order_id: OrderId::new(order_id),
            email,
            item,
            address: request.address,
            status: OrderStatus::Created,
            created_at: now,
            last_updated: now,
        };

        {
            let mut orders = self.orders.write().await;
            if orders.contains_key(&order.order_id) {
                return Err(OrderError::DuplicateOrder(order.order_id.clone()));
            }
            orders.insert(order.order_id.clone(), order.clone());
        }

        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(order_id = %order.order_id, item = %order.item, "order created");

        // Saga entry point: everything downstream reacts to this event.
        self.bus
            .publish_json(topics::ORDER_CREATED, &order)
            .await?;

        Ok(order)
    }

    /// Sets an order's status and publishes `order:status_updated`.
    ///
    /// Unknown order IDs are silently ignored; events about orders this
    /// registry never accepted carry no obligation.
    pub async fn update_status(
        &self,
        order_id: &OrderId,
        status: OrderStatus,
    ) -> Result<(), OrderError> {
        let updated = {
            let mut orders = self.orders.write().await;
            match orders.get_mut(order_id) {
                None => {
                    tracing::debug!(%order_id, %status, "status update for unknown order ignored");
                    return Ok(());
                }
                Some(order) => {
                    order.status = status;
                    order.last_updated = Utc::now();
                    order.clone()
                }
            }
        };

        tracing::info!(%order_id, %status, "order status updated");
        self.bus
            .publish_json(
                topics::ORDER_STATUS_UPDATED,
                &StatusUpdatedPayload {
                    order_id: order_id.clone(),
                    status,
                    order: updated,
                },
            )
            .await?;

        Ok(())
    }

    /// Returns the order with the given ID, if known.
    pub async fn get(&self, order_id: &OrderId) -> Option<Order> {
        self.orders.read().await.get(order_id).cloned()
    }

    /// Returns all orders.
    pub async fn all(&self) -> Vec<Order> {
        self.orders.read().await.values().cloned().collect()
    }

    /// Returns all orders currently in the given status.
    pub async fn by_status(&self, status: OrderStatus) -> Vec<Order> {
        self.orders
            .read()
            .await
            .values()
            .filter(|o| o.status == status)
            .cloned()
            .collect()
    }

    /// Subscribes the registry's status-advancing handlers.
    ///
    /// This is the saga terminus: reservation, shipping, and delivery events
    /// published by the other services land here and move the order's status
    /// forward.
    pub async fn attach(&self) -> Vec<SubscriptionHandle> {
        let mut handles = Vec::new();
        for (topic, status) in [
            (topics::ORDER_INVENTORY_RESERVED, OrderStatus::Reserved),
            (topics::ORDER_SHIPPED, OrderStatus::Shipped),
            (topics::ORDER_DELIVERED, OrderStatus::Delivered),
        ] {
            let handler = Arc::new(AdvanceStatus {
                registry: self.clone(),
                status,
            });
            handles.push(self.bus.subscribe(topic, handler).await);
        }
        handles
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, OrderError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(OrderError::Validation { field }),
    }
}

/// View of any order-scoped payload: just the ID.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderRef {
    order_id: OrderId,
}

/// Sets a fixed status on the referenced order when its topic fires.
struct AdvanceStatus {
    registry: OrderRegistry,
    status: OrderStatus,
}

#[async_trait]
impl EventHandler for AdvanceStatus {
    async fn handle(&self, event: &Event) -> Result<(), HandlerError> {
        let order_ref: OrderRef = event.decode()?;
        self.registry
            .update_status(&order_ref.order_id, self.status)
            .await
            .map_err(HandlerError::failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use event_bus::handler_fn;
    use std::sync::Mutex;

    async fn capture(bus: &EventBus, topic: &str) -> Arc<Mutex<Vec<Event>>> {
        let log: Arc<Mutex<Vec<Event>>> = Arc::new(Mutex::new(Vec::new()));
        let log_clone = Arc::clone(&log);
        let handler = handler_fn(move |event: Event| {
            let log = Arc::clone(&log_clone);
            async move {
                log.lock().unwrap().push(event);
                Ok(())
            }
        });
        bus.subscribe(topic, handler).await;
        log
    }

    #[tokio::test]
    async fn test_create_order_stores_and_publishes() {
        let bus = EventBus::new();
        let created = capture(&bus, topics::ORDER_CREATED).await;
        let registry = OrderRegistry::new(bus);

        let order = registry
            .create_order(OrderRequest::new("ORD1", "a@x.com", "Widget"))
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Created);
        assert_eq!(order.created_at, order.last_updated);

        let stored = registry.get(&OrderId::new("ORD1")).await.unwrap();
        assert_eq!(stored, order);

        let events = created.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].payload["orderId"], "ORD1");
        assert_eq!(events[0].payload["status"], "created");
    }

    #[tokio::test]
    async fn test_create_order_rejects_missing_fields() {
        let registry = OrderRegistry::new(EventBus::new());

        let missing_id = OrderRequest {
            email: Some("a@x.com".to_string()),
            item: Some("Widget".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            registry.create_order(missing_id).await,
            Err(OrderError::Validation { field: "orderId" })
        ));

        let missing_email = OrderRequest {
            order_id: Some("ORD1".to_string()),
            item: Some("Widget".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            registry.create_order(missing_email).await,
            Err(OrderError::Validation { field: "email" })
        ));

        let empty_item = OrderRequest {
            order_id: Some("ORD1".to_string()),
            email: Some("a@x.com".to_string()),
            item: Some(String::new()),
            ..Default::default()
        };
        assert!(matches!(
            registry.create_order(empty_item).await,
            Err(OrderError::Validation { field: "item" })
        ));

        assert!(registry.all().await.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_order_id_fails_regardless_of_payload() {
        let registry = OrderRegistry::new(EventBus::new());

        registry
            .create_order(OrderRequest::new("ORD1", "a@x.com", "Widget"))
            .await
            .unwrap();

        let result = registry
            .create_order(OrderRequest::new("ORD1", "other@x.com", "Gadget"))
            .await;
        assert!(matches!(result, Err(OrderError::DuplicateOrder(_))));

        // Original record untouched.
        let stored = registry.get(&OrderId::new("ORD1")).await.unwrap();
        assert_eq!(stored.email, "a@x.com");
        assert_eq!(stored.item, "Widget");
    }

    #[tokio::test]
    async fn test_update_status_for_unknown_order_is_a_no_op() {
        let registry = OrderRegistry::new(EventBus::new());
        registry
            .update_status(&OrderId::new("NOPE"), OrderStatus::Shipped)
            .await
            .unwrap();
        assert!(registry.all().await.is_empty());
    }

    #[tokio::test]
    async fn test_update_status_publishes_contract_payload() {
        let bus = EventBus::new();
        let updates = capture(&bus, topics::ORDER_STATUS_UPDATED).await;
        let registry = OrderRegistry::new(bus);

        registry
            .create_order(OrderRequest::new("ORD1", "a@x.com", "Widget"))
            .await
            .unwrap();
        registry
            .update_status(&OrderId::new("ORD1"), OrderStatus::Cancelled)
            .await
            .unwrap();

        let events = updates.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].payload["orderId"], "ORD1");
        assert_eq!(events[0].payload["status"], "cancelled");
        assert_eq!(events[0].payload["order"]["status"], "cancelled");
    }

    #[tokio::test]
    async fn test_by_status_filters() {
        let registry = OrderRegistry::new(EventBus::new());
        registry
            .create_order(OrderRequest::new("ORD1", "a@x.com", "Widget"))
            .await
            .unwrap();
        registry
            .create_order(OrderRequest::new("ORD2", "b@x.com", "Gadget"))
            .await
            .unwrap();
        registry
            .update_status(&OrderId::new("ORD2"), OrderStatus::Shipped)
            .await
            .unwrap();

        let created = registry.by_status(OrderStatus::Created).await;
        let shipped = registry.by_status(OrderStatus::Shipped).await;
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].order_id.as_str(), "ORD1");
        assert_eq!(shipped.len(), 1);
        assert_eq!(shipped[0].order_id.as_str(), "ORD2");
    }

    #[tokio::test]
    async fn test_attached_handlers_advance_status_from_events() {
        let bus = EventBus::new();
        let registry = OrderRegistry::new(bus.clone());
        registry.attach().await;

        registry
            .create_order(OrderRequest::new("ORD1", "a@x.com", "Widget"))
            .await
            .unwrap();

        bus.publish(
            topics::ORDER_INVENTORY_RESERVED,
            serde_json::json!({"orderId": "ORD1", "item": "Widget"}),
        )
        .await;
        assert_eq!(
            registry.get(&OrderId::new("ORD1")).await.unwrap().status,
            OrderStatus::Reserved
        );

        bus.publish(
            topics::ORDER_SHIPPED,
            serde_json::json!({"orderId": "ORD1"}),
        )
        .await;
        bus.publish(
            topics::ORDER_DELIVERED,
            serde_json::json!({"orderId": "ORD1"}),
        )
        .await;
        assert_eq!(
            registry.get(&OrderId::new("ORD1")).await.unwrap().status,
            OrderStatus::Delivered
        );
    }
}
