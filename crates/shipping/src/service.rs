//! The shipping service and its delayed saga steps.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use common::{OrderId, topics};
use event_bus::{Event, EventBus, EventHandler, HandlerError, SubscriptionHandle};
use serde::Deserialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::config::ShippingConfig;
use crate::shipment::{Shipment, ShipmentStatus, next_tracking_number};

/// Drives each order through shipped → delivered on its own timeline.
///
/// Cloning is cheap; all clones share the shipment map, the task list, and
/// the teardown flag.
#[derive(Clone)]
pub struct ShippingService {
    bus: EventBus,
    config: ShippingConfig,
    shipments: Arc<RwLock<HashMap<OrderId, Shipment>>>,
    tasks: Arc<Mutex<Vec<JoinHandle<()>>>>,
    shutting_down: Arc<AtomicBool>,
}

impl ShippingService {
    /// Creates a shipping service publishing on the given bus.
    pub fn new(bus: EventBus, config: ShippingConfig) -> Self {
        Self {
            bus,
            config,
            shipments: Arc::new(RwLock::new(HashMap::new())),
            tasks: Arc::new(Mutex::new(Vec::new())),
            shutting_down: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Subscribes the order-created handler that starts each fulfillment.
    pub async fn attach(&self) -> SubscriptionHandle {
        let handler = Arc::new(ShipOnOrderCreated {
            service: self.clone(),
        });
        self.bus.subscribe(topics::ORDER_CREATED, handler).await
    }

    /// Begins teardown: no new fulfillments start, and every pending
    /// delayed step is aborted before it can mutate state or publish.
    pub async fn shutdown(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);
        let handles: Vec<JoinHandle<()>> = {
            let mut tasks = self.tasks.lock().unwrap();
            tasks.drain(..).collect()
        };
        let pending = handles.len();
        for handle in handles {
            handle.abort();
        }
        tracing::info!(pending, "shipping service shut down");
    }

    /// Returns the shipment for an order, if one exists yet.
    pub async fn shipment_for_order(&self, order_id: &OrderId) -> Option<Shipment> {
        self.shipments.read().await.get(order_id).cloned()
    }

    /// Returns all shipments.
    pub async fn all_shipments(&self) -> Vec<Shipment> {
        self.shipments.read().await.values().cloned().collect()
    }

    /// Looks a shipment up by its tracking number.
    pub async fn by_tracking_number(&self, tracking_number: &str) -> Option<Shipment> {
        self.shipments
            .read()
            .await
            .values()
            .find(|s| s.tracking_number == tracking_number)
            .cloned()
    }

    /// Returns shipments in the given status.
    pub async fn by_status(&self, status: ShipmentStatus) -> Vec<Shipment> {
        self.shipments
            .read()
            .await
            .values()
            .filter(|s| s.status == status)
            .cloned()
            .collect()
    }

    /// Spawns the fulfillment task for a newly created order.
    ///
    /// Called from dispatch, so it must not block: the delays live inside
    /// the spawned task, never inside the handler.
    fn schedule_fulfillment(&self, order_id: OrderId, order_payload: serde_json::Value) {
        if self.shutting_down.load(Ordering::SeqCst) {
            tracing::debug!(%order_id, "shutting down, fulfillment not scheduled");
            return;
        }

        let service = self.clone();
        let handle = tokio::spawn(async move {
            service.run_fulfillment(order_id, order_payload).await;
        });

        let mut tasks = self.tasks.lock().unwrap();
        tasks.retain(|t| !t.is_finished());
        tasks.push(handle);
    }

    async fn run_fulfillment(&self, order_id: OrderId, order_payload: serde_json::Value) {
        tokio::time::sleep(self.config.processing_delay).await;
        if self.shutting_down.load(Ordering::SeqCst) {
            return;
        }

        let shipment = {
            let mut shipments = self.shipments.write().await;
            if shipments.contains_key(&order_id) {
                tracing::debug!(%order_id, "shipment already exists, skipping");
                return;
            }
            let now = Utc::now();
            let shipment = Shipment {
                order_id: order_id.clone(),
                tracking_number: next_tracking_number(),
                status: ShipmentStatus::Shipped,
                shipped_at: now,
                estimated_delivery: now + ChronoDuration::days(self.config.lead_time_days),
                delivered_at: None,
            };
            shipments.insert(order_id.clone(), shipment.clone());
            shipment
        };

        metrics::counter!("shipments_created_total").increment(1);
        tracing::info!(%order_id, tracking_number = %shipment.tracking_number, "order shipped");
        self.publish_merged(topics::ORDER_SHIPPED, &order_payload, &shipment)
            .await;

        tokio::time::sleep(self.config.delivery_delay).await;
        if self.shutting_down.load(Ordering::SeqCst) {
            return;
        }

        let delivered = {
            let mut shipments = self.shipments.write().await;
            match shipments.get_mut(&order_id) {
                Some(shipment) if shipment.status == ShipmentStatus::Shipped => {
                    shipment.status = ShipmentStatus::Delivered;
                    shipment.delivered_at = Some(Utc::now());
                    shipment.clone()
                }
                _ => return,
            }
        };

        metrics::counter!("deliveries_completed_total").increment(1);
        tracing::info!(%order_id, tracking_number = %delivered.tracking_number, "order delivered");
        self.publish_merged(topics::ORDER_DELIVERED, &order_payload, &delivered)
            .await;
    }

    /// Publishes the order payload overlaid with the shipment's fields.
    async fn publish_merged(
        &self,
        topic: &str,
        order_payload: &serde_json::Value,
        shipment: &Shipment,
    ) {
        let shipment_value = match serde_json::to_value(shipment) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(%topic, error = %e, "failed to serialize shipment");
                return;
            }
        };

        let mut merged = order_payload
            .as_object()
            .cloned()
            .unwrap_or_default();
        if let Some(fields) = shipment_value.as_object() {
            for (key, value) in fields {
                merged.insert(key.clone(), value.clone());
            }
        }

        self.bus.publish(topic, serde_json::Value::Object(merged)).await;
    }
}

/// View of the `order:created` payload: the ID is all the saga needs up
/// front; the rest of the record rides along for the merged payloads.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderRef {
    order_id: OrderId,
}

struct ShipOnOrderCreated {
    service: ShippingService,
}

#[async_trait]
impl EventHandler for ShipOnOrderCreated {
    async fn handle(&self, event: &Event) -> Result<(), HandlerError> {
        let order: OrderRef = event.decode()?;
        self.service
            .schedule_fulfillment(order.order_id, event.payload.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use event_bus::handler_fn;
    use std::time::Duration;

    fn fast_config() -> ShippingConfig {
        ShippingConfig::default().with_delays(Duration::from_millis(20), Duration::from_millis(20))
    }

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

    /// Polls a condition until it holds or five seconds elapse.
    async fn eventually<F, Fut>(mut check: F) -> bool
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = bool>,
    {
        for _ in 0..1000 {
            if check().await {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        false
    }

    fn order_created_payload(order_id: &str) -> serde_json::Value {
        serde_json::json!({
            "orderId": order_id,
            "email": "a@x.com",
            "item": "Widget",
            "status": "created",
        })
    }

    #[tokio::test]
    async fn test_full_shipment_lifecycle() {
        let bus = EventBus::new();
        let shipped = capture(&bus, topics::ORDER_SHIPPED).await;
        let delivered = capture(&bus, topics::ORDER_DELIVERED).await;

        let service = ShippingService::new(bus.clone(), fast_config());
        service.attach().await;

        bus.publish(topics::ORDER_CREATED, order_created_payload("ORD1"))
            .await;

        // Dispatch returns before the shipment exists.
        assert!(service.shipment_for_order(&OrderId::new("ORD1")).await.is_none());

        let service_clone = service.clone();
        assert!(
            eventually(|| {
                let service = service_clone.clone();
                async move {
                    matches!(
                        service.shipment_for_order(&OrderId::new("ORD1")).await,
                        Some(s) if s.status == ShipmentStatus::Delivered
                    )
                }
            })
            .await
        );

        let shipment = service.shipment_for_order(&OrderId::new("ORD1")).await.unwrap();
        assert!(shipment.tracking_number.starts_with("TRK-"));
        assert!(shipment.delivered_at.is_some());
        assert_eq!(
            shipment.estimated_delivery,
            shipment.shipped_at + ChronoDuration::days(3)
        );

        // Merged payloads carry both order and shipment fields.
        let shipped_events = shipped.lock().unwrap();
        assert_eq!(shipped_events.len(), 1);
        assert_eq!(shipped_events[0].payload["orderId"], "ORD1");
        assert_eq!(shipped_events[0].payload["email"], "a@x.com");
        assert_eq!(shipped_events[0].payload["status"], "shipped");
        assert!(shipped_events[0].payload.get("trackingNumber").is_some());

        let delivered_events = delivered.lock().unwrap();
        assert_eq!(delivered_events.len(), 1);
        assert_eq!(delivered_events[0].payload["status"], "delivered");
        assert!(delivered_events[0].payload.get("deliveredAt").is_some());
    }

    #[tokio::test]
    async fn test_shutdown_cancels_pending_fulfillments() {
        let bus = EventBus::new();
        let shipped = capture(&bus, topics::ORDER_SHIPPED).await;

        let service = ShippingService::new(
            bus.clone(),
            ShippingConfig::default()
                .with_delays(Duration::from_millis(50), Duration::from_millis(50)),
        );
        service.attach().await;

        bus.publish(topics::ORDER_CREATED, order_created_payload("ORD1"))
            .await;
        service.shutdown().await;

        // Wait well past both delays: nothing may fire after teardown.
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(service.all_shipments().await.is_empty());
        assert!(shipped.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_no_new_fulfillments_after_shutdown() {
        let bus = EventBus::new();
        let service = ShippingService::new(bus.clone(), fast_config());
        service.attach().await;

        service.shutdown().await;
        bus.publish(topics::ORDER_CREATED, order_created_payload("ORD1"))
            .await;

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(service.all_shipments().await.is_empty());
    }

    #[tokio::test]
    async fn test_lookup_accessors() {
        let bus = EventBus::new();
        let service = ShippingService::new(bus.clone(), fast_config());
        service.attach().await;

        bus.publish(topics::ORDER_CREATED, order_created_payload("ORD1"))
            .await;
        bus.publish(topics::ORDER_CREATED, order_created_payload("ORD2"))
            .await;

        let service_clone = service.clone();
        assert!(
            eventually(|| {
                let service = service_clone.clone();
                async move { service.by_status(ShipmentStatus::Delivered).await.len() == 2 }
            })
            .await
        );

        let shipment = service.shipment_for_order(&OrderId::new("ORD1")).await.unwrap();
        let by_tracking = service
            .by_tracking_number(&shipment.tracking_number)
            .await
            .unwrap();
        assert_eq!(by_tracking.order_id.as_str(), "ORD1");
        assert_eq!(service.all_shipments().await.len(), 2);
        assert!(service.by_tracking_number("TRK-0-NOPE").await.is_none());
    }

    #[tokio::test]
    async fn test_tracking_numbers_are_unique_across_orders() {
        let bus = EventBus::new();
        let service = ShippingService::new(bus.clone(), fast_config());
        service.attach().await;

        for n in 0..5 {
            bus.publish(
                topics::ORDER_CREATED,
                order_created_payload(&format!("ORD{n}")),
            )
            .await;
        }

        let service_clone = service.clone();
        assert!(
            eventually(|| {
                let service = service_clone.clone();
                async move { service.all_shipments().await.len() == 5 }
            })
            .await
        );

        let mut numbers: Vec<String> = service
            .all_shipments()
            .await
            .into_iter()
            .map(|s| s.tracking_number)
            .collect();
        numbers.sort();
        numbers.dedup();
        assert_eq!(numbers.len(), 5);
    }
}
