//! The inventory ledger service.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{OrderId, topics};
use event_bus::{Event, EventBus, EventHandler, HandlerError, SubscriptionHandle};
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::config::InventoryConfig;
use crate::error::InventoryError;
use crate::stock::{
    InventoryReservedPayload, LowStockPayload, Reservation, ReservationRejectedPayload,
    ReservationStatus, StockAddedPayload, StockItem,
};

/// How a reservation attempt ended.
///
/// None of these are errors: rejections flow back to the rest of the system
/// as events so the order's publisher is never blocked by inventory state.
#[derive(Debug, Clone, PartialEq)]
pub enum ReservationOutcome {
    /// One unit was held and `order:inventory_reserved` published.
    Reserved(Reservation),

    /// The item is not in the catalog; `order:inventory_unavailable` published.
    Unavailable,

    /// The item has zero stock; `order:out_of_stock` published.
    OutOfStock,

    /// A reservation already exists for this order; nothing changed.
    AlreadyReserved,
}

struct LedgerState {
    products: HashMap<String, StockItem>,
    reservations: HashMap<OrderId, Reservation>,
}

/// Owns stock counts and reservation records.
///
/// Cloning is cheap; all clones share the same ledger. Every mutation of the
/// stock/reservation maps happens under one write guard, which is what makes
/// concurrent reservations against the last unit safe.
#[derive(Clone)]
pub struct InventoryLedger {
    bus: EventBus,
    state: Arc<RwLock<LedgerState>>,
    low_stock_threshold: u32,
}

impl InventoryLedger {
    /// Creates an empty ledger publishing on the given bus.
    pub fn new(bus: EventBus, config: InventoryConfig) -> Self {
        Self {
            bus,
            state: Arc::new(RwLock::new(LedgerState {
                products: HashMap::new(),
                reservations: HashMap::new(),
            })),
            low_stock_threshold: config.low_stock_threshold,
        }
    }

    /// Attempts to hold one unit of `item` for `order_id`.
    ///
    /// The lookup, decrement, and reservation insert are a single logical
    /// unit under the ledger's write guard; two concurrent calls can never
    /// observe the same pre-decrement stock value. The guard is released
    /// before any event is published.
    pub async fn reserve_for_order(
        &self,
        order_id: &OrderId,
        item: &str,
    ) -> Result<ReservationOutcome, InventoryError> {
        // `remaining` is captured inside the guard: the value published must
        // be the one this reservation observed, not whatever a later caller
        // left behind.
        let (outcome, remaining) = {
            let mut state = self.state.write().await;

            if state.reservations.contains_key(order_id) {
                // Redelivered order:created must not double-decrement.
                tracing::debug!(%order_id, "reservation already exists, skipping");
                return Ok(ReservationOutcome::AlreadyReserved);
            }

            match state.products.get_mut(item) {
                None => (ReservationOutcome::Unavailable, 0),
                Some(product) if product.stock == 0 => (ReservationOutcome::OutOfStock, 0),
                Some(product) => {
                    product.stock -= 1;
                    let remaining = product.stock;
                    let reservation = Reservation {
                        order_id: order_id.clone(),
                        item: item.to_string(),
                        quantity: 1,
                        price: product.price,
                        status: ReservationStatus::Reserved,
                        reserved_at: Utc::now(),
                        fulfilled_at: None,
                    };
                    state
                        .reservations
                        .insert(order_id.clone(), reservation.clone());
                    (ReservationOutcome::Reserved(reservation), remaining)
                }
            }
        };

        match &outcome {
            ReservationOutcome::Reserved(reservation) => {
                metrics::counter!("inventory_reservations_total").increment(1);
                tracing::info!(%order_id, %item, remaining, "stock reserved");

                self.bus
                    .publish_json(
                        topics::ORDER_INVENTORY_RESERVED,
                        &InventoryReservedPayload {
                            order_id: order_id.clone(),
                            item: item.to_string(),
                            remaining_stock: remaining,
                            reservation: reservation.clone(),
                        },
                    )
                    .await?;

                if remaining <= self.low_stock_threshold {
                    tracing::warn!(%item, remaining, threshold = self.low_stock_threshold, "stock is low");
                    self.bus
                        .publish_json(
                            topics::INVENTORY_LOW_STOCK,
                            &LowStockPayload {
                                item: item.to_string(),
                                current_stock: remaining,
                                threshold: self.low_stock_threshold,
                            },
                        )
                        .await?;
                }
            }
            ReservationOutcome::Unavailable => {
                metrics::counter!("inventory_rejections_total").increment(1);
                tracing::info!(%order_id, %item, "item not in catalog");
                self.bus
                    .publish_json(
                        topics::ORDER_INVENTORY_UNAVAILABLE,
                        &ReservationRejectedPayload {
                            order_id: order_id.clone(),
                            item: item.to_string(),
                        },
                    )
                    .await?;
            }
            ReservationOutcome::OutOfStock => {
                metrics::counter!("inventory_rejections_total").increment(1);
                tracing::info!(%order_id, %item, "item out of stock");
                self.bus
                    .publish_json(
                        topics::ORDER_OUT_OF_STOCK,
                        &ReservationRejectedPayload {
                            order_id: order_id.clone(),
                            item: item.to_string(),
                        },
                    )
                    .await?;
            }
            ReservationOutcome::AlreadyReserved => {}
        }

        Ok(outcome)
    }

    /// Marks the reservation for `order_id` fulfilled.
    ///
    /// Idempotent: no reservation, or one already fulfilled, is a no-op.
    pub async fn mark_fulfilled(&self, order_id: &OrderId) {
        let mut state = self.state.write().await;
        match state.reservations.get_mut(order_id) {
            Some(reservation) if reservation.status == ReservationStatus::Reserved => {
                reservation.status = ReservationStatus::Fulfilled;
                reservation.fulfilled_at = Some(Utc::now());
                tracing::info!(%order_id, "reservation fulfilled");
            }
            _ => {
                tracing::debug!(%order_id, "no pending reservation to fulfill");
            }
        }
    }

    /// Adds stock to an existing item and publishes `inventory:stock_added`.
    pub async fn add_stock(&self, item: &str, quantity: u32) -> Result<u32, InventoryError> {
        let total = {
            let mut state = self.state.write().await;
            let product = state
                .products
                .get_mut(item)
                .ok_or_else(|| InventoryError::UnknownItem(item.to_string()))?;
            product.stock += quantity;
            product.stock
        };

        tracing::info!(%item, added = quantity, total, "stock added");
        self.bus
            .publish_json(
                topics::INVENTORY_STOCK_ADDED,
                &StockAddedPayload {
                    item: item.to_string(),
                    added: quantity,
                    total,
                },
            )
            .await?;

        Ok(total)
    }

    /// Inserts or replaces a catalog entry and publishes `inventory:product_added`.
    pub async fn add_product(&self, product: StockItem) -> Result<(), InventoryError> {
        {
            let mut state = self.state.write().await;
            state.products.insert(product.name.clone(), product.clone());
        }

        tracing::info!(item = %product.name, stock = product.stock, "product added");
        self.bus
            .publish_json(topics::INVENTORY_PRODUCT_ADDED, &product)
            .await?;

        Ok(())
    }

    /// Returns the full catalog.
    pub async fn products(&self) -> Vec<StockItem> {
        self.state.read().await.products.values().cloned().collect()
    }

    /// Returns items at or below the low-stock threshold.
    pub async fn low_stock(&self) -> Vec<StockItem> {
        self.state
            .read()
            .await
            .products
            .values()
            .filter(|p| p.stock <= self.low_stock_threshold)
            .cloned()
            .collect()
    }

    /// Returns items in the given category.
    pub async fn by_category(&self, category: &str) -> Vec<StockItem> {
        self.state
            .read()
            .await
            .products
            .values()
            .filter(|p| p.category == category)
            .cloned()
            .collect()
    }

    /// Returns the current stock of an item, if it exists.
    pub async fn stock_of(&self, item: &str) -> Option<u32> {
        self.state.read().await.products.get(item).map(|p| p.stock)
    }

    /// Returns true if at least `quantity` units of `item` are on hand.
    pub async fn is_available(&self, item: &str, quantity: u32) -> bool {
        self.stock_of(item).await.is_some_and(|s| s >= quantity)
    }

    /// Returns all reservations.
    pub async fn reservations(&self) -> Vec<Reservation> {
        self.state
            .read()
            .await
            .reservations
            .values()
            .cloned()
            .collect()
    }

    /// Returns reservations in the given status.
    pub async fn reservations_by_status(&self, status: ReservationStatus) -> Vec<Reservation> {
        self.state
            .read()
            .await
            .reservations
            .values()
            .filter(|r| r.status == status)
            .cloned()
            .collect()
    }

    /// Returns the reservation for an order, if any.
    pub async fn reservation_for(&self, order_id: &OrderId) -> Option<Reservation> {
        self.state.read().await.reservations.get(order_id).cloned()
    }

    /// Subscribes the ledger's handlers to the bus.
    pub async fn attach(&self) -> Vec<SubscriptionHandle> {
        let reserve = Arc::new(ReserveOnOrderCreated {
            ledger: self.clone(),
        });
        let fulfill = Arc::new(FulfillOnDelivered {
            ledger: self.clone(),
        });
        vec![
            self.bus.subscribe(topics::ORDER_CREATED, reserve).await,
            self.bus.subscribe(topics::ORDER_DELIVERED, fulfill).await,
        ]
    }
}

/// The ledger's view of order-scoped payloads.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IncomingOrder {
    order_id: OrderId,
    item: Option<String>,
}

struct ReserveOnOrderCreated {
    ledger: InventoryLedger,
}

#[async_trait]
impl EventHandler for ReserveOnOrderCreated {
    async fn handle(&self, event: &Event) -> Result<(), HandlerError> {
        let order: IncomingOrder = event.decode()?;
        let item = order
            .item
            .ok_or_else(|| HandlerError::failed("order:created payload missing item"))?;
        self.ledger
            .reserve_for_order(&order.order_id, &item)
            .await
            .map_err(HandlerError::failed)?;
        Ok(())
    }
}

struct FulfillOnDelivered {
    ledger: InventoryLedger,
}

#[async_trait]
impl EventHandler for FulfillOnDelivered {
    async fn handle(&self, event: &Event) -> Result<(), HandlerError> {
        let order: IncomingOrder = event.decode()?;
        self.ledger.mark_fulfilled(&order.order_id).await;
        Ok(())
    }
}
