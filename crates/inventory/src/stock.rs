//! Stock items, reservations, and inventory payload types.

use chrono::{DateTime, Utc};
use common::{Money, OrderId};
use serde::{Deserialize, Serialize};

/// A catalog entry with its current stock count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockItem {
    /// Unique item name.
    pub name: String,

    /// Units on hand. Never negative; reservations decrement one at a time.
    pub stock: u32,

    /// Unit price.
    pub price: Money,

    /// Catalog category.
    pub category: String,
}

impl StockItem {
    /// Creates a new catalog entry.
    pub fn new(
        name: impl Into<String>,
        stock: u32,
        price: Money,
        category: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            stock,
            price,
            category: category.into(),
        }
    }
}

/// The status of a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    /// One unit is held for the order, awaiting delivery.
    #[default]
    Reserved,

    /// The order was delivered; the hold is settled (terminal state).
    Fulfilled,
}

impl ReservationStatus {
    /// Returns the status name as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Reserved => "reserved",
            ReservationStatus::Fulfilled => "fulfilled",
        }
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A provisional hold on one unit of stock, keyed 1:1 by order ID.
///
/// Created atomically with the stock decrement; never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub order_id: OrderId,
    pub item: String,
    pub quantity: u32,

    /// Price snapshot taken at reservation time.
    pub price: Money,

    pub status: ReservationStatus,
    pub reserved_at: DateTime<Utc>,
    pub fulfilled_at: Option<DateTime<Utc>>,
}

/// Payload of `order:inventory_reserved`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryReservedPayload {
    pub order_id: OrderId,
    pub item: String,
    pub remaining_stock: u32,
    pub reservation: Reservation,
}

/// Payload of `order:inventory_unavailable` and `order:out_of_stock`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationRejectedPayload {
    pub order_id: OrderId,
    pub item: String,
}

/// Payload of `inventory:low_stock`: `{item, currentStock, threshold}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LowStockPayload {
    pub item: String,
    pub current_stock: u32,
    pub threshold: u32,
}

/// Payload of `inventory:stock_added`: `{item, added, total}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockAddedPayload {
    pub item: String,
    pub added: u32,
    pub total: u32,
}
