//! Order records and registry payload types.

use chrono::{DateTime, Utc};
use common::OrderId;
use serde::{Deserialize, Serialize};

use crate::status::OrderStatus;

/// A canonical order record owned by the registry.
///
/// Serialized with camelCase field names; the full record is the payload of
/// `order:created` and rides along on `order:status_updated`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Caller-assigned unique identifier.
    pub order_id: OrderId,

    /// Customer email for notifications.
    pub email: String,

    /// Name of the ordered item (one unit per order).
    pub item: String,

    /// Optional shipping address.
    pub address: Option<String>,

    /// Current lifecycle status.
    pub status: OrderStatus,

    /// When the order was accepted.
    pub created_at: DateTime<Utc>,

    /// When the order was last mutated.
    pub last_updated: DateTime<Utc>,
}

/// Input for creating an order.
///
/// All fields are optional at the type level; `create_order` validates that
/// `order_id`, `email`, and `item` are present and non-empty.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub order_id: Option<String>,
    pub email: Option<String>,
    pub item: Option<String>,
    pub address: Option<String>,
}

impl OrderRequest {
    /// Convenience constructor for the required fields.
    pub fn new(
        order_id: impl Into<String>,
        email: impl Into<String>,
        item: impl Into<String>,
    ) -> Self {
        Self {
            order_id: Some(order_id.into()),
            email: Some(email.into()),
            item: Some(item.into()),
            address: None,
        }
    }

    /// Sets the shipping address.
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }
}

/// Payload of `order:status_updated`: `{orderId, status, order}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdatedPayload {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub order: Order,
}
