//! Shipment records and tracking numbers.

use chrono::{DateTime, Utc};
use common::OrderId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The status of a shipment. Advances monotonically shipped → delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ShipmentStatus {
    /// The shipment left the warehouse.
    #[default]
    Shipped,

    /// The shipment reached the customer (terminal state).
    Delivered,
}

impl ShipmentStatus {
    /// Returns the status name as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            ShipmentStatus::Shipped => "shipped",
            ShipmentStatus::Delivered => "delivered",
        }
    }
}

impl std::fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A shipment for one order, created once by the saga.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shipment {
    pub order_id: OrderId,

    /// Globally unique tracking number.
    pub tracking_number: String,

    pub status: ShipmentStatus,
    pub shipped_at: DateTime<Utc>,

    /// Shipped-at plus the configured lead time.
    pub estimated_delivery: DateTime<Utc>,

    pub delivered_at: Option<DateTime<Utc>>,
}

/// Generates a tracking number: prefix, millisecond timestamp, random suffix.
///
/// The timestamp keeps numbers roughly sortable by creation time; the
/// suffix makes same-millisecond collisions implausible.
pub(crate) fn next_tracking_number() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "TRK-{}-{}",
        Utc::now().timestamp_millis(),
        suffix[..6].to_uppercase()
    )
}
