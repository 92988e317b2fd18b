//! Order status machine.

use serde::{Deserialize, Serialize};

/// The status of an order in its lifecycle.
///
/// Status transitions:
/// ```text
/// created ──► reserved ──► shipped ──► delivered
///     │           │            │
///     └───────────┴────────────┴──► cancelled
/// ```
///
/// Transitions are driven by events: the registry itself never initiates
/// one. `cancelled` is reachable only through an explicit status update and
/// is not managed by the saga.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Order accepted by the registry, saga not yet progressed.
    #[default]
    Created,

    /// Inventory has been reserved for the order.
    Reserved,

    /// A shipment exists and is on its way.
    Shipped,

    /// The shipment reached the customer (terminal state).
    Delivered,

    /// Order was cancelled (terminal state).
    Cancelled,
}

impl OrderStatus {
    /// Returns true if this is a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Returns the status name as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Created => "created",
            OrderStatus::Reserved => "reserved",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status_is_created() {
        assert_eq!(OrderStatus::default(), OrderStatus::Created);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!OrderStatus::Created.is_terminal());
        assert!(!OrderStatus::Reserved.is_terminal());
        assert!(!OrderStatus::Shipped.is_terminal());
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Delivered).unwrap(),
            "\"delivered\""
        );
        let back: OrderStatus = serde_json::from_str("\"reserved\"").unwrap();
        assert_eq!(back, OrderStatus::Reserved);
    }

    #[test]
    fn test_display_matches_wire_form() {
        assert_eq!(OrderStatus::Created.to_string(), "created");
        assert_eq!(OrderStatus::Cancelled.to_string(), "cancelled");
    }
}
