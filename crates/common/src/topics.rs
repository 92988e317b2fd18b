//! Topic names shared by every service on the bus.
//!
//! These strings are the cross-service contract: publishers and subscribers
//! agree on topic names and camelCase payload field names, never on types.

/// A new order was accepted by the order registry. Payload: the full order record.
pub const ORDER_CREATED: &str = "order:created";

/// An order's status field changed. Payload: `{orderId, status, order}`.
pub const ORDER_STATUS_UPDATED: &str = "order:status_updated";

/// Stock was reserved for an order.
pub const ORDER_INVENTORY_RESERVED: &str = "order:inventory_reserved";

/// The ordered item is not in the catalog.
pub const ORDER_INVENTORY_UNAVAILABLE: &str = "order:inventory_unavailable";

/// The ordered item has zero stock.
pub const ORDER_OUT_OF_STOCK: &str = "order:out_of_stock";

/// Remaining stock fell to or below the threshold. Payload: `{item, currentStock, threshold}`.
pub const INVENTORY_LOW_STOCK: &str = "inventory:low_stock";

/// Stock was added to an existing item. Payload: `{item, added, total}`.
pub const INVENTORY_STOCK_ADDED: &str = "inventory:stock_added";

/// A new product entered the catalog.
pub const INVENTORY_PRODUCT_ADDED: &str = "inventory:product_added";

/// A shipment was created for an order. Payload: merged order + shipment record.
pub const ORDER_SHIPPED: &str = "order:shipped";

/// A shipment reached the customer.
pub const ORDER_DELIVERED: &str = "order:delivered";
