//! Fulfillment saga: the shipping service.
//!
//! Shipping reacts to `order:created` by scheduling two delayed transitions:
//! after a configurable carrier-processing delay it creates a shipment and
//! publishes `order:shipped`; after a further transit delay it marks the
//! shipment delivered and publishes `order:delivered`. Neither step runs
//! inside the triggering dispatch; both are spawned tasks, cancellable on
//! shutdown so nothing fires against torn-down state.

pub mod config;
pub mod service;
pub mod shipment;

pub use config::ShippingConfig;
pub use service::ShippingService;
pub use shipment::{Shipment, ShipmentStatus};
