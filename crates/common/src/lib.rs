//! Shared value objects and the topic contract for the fulfillment system.

pub mod topics;
pub mod types;

pub use types::{Money, OrderId, SubscriptionId};
