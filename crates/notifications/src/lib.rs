//! Notification collaborator.
//!
//! A pure consumer: it turns order lifecycle events into customer-facing
//! notification records and has no influence on the saga. Its handlers
//! never return an error; a malformed payload is logged and skipped, so
//! notifications can never stall dispatch for anyone else.

pub mod service;

pub use service::{Notification, NotificationKind, NotificationService};
