//! Order registry: the owner of canonical order records.
//!
//! Orders are created once, never deleted, and mutated only through status
//! updates. The registry publishes `order:created` to start the fulfillment
//! saga and advances each order's status as downstream services report
//! progress (`order:inventory_reserved`, `order:shipped`, `order:delivered`).

pub mod error;
pub mod order;
pub mod registry;
pub mod status;

pub use error::OrderError;
pub use order::{Order, OrderRequest, StatusUpdatedPayload};
pub use registry::OrderRegistry;
pub use status::OrderStatus;
