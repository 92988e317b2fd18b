//! Inventory ledger: stock counts and per-order reservations.
//!
//! The ledger reacts to `order:created` by reserving one unit of the ordered
//! item and to `order:delivered` by marking the reservation fulfilled. The
//! check-decrement-reserve sequence runs under a single write guard, so
//! concurrent reservations for the same item serialize and stock can never
//! go negative.

pub mod config;
pub mod error;
pub mod ledger;
pub mod stock;

pub use config::InventoryConfig;
pub use error::InventoryError;
pub use ledger::{InventoryLedger, ReservationOutcome};
pub use stock::{Reservation, ReservationStatus, StockItem};
