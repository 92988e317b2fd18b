//! In-process publish/subscribe bus for the order-fulfillment services.
//!
//! Services never call each other directly; they publish events to named
//! topics and subscribe handlers to the topics they care about. The bus
//! guarantees:
//!
//! 1. Dispatch is synchronous relative to the publisher: `publish` does not
//!    return until every handler subscribed at the moment of the call has run.
//! 2. Handlers are fault-isolated: an error (or panic) in one subscriber is
//!    reported to the diagnostics sink and never reaches the publisher or
//!    the remaining subscribers.
//! 3. Re-entrant publishing is safe: a handler may publish new events and may
//!    subscribe/unsubscribe without deadlocking the in-flight dispatch.

pub mod bus;
pub mod diagnostics;
pub mod error;
pub mod event;
pub mod handler;

pub use bus::{EventBus, SubscriptionHandle};
pub use diagnostics::{DiagnosticsSink, DispatchFailure, RecordingSink, TracingSink};
pub use error::HandlerError;
pub use event::Event;
pub use handler::{EventHandler, handler_fn};
