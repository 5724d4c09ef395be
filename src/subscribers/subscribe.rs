//! # Event subscriber trait.
//!
//! [`Subscribe`] is the extension point for plugging custom event handlers into a
//! scheduler. Each subscriber is driven by a dedicated worker fed by a bounded queue owned
//! by the `SubscriberSet`.
//!
//! ## Contract
//! - Implementations may be slow (I/O, batching); they never block admission operations,
//!   task runners or other subscribers.
//! - A full queue drops the event **for this subscriber only** and publishes
//!   `EventKind::SubscriberOverflow`.
//! - Panics are caught and published as `EventKind::SubscriberPanicked`.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use slotvisor::{Event, EventKind, Subscribe};
//!
//! struct Preemptions;
//!
//! #[async_trait]
//! impl Subscribe for Preemptions {
//!     async fn on_event(&self, ev: &Event) {
//!         if matches!(ev.kind, EventKind::TaskSuperseded | EventKind::TaskCancelled) {
//!             // bump a counter, etc.
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "preemptions" }
//!     fn queue_capacity(&self) -> usize { 2048 }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Event subscriber for scheduler observability.
///
/// Called from a subscriber-dedicated worker task, in FIFO order per subscriber.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Processes a single event.
    async fn on_event(&self, event: &Event);

    /// Name used in overflow/panic events. Override the verbose default when possible.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this subscriber's queue (clamped to a minimum of 1).
    fn queue_capacity(&self) -> usize {
        1024
    }
}
