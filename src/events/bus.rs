//! # Event bus for broadcasting scheduler events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] used by the scheduler
//! (admission and slot events) and by task runners (lifecycle events).
//!
//! ## Architecture
//! ```text
//! Publishers (many):                      Consumers:
//!   admission ops ──┐                       ├──► subscriber_listener ──► SubscriberSet
//!   completion hook ┼──────► Bus ───────────┤
//!   task runners  ──┘  (broadcast chan)     └──► Scheduler::subscribe() receivers
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never blocks, so it is safe under the registry lock.
//! - **Bounded capacity**: one ring buffer stores recent events for all receivers.
//! - **Lag handling**: slow receivers get `RecvError::Lagged(n)` and skip `n` oldest items.
//! - **No persistence**: events are lost if there are no receivers at send time.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for scheduler events.
///
/// Cheap to clone (holds an `Arc`-backed sender).
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity (clamped to a minimum of 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all active receivers.
    ///
    /// If there are no receivers, the event is dropped and this still returns immediately.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a new receiver that observes events sent after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}
