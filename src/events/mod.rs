//! Scheduler events: types and broadcast bus.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: admission operations and the completion hook (under the
//!   registry lock), task runners (lifecycle), `SubscriberSet` workers (overflow/panic),
//!   `Scheduler::shutdown`.
//! - **Consumers**: the scheduler's subscriber listener (fans out to `SubscriberSet`)
//!   and any receiver obtained from `Scheduler::subscribe`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
