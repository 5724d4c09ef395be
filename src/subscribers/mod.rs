//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait and the [`SubscriberSet`] fan-out used
//! by the scheduler to deliver [`Event`](crate::Event)s.
//!
//! ## Architecture
//! ```text
//! Scheduler ── publish(Event) ──► Bus ──► subscriber listener ──► SubscriberSet::emit
//!                                                                   │
//!                                                       ┌───────────┼───────────┐
//!                                                       ▼           ▼           ▼
//!                                                   LogWriter    Metrics      Custom
//! ```

mod set;
mod subscribe;

#[cfg(feature = "logging")]
mod embedded;

pub(crate) use set::panic_message;
pub(crate) use set::SubscriberSet;
pub use subscribe::Subscribe;

#[cfg(feature = "logging")]
pub use embedded::LogWriter;
