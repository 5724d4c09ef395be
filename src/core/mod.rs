//! Runtime core: registry, admission and task lifecycle.
//!
//! The public API from this module is [`Scheduler`], [`SchedulerBuilder`] and
//! [`SchedulerConfig`].
//!
//! Internal modules:
//! - [`registry`]: per-key slot bookkeeping (active + pending) and its invariants;
//! - [`scheduler`]: admission operations, completion hook, cancellation, shutdown;
//! - [`runner`]: executes one task with cancellation and reports its outcome;
//! - [`builder`]: wires bus, subscribers and runtime handle;
//! - [`config`]: scheduler settings.

mod builder;
mod config;
mod registry;
mod runner;
mod scheduler;

pub use builder::SchedulerBuilder;
pub use config::SchedulerConfig;
pub use scheduler::Scheduler;
