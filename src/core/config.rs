//! # Scheduler configuration.
//!
//! Provides [`SchedulerConfig`], the settings a [`Scheduler`](crate::Scheduler) is built with.
//!
//! ## Sentinel values
//! - `grace = 0s` → `shutdown()` cancels everything without waiting; tasks still
//!   unwinding at that instant are reported as stuck
//! - `bus_capacity = 0` → clamped to 1

use std::time::Duration;

/// Configuration for a scheduler instance.
///
/// ## Field semantics
/// - `bus_capacity`: Event bus ring buffer size (min 1; clamped by Bus)
/// - `grace`: Maximum wait in `shutdown()` for cancelled tasks to unwind
///
/// ## Notes
/// All fields are public; prefer the helper accessors over sentinel checks.
#[derive(Clone, Debug)]
pub struct SchedulerConfig {
    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Receivers that lag behind more than `bus_capacity` events observe `Lagged`
    /// and skip older items.
    pub bus_capacity: usize,

    /// Maximum time `shutdown()` waits for cancelled tasks to finish unwinding.
    ///
    /// If exceeded, `shutdown()` returns `RuntimeError::GraceExceeded`.
    pub grace: Duration,
}

impl SchedulerConfig {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns the shutdown grace period as an `Option`.
    ///
    /// - `None` → do not wait for tasks to unwind
    /// - `Some(d)` → wait up to `d`
    #[inline]
    pub fn grace_period(&self) -> Option<Duration> {
        if self.grace == Duration::ZERO {
            None
        } else {
            Some(self.grace)
        }
    }
}

impl Default for SchedulerConfig {
    /// Default configuration:
    ///
    /// - `bus_capacity = 1024`
    /// - `grace = 30s`
    fn default() -> Self {
        Self {
            bus_capacity: 1024,
            grace: Duration::from_secs(30),
        }
    }
}
