//! # Task identity.
//!
//! Every task admitted by the scheduler gets a fresh [`TaskId`]. The completion hook
//! compares ids, never closures, to decide whether a finishing task still owns its slot.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

/// Global counter for task ids (starts at 1).
static TASK_SEQ: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of one admitted task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    /// Allocates the next id.
    pub(crate) fn next() -> Self {
        Self(TASK_SEQ.fetch_add(1, AtomicOrdering::Relaxed))
    }

    /// Wraps a raw value, for tests and hand-built events.
    ///
    /// The scheduler does not track ids made this way; they may equal an id it allocated.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw numeric value.
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
