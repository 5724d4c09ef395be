//! # Runtime events emitted by the scheduler and its task runners.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Admission events**: what an admission operation did with a submission
//! - **Lifecycle events**: how a started task terminated
//! - **Slot events**: promotion and cleanup of per-key slots
//! - **Shutdown / subscriber events**: runtime housekeeping
//!
//! The [`Event`] struct carries additional metadata such as timestamps, the key
//! (rendered with `Debug`), the task id and a reason.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Events for one key are published under the registry lock (admission/slot events)
//! or by the task itself (lifecycle events), so `seq` restores their order.
//!
//! ## Example
//! ```rust
//! use slotvisor::{Event, EventKind, TaskId};
//!
//! let ev = Event::new(EventKind::TaskFailed)
//!     .with_key("\"refresh\"")
//!     .with_task_id(TaskId::from_raw(7))
//!     .with_reason("boom");
//!
//! assert_eq!(ev.kind, EventKind::TaskFailed);
//! assert_eq!(ev.key.as_deref(), Some("\"refresh\""));
//! assert_eq!(ev.reason.as_deref(), Some("boom"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::policies::Admission;
use crate::tasks::TaskId;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Admission events ===
    /// A task was installed as active and spawned.
    ///
    /// Sets:
    /// - `key`, `task_id`
    /// - `admission`: operation that started it (absent for promotions)
    TaskStarted,

    /// A task was installed as the pending successor of the active task.
    ///
    /// Sets:
    /// - `key`, `task_id`
    /// - `admission`: always `RunAfterCurrent`
    TaskQueued,

    /// A submission was dropped because the key already had an active task.
    ///
    /// Sets:
    /// - `key`
    /// - `admission`: always `RunIfNotRunning`
    TaskDiscarded,

    /// A pending task was replaced or cancelled before it ever started.
    ///
    /// Sets:
    /// - `key`, `task_id` (of the discarded pending task)
    /// - `reason`: `"replaced"`, `"preempted"` or `"cancelled"`
    TaskSuperseded,

    // === Slot events ===
    /// The pending task was promoted to active after the active task terminated.
    ///
    /// Sets:
    /// - `key`, `task_id` (of the promoted task)
    PendingPromoted,

    /// The slot for a key was removed from the registry.
    ///
    /// Sets:
    /// - `key`
    /// - `reason`: `"finished"` or `"cancelled"`
    SlotCleared,

    /// Slot bookkeeping diverged from reality (coordinator bug).
    ///
    /// Sets:
    /// - `key`, `task_id`
    /// - `reason`: description of the divergence
    InvariantViolated,

    // === Task lifecycle events ===
    /// Task body returned `Ok(())`.
    TaskCompleted,

    /// Task body returned an error (other than `TaskError::Canceled`).
    ///
    /// Sets:
    /// - `reason`: error message
    TaskFailed,

    /// Task body panicked.
    ///
    /// Sets:
    /// - `reason`: panic payload, when it is a string
    TaskPanicked,

    /// Task observed cancellation and unwound.
    TaskCancelled,

    // === Shutdown events ===
    /// Shutdown requested via `Scheduler::shutdown`.
    ShutdownRequested,

    /// All tasks stopped within configured grace period.
    AllStoppedWithin,

    /// Grace period exceeded; some tasks did not stop in time.
    ///
    /// Sets:
    /// - `reason`: number of tasks still running
    GraceExceeded,

    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `reason`: `subscriber=<name> info=<panic info>`
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `reason`: `subscriber=<name> reason=<full|closed>`
    SubscriberOverflow,
}

impl EventKind {
    /// Returns `true` for the kinds that mark the termination of a started task.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            EventKind::TaskCompleted
                | EventKind::TaskFailed
                | EventKind::TaskPanicked
                | EventKind::TaskCancelled
        )
    }
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Key the event refers to, rendered with `Debug`.
    pub key: Option<Arc<str>>,
    /// Identity of the task the event refers to.
    pub task_id: Option<TaskId>,
    /// Admission operation that produced the event.
    pub admission: Option<Admission>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            key: None,
            task_id: None,
            admission: None,
            reason: None,
        }
    }

    /// Attaches the rendered key.
    #[inline]
    pub fn with_key(mut self, key: impl Into<Arc<str>>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Attaches a task identity.
    #[inline]
    pub fn with_task_id(mut self, id: TaskId) -> Self {
        self.task_id = Some(id);
        self
    }

    /// Attaches the admission operation.
    #[inline]
    pub fn with_admission(mut self, admission: Admission) -> Self {
        self.admission = Some(admission);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_reason(format!("subscriber={subscriber} info={info}"))
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }

    #[inline]
    pub fn is_subscriber_panic(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberPanicked)
    }
}
