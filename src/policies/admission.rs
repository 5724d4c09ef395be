//! # Per-key admission policy
//!
//! The scheduler treats work as **slots** identified by a caller-chosen key.
//! At any given time **one** task is active in a slot, and at most **one** more waits
//! behind it. When a new submission for a busy key arrives, the admission policy decides
//! what happens.
//!
//! ## Variants
//! - `RunIfNotRunning`: If the slot is busy, **discard** the new submission (single-flight).
//! - `RunAfterCurrent`: **Queue** the submission as the one pending successor; an older
//!   pending submission is superseded and never runs (coalescing).
//! - `CancelCurrentThenRun`: **Cancel** the active task (and any pending one) and start the
//!   new submission immediately (preemption).
//!
//! ## Invariants
//! - Tasks within the same slot never both count as active (use distinct keys for parallelism).
//! - A free key always starts the submission immediately, whatever the policy.
//!
//! | Policy               | Free key | Active only        | Active + pending             |
//! |----------------------|----------|--------------------|------------------------------|
//! | RunIfNotRunning      | start    | discard            | discard                      |
//! | RunAfterCurrent      | start    | queue              | supersede pending, queue     |
//! | CancelCurrentThenRun | start    | cancel, start      | supersede, cancel, start     |

/// Policy controlling how a submission is handled when its key is busy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Admission {
    /// Skip the submission if the key already has an active task.
    ///
    /// Use when:
    /// - Duplicate requests while one is in flight are redundant
    /// - Example: "load first page" pressed twice
    RunIfNotRunning,

    /// Run after the active task; keep only the newest waiting submission.
    ///
    /// Use when:
    /// - Work must not overlap, and only the latest follow-up matters
    /// - Example: persisting the latest draft after the current save finishes
    RunAfterCurrent,

    /// Cancel whatever runs for the key and start the submission now.
    ///
    /// Use when:
    /// - The new request invalidates the old one
    /// - Example: search-as-you-type
    CancelCurrentThenRun,
}

impl Admission {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            Admission::RunIfNotRunning => "run_if_not_running",
            Admission::RunAfterCurrent => "run_after_current",
            Admission::CancelCurrentThenRun => "cancel_current_then_run",
        }
    }
}

/// What an admission operation did with a submission.
#[must_use = "admission outcome tells whether the work will ever run"]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admitted {
    /// The key was free; the work was started as the active task.
    Started,
    /// The work was installed as the pending successor of the active task.
    Queued,
    /// The active task was cancelled and the work was started in its place.
    Preempted,
    /// The key was busy; the work was dropped without running.
    Discarded,
}

impl Admitted {
    /// Returns `true` if the work was started immediately.
    #[inline]
    pub fn is_started(&self) -> bool {
        matches!(self, Admitted::Started | Admitted::Preempted)
    }

    /// Returns `true` if the work was dropped.
    #[inline]
    pub fn is_discarded(&self) -> bool {
        matches!(self, Admitted::Discarded)
    }
}
