//! Error types used by the scheduler and by submitted work.
//!
//! - [`TaskError`] - errors returned by a work item.
//! - [`SubmitError`] - a submission the scheduler refused outright.
//! - [`RuntimeError`] - errors raised by the scheduler runtime itself.
//!
//! Admission conflicts (a discarded duplicate, a superseded pending task, a preempted
//! active task) are **not** errors; they are reported through
//! [`Admitted`](crate::Admitted) and the event bus.
//!
//! All types provide `as_label` (stable snake_case label for logs/metrics) and, where
//! useful, `as_message`.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by the scheduler runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Shutdown grace period was exceeded; some tasks were still unwinding.
    #[error("shutdown timeout {grace:?} exceeded; {stuck} task(s) still running")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Number of tasks that did not finish in time.
        stuck: usize,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use slotvisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: 2 };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::GraceExceeded { grace, stuck } => {
                format!("grace exceeded after {grace:?}; stuck tasks={stuck}")
            }
        }
    }
}

/// # Submission refused by the scheduler.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
    /// The scheduler was shut down; no new work is admitted.
    #[error("scheduler closed")]
    Closed,
}

impl SubmitError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            SubmitError::Closed => "submit_closed",
        }
    }
}

/// # Errors produced by work execution.
///
/// The scheduler never retries or suppresses these; it reports them on the event bus
/// and still runs slot bookkeeping.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TaskError {
    /// A deadline owned by the work item elapsed.
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    /// Work failed.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Work observed cancellation and stopped.
    #[error("context cancelled")]
    Canceled,
}

impl TaskError {
    /// Shorthand for [`TaskError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        TaskError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use slotvisor::TaskError;
    /// use std::time::Duration;
    ///
    /// let err = TaskError::Timeout { timeout: Duration::from_secs(1) };
    /// assert_eq!(err.as_label(), "task_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Timeout { .. } => "task_timeout",
            TaskError::Fail { .. } => "task_failed",
            TaskError::Canceled => "task_canceled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::Timeout { timeout } => format!("timeout: {timeout:?}"),
            TaskError::Fail { error } => format!("error: {error}"),
            TaskError::Canceled => "context cancelled".to_string(),
        }
    }

    /// Returns `true` when the error is a cancellation acknowledgement rather than a failure.
    ///
    /// ```
    /// use slotvisor::TaskError;
    ///
    /// assert!(TaskError::Canceled.is_cancellation());
    /// assert!(!TaskError::fail("boom").is_cancellation());
    /// ```
    pub fn is_cancellation(&self) -> bool {
        matches!(self, TaskError::Canceled)
    }
}
