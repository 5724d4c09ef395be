//! # LogWriter: events as `tracing` records
//!
//! A minimal subscriber that renders incoming [`Event`]s through `tracing`, so scheduler
//! activity shows up in whatever `tracing` subscriber the application installed.
//!
//! ## Example output (with `tracing_subscriber::fmt`)
//! ```text
//! INFO slotvisor: started key="search" task=#3 admission=cancel_current_then_run
//! INFO slotvisor: superseded key="save" task=#5 reason=replaced
//! WARN slotvisor: failed key="load" task=#7 err=execution failed: timeout
//! INFO slotvisor: slot cleared key="load" reason=finished
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let key = e.key.as_deref().unwrap_or("-");
        let task = e.task_id.map(|id| id.to_string()).unwrap_or_default();
        let reason = e.reason.as_deref().unwrap_or("");
        let admission = e.admission.map(|a| a.as_label()).unwrap_or("");

        match e.kind {
            EventKind::TaskStarted => {
                tracing::info!(target: "slotvisor", key, task = %task, admission, "started");
            }
            EventKind::TaskQueued => {
                tracing::info!(target: "slotvisor", key, task = %task, "queued");
            }
            EventKind::TaskDiscarded => {
                tracing::debug!(target: "slotvisor", key, admission, "discarded");
            }
            EventKind::TaskSuperseded => {
                tracing::info!(target: "slotvisor", key, task = %task, reason, "superseded");
            }
            EventKind::PendingPromoted => {
                tracing::info!(target: "slotvisor", key, task = %task, "promoted");
            }
            EventKind::SlotCleared => {
                tracing::info!(target: "slotvisor", key, reason, "slot cleared");
            }
            EventKind::InvariantViolated => {
                tracing::error!(target: "slotvisor", key, task = %task, reason, "invariant violated");
            }
            EventKind::TaskCompleted => {
                tracing::info!(target: "slotvisor", key, task = %task, "completed");
            }
            EventKind::TaskFailed => {
                tracing::warn!(target: "slotvisor", key, task = %task, err = reason, "failed");
            }
            EventKind::TaskPanicked => {
                tracing::error!(target: "slotvisor", key, task = %task, info = reason, "panicked");
            }
            EventKind::TaskCancelled => {
                tracing::info!(target: "slotvisor", key, task = %task, "cancelled");
            }
            EventKind::ShutdownRequested => {
                tracing::info!(target: "slotvisor", "shutdown requested");
            }
            EventKind::AllStoppedWithin => {
                tracing::info!(target: "slotvisor", "all stopped within grace");
            }
            EventKind::GraceExceeded => {
                tracing::warn!(target: "slotvisor", stuck = reason, "grace exceeded");
            }
            EventKind::SubscriberOverflow => {
                tracing::warn!(target: "slotvisor", reason, "subscriber overflow");
            }
            EventKind::SubscriberPanicked => {
                tracing::warn!(target: "slotvisor", reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
