//! # Run one admitted task and finalize its slot.
//!
//! Executes the work of one [`TaskEntry`], publishes exactly one terminal event to the
//! [`Bus`], then runs the scheduler's completion hook.
//!
//! ## Event flow
//! ```text
//! Success:       work → Ok(())                      → publish TaskCompleted
//! Cancellation:  token fired before work returned   → publish TaskCancelled
//!                work → Err(Canceled)               → publish TaskCancelled
//! Failure:       work → Err(Fail/Timeout)           → publish TaskFailed
//! Panic:         work panicked                      → publish TaskPanicked
//!
//! then always:   Scheduler::finalize(key, id, token)
//!                (a panic is resumed only after finalize)
//! ```
//!
//! ## Rules
//! - Cancellation is cooperative: the work receives the token and unwinds on its own;
//!   the runner awaits it to the end.
//! - A task whose token fired is never reported as completed, whatever it returned.
//! - The completion hook runs on every exit path, including panics.

use std::fmt::Debug;
use std::hash::Hash;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use super::{registry::TaskEntry, scheduler::Scheduler};
use crate::{
    error::TaskError,
    events::{Bus, Event, EventKind},
    subscribers::panic_message,
    tasks::{BoxWork, TaskId},
};

/// Runs `entry` to termination, then finalizes its slot.
pub(super) async fn run<K>(scheduler: Scheduler<K>, key: K, label: Arc<str>, entry: TaskEntry)
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
{
    let TaskEntry { id, token, work } = entry;

    let outcome = AssertUnwindSafe(execute(work, token.clone()))
        .catch_unwind()
        .await;

    match &outcome {
        Ok(res) => publish_result(scheduler.bus(), &label, id, res),
        Err(panic) => {
            let info = panic_message(&**panic);
            tracing::debug!(key = %label, task = %id, info = %info, "task panicked");
            scheduler.bus().publish(
                Event::new(EventKind::TaskPanicked)
                    .with_key(Arc::clone(&label))
                    .with_task_id(id)
                    .with_reason(info),
            );
        }
    }

    scheduler.finalize(key, &label, id, &token).await;

    if let Err(panic) = outcome {
        std::panic::resume_unwind(panic);
    }
}

/// Awaits the work future to completion.
///
/// A result that arrives after `token` fired is reported as [`TaskError::Canceled`].
async fn execute(work: BoxWork, token: CancellationToken) -> Result<(), TaskError> {
    let res = work.run(token.clone()).await;
    if token.is_cancelled() {
        match &res {
            Err(e) if !e.is_cancellation() => {
                tracing::debug!(error = %e, "cancelled task returned an error while unwinding");
            }
            _ => {}
        }
        return Err(TaskError::Canceled);
    }
    res
}

/// Publishes the terminal event for a work result.
fn publish_result(bus: &Bus, label: &Arc<str>, id: TaskId, res: &Result<(), TaskError>) {
    let ev = match res {
        Ok(()) => Event::new(EventKind::TaskCompleted),
        Err(e) if e.is_cancellation() => Event::new(EventKind::TaskCancelled),
        Err(e) => {
            tracing::debug!(key = %label, task = %id, error_kind = e.as_label(), "task failed");
            Event::new(EventKind::TaskFailed).with_reason(e.to_string())
        }
    };
    bus.publish(ev.with_key(Arc::clone(label)).with_task_id(id));
}
