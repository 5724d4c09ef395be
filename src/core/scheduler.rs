//! # Scheduler: keyed admission of async work.
//!
//! The [`Scheduler`] owns the slot [`Registry`] behind one async mutex, spawns admitted
//! work through a [`TaskTracker`], and runs the completion hook for every task it started.
//!
//! ## Architecture
//! ```text
//! run_if_not_running ─┐
//! run_after_current  ─┼─► submit(key, Admission, work)
//! cancel_current_then_run┘      │
//!                               ├─► lock registry ─► Registry::admit ─► publish events
//!                               │                         └─► spawn(runner::run)   (Start/Preempt)
//!                               └─► unlock, return Admitted
//!
//! runner::run (per task) ──► work future (select with token) ──► publish terminal event
//!                        └─► finalize: lock registry ─► Registry::finalize
//!                                                       ├─► Promote → spawn successor
//!                                                       ├─► Cleared → SlotCleared
//!                                                       └─► Stale / Orphaned
//! ```
//!
//! ## Rules
//! - The lock is held only for bookkeeping, spawning and event publishing; never while
//!   work runs, so work may re-enter the scheduler for any key.
//! - Admission calls never wait for the submitted work.
//! - A pending task starts only from the active task's hook.

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::{Mutex, broadcast};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use super::{
    builder::SchedulerBuilder,
    config::SchedulerConfig,
    registry::{Cancelled, Decision, Finalize, Registry, TaskEntry},
    runner,
};
use crate::{
    error::{RuntimeError, SubmitError, TaskError},
    events::{Bus, Event, EventKind},
    policies::{Admission, Admitted},
    tasks::{BoxWork, TaskId, Work},
};

/// Shared state behind every [`Scheduler`] clone.
struct Inner<K> {
    cfg: SchedulerConfig,
    bus: Bus,
    registry: Mutex<Registry<K>>,
    tracker: TaskTracker,
    runtime: Handle,
    /// Stops the subscriber listener once the last handle is gone.
    listener_token: CancellationToken,
}

impl<K> Drop for Inner<K> {
    fn drop(&mut self) {
        self.listener_token.cancel();
    }
}

/// Keyed coordinator for asynchronous work.
///
/// Cheap to clone; clones share one registry. Work closures may capture a clone and
/// submit further work (for the same or another key) while they run.
///
/// ## Example
/// ```rust
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
/// use slotvisor::{Admitted, Scheduler, SchedulerConfig, TaskError};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let scheduler: Scheduler<&'static str> = Scheduler::new(SchedulerConfig::default());
///
///     let first = scheduler
///         .run_if_not_running("refresh", |_ctx: CancellationToken| async move {
///             tokio::time::sleep(Duration::from_millis(50)).await;
///             Ok::<(), TaskError>(())
///         })
///         .await?;
///     assert_eq!(first, Admitted::Started);
///
///     // Same key while the first is in flight: dropped.
///     let second = scheduler
///         .run_if_not_running("refresh", |_ctx: CancellationToken| async move {
///             Ok::<(), TaskError>(())
///         })
///         .await?;
///     assert_eq!(second, Admitted::Discarded);
///
///     scheduler.shutdown().await?;
///     Ok(())
/// }
/// ```
pub struct Scheduler<K> {
    inner: Arc<Inner<K>>,
}

impl<K> Clone for Scheduler<K> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K> Scheduler<K>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
{
    /// Creates a scheduler with no subscribers on the current tokio runtime.
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime (use [`Scheduler::builder`] with
    /// [`SchedulerBuilder::with_runtime`] to supply one explicitly).
    pub fn new(cfg: SchedulerConfig) -> Self {
        SchedulerBuilder::new(cfg).build()
    }

    /// Starts building a scheduler with subscribers or an explicit runtime.
    pub fn builder(cfg: SchedulerConfig) -> SchedulerBuilder<K> {
        SchedulerBuilder::new(cfg)
    }

    pub(super) fn new_internal(
        cfg: SchedulerConfig,
        bus: Bus,
        runtime: Handle,
        listener_token: CancellationToken,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                cfg,
                bus,
                registry: Mutex::new(Registry::new()),
                tracker: TaskTracker::new(),
                runtime,
                listener_token,
            }),
        }
    }

    /// Starts `work` unless a task is already active for `key` (single-flight).
    ///
    /// Returns [`Admitted::Started`] or [`Admitted::Discarded`].
    pub async fn run_if_not_running<F, Fut>(&self, key: K, work: F) -> Result<Admitted, SubmitError>
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        self.submit(key, Admission::RunIfNotRunning, work).await
    }

    /// Starts `work` now if `key` is free, otherwise makes it the one pending successor
    /// of the active task (an older pending submission is superseded and never runs).
    ///
    /// Returns [`Admitted::Started`] or [`Admitted::Queued`].
    pub async fn run_after_current<F, Fut>(&self, key: K, work: F) -> Result<Admitted, SubmitError>
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        self.submit(key, Admission::RunAfterCurrent, work).await
    }

    /// Cancels whatever is active or pending for `key` and starts `work` immediately.
    ///
    /// The preempted body is not awaited; it may still be unwinding while `work` runs.
    ///
    /// Returns [`Admitted::Started`] or [`Admitted::Preempted`].
    pub async fn cancel_current_then_run<F, Fut>(
        &self,
        key: K,
        work: F,
    ) -> Result<Admitted, SubmitError>
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        self.submit(key, Admission::CancelCurrentThenRun, work).await
    }

    /// Applies `admission` to `work` for `key`.
    ///
    /// Returns once the decision is recorded (and the task spawned, if it starts);
    /// never waits for the work itself. Fails only after [`Scheduler::shutdown`].
    pub async fn submit<W: Work>(
        &self,
        key: K,
        admission: Admission,
        work: W,
    ) -> Result<Admitted, SubmitError> {
        let work: BoxWork = Box::new(work);
        let entry = TaskEntry::new(work);
        let label = key_label(&key);

        let mut registry = self.inner.registry.lock().await;
        if registry.is_closed() {
            return Err(SubmitError::Closed);
        }

        let decision = registry.admit(key.clone(), admission, entry);
        let admitted = decision.admitted();
        match decision {
            Decision::Start(entry) => {
                self.publish_started(&label, entry.id, Some(admission));
                self.spawn(key, label, entry);
            }
            Decision::Queue { id, superseded } => {
                if let Some(old) = superseded {
                    self.publish_superseded(&label, old, "replaced");
                }
                self.inner.bus.publish(
                    Event::new(EventKind::TaskQueued)
                        .with_key(Arc::clone(&label))
                        .with_task_id(id)
                        .with_admission(admission),
                );
            }
            Decision::Preempt {
                entry,
                cancelled,
                superseded,
            } => {
                if let Some(old) = superseded {
                    self.publish_superseded(&label, old, "preempted");
                }
                tracing::debug!(key = %label, cancelled = %cancelled, task = %entry.id, "preempting active task");
                self.publish_started(&label, entry.id, Some(admission));
                self.spawn(key, label, entry);
            }
            Decision::Discard(entry) => {
                tracing::debug!(key = %label, task = %entry.id, "key busy, submission discarded");
                self.inner.bus.publish(
                    Event::new(EventKind::TaskDiscarded)
                        .with_key(label)
                        .with_admission(admission),
                );
            }
        }
        Ok(admitted)
    }

    /// Cancels the active and pending task for `key` and clears its slot.
    ///
    /// Returns `false` if nothing was registered for `key`. Does not wait for the
    /// cancelled task to unwind.
    pub async fn cancel(&self, key: &K) -> bool {
        let mut registry = self.inner.registry.lock().await;
        match registry.cancel(key) {
            Some(ids) => {
                self.publish_cancelled(&key_label(key), ids);
                true
            }
            None => false,
        }
    }

    /// Cancels every task for every key and clears the registry.
    ///
    /// Returns the number of keys cleared. New submissions are still accepted.
    pub async fn cancel_all(&self) -> usize {
        let mut registry = self.inner.registry.lock().await;
        self.cancel_all_locked(&mut registry)
    }

    /// Stops admitting work, cancels everything, and waits up to
    /// [`SchedulerConfig::grace`] for spawned tasks to finish unwinding.
    ///
    /// After this call every admission returns [`SubmitError::Closed`].
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        self.inner
            .bus
            .publish(Event::new(EventKind::ShutdownRequested));
        {
            let mut registry = self.inner.registry.lock().await;
            registry.close();
            self.cancel_all_locked(&mut registry);
        }

        let tracker = &self.inner.tracker;
        tracker.close();
        let stopped = match self.inner.cfg.grace_period() {
            Some(grace) => tokio::time::timeout(grace, tracker.wait()).await.is_ok(),
            None => tracker.is_empty(),
        };

        if stopped {
            self.inner
                .bus
                .publish(Event::new(EventKind::AllStoppedWithin));
            Ok(())
        } else {
            let stuck = tracker.len();
            tracing::warn!(stuck, grace = ?self.inner.cfg.grace, "tasks still running after shutdown grace");
            self.inner
                .bus
                .publish(Event::new(EventKind::GraceExceeded).with_reason(stuck.to_string()));
            Err(RuntimeError::GraceExceeded {
                grace: self.inner.cfg.grace,
                stuck,
            })
        }
    }

    /// Returns `true` if `key` has an active task.
    pub async fn contains_key(&self, key: &K) -> bool {
        self.inner.registry.lock().await.contains_key(key)
    }

    /// Returns `true` if `key` has a pending successor.
    pub async fn has_pending(&self, key: &K) -> bool {
        self.inner.registry.lock().await.has_pending(key)
    }

    /// Number of keys with an active task.
    pub async fn len(&self) -> usize {
        self.inner.registry.lock().await.len()
    }

    /// Returns `true` if no key has an active task.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Snapshot of the keys with an active task (unordered).
    pub async fn keys(&self) -> Vec<K> {
        self.inner.registry.lock().await.keys().cloned().collect()
    }

    /// Creates a receiver for events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.inner.bus.subscribe()
    }

    /// Returns the configuration this scheduler was built with.
    pub fn config(&self) -> &SchedulerConfig {
        &self.inner.cfg
    }

    pub(super) fn bus(&self) -> &Bus {
        &self.inner.bus
    }

    /// Completion hook: runs once per started task, after its work terminated.
    pub(super) async fn finalize(
        &self,
        key: K,
        label: &Arc<str>,
        id: TaskId,
        token: &CancellationToken,
    ) {
        let mut registry = self.inner.registry.lock().await;
        match registry.finalize(&key, id, token) {
            Finalize::Promote(next) => {
                self.inner.bus.publish(
                    Event::new(EventKind::PendingPromoted)
                        .with_key(Arc::clone(label))
                        .with_task_id(next.id),
                );
                self.publish_started(label, next.id, None);
                self.spawn(key, Arc::clone(label), next);
            }
            Finalize::Cleared => {
                self.inner.bus.publish(
                    Event::new(EventKind::SlotCleared)
                        .with_key(Arc::clone(label))
                        .with_reason("finished"),
                );
            }
            Finalize::Stale => {
                tracing::debug!(key = %label, task = %id, "replaced task finished, slot untouched");
            }
            Finalize::Orphaned => {
                tracing::error!(key = %label, task = %id, "finished task missing from its slot but never cancelled");
                self.inner.bus.publish(
                    Event::new(EventKind::InvariantViolated)
                        .with_key(Arc::clone(label))
                        .with_task_id(id)
                        .with_reason("task_missing_from_slot"),
                );
            }
        }
    }

    /// Spawns the runner for an entry already recorded as active.
    fn spawn(&self, key: K, label: Arc<str>, entry: TaskEntry) {
        let fut = runner::run(self.clone(), key, label, entry);
        self.inner.tracker.spawn_on(fut, &self.inner.runtime);
    }

    fn cancel_all_locked(&self, registry: &mut Registry<K>) -> usize {
        let cleared = registry.cancel_all();
        for (key, ids) in &cleared {
            self.publish_cancelled(&key_label(key), *ids);
        }
        cleared.len()
    }

    fn publish_started(&self, label: &Arc<str>, id: TaskId, admission: Option<Admission>) {
        let mut ev = Event::new(EventKind::TaskStarted)
            .with_key(Arc::clone(label))
            .with_task_id(id);
        if let Some(admission) = admission {
            ev = ev.with_admission(admission);
        }
        self.inner.bus.publish(ev);
    }

    fn publish_superseded(&self, label: &Arc<str>, id: TaskId, reason: &'static str) {
        self.inner.bus.publish(
            Event::new(EventKind::TaskSuperseded)
                .with_key(Arc::clone(label))
                .with_task_id(id)
                .with_reason(reason),
        );
    }

    fn publish_cancelled(&self, label: &Arc<str>, ids: Cancelled) {
        if let Some(pending) = ids.pending {
            self.publish_superseded(label, pending, "cancelled");
        }
        tracing::debug!(key = %label, task = %ids.active, "cancel requested");
        self.inner.bus.publish(
            Event::new(EventKind::SlotCleared)
                .with_key(Arc::clone(label))
                .with_reason("cancelled"),
        );
    }
}

/// Renders a key for events and log records.
fn key_label<K: Debug>(key: &K) -> Arc<str> {
    format!("{key:?}").into()
}
