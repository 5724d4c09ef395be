//! # Slot registry - per-key active/pending bookkeeping.
//!
//! The registry maps each key to a [`Slot`]: exactly one **active** task and at most one
//! **pending** successor. It is a plain synchronous state machine; the scheduler owns it
//! behind a single lock and performs every call below while holding that lock.
//!
//! ## Architecture
//! ```text
//! admission op ──► Registry::admit(key, admission, entry)
//!                     ├─► free key            → Start    (entry recorded as active)
//!                     ├─► RunIfNotRunning     → Discard  (entry handed back, dropped)
//!                     ├─► RunAfterCurrent     → Queue    (old pending superseded)
//!                     └─► CancelCurrentThenRun→ Preempt  (pending superseded, active cancelled)
//!
//! task hook ───► Registry::finalize(key, id, token)
//!                     ├─► id is still active, pending present → Promote
//!                     ├─► id is still active, no pending      → Cleared (slot removed)
//!                     └─► slot gone / id replaced             → Stale or Orphaned
//! ```
//!
//! ## Rules
//! - A slot always has an active task; an empty slot is removed, never stored.
//! - Every task leaving a slot other than through its own hook has its token cancelled
//!   here; a stale hook whose token was never cancelled is therefore a bookkeeping bug.
//! - Pending work is never spawned; superseding it drops the work unstarted.

use std::collections::HashMap;
use std::hash::Hash;

use tokio_util::sync::CancellationToken;

use crate::policies::{Admission, Admitted};
use crate::tasks::{BoxWork, TaskId};

/// A task that has been admitted but not yet spawned.
pub(crate) struct TaskEntry {
    pub id: TaskId,
    pub token: CancellationToken,
    pub work: BoxWork,
}

impl TaskEntry {
    /// Wraps work with a fresh identity and cancellation token.
    pub fn new(work: BoxWork) -> Self {
        Self {
            id: TaskId::next(),
            token: CancellationToken::new(),
            work,
        }
    }
}

/// Handle to the running task of a slot.
struct Active {
    id: TaskId,
    token: CancellationToken,
}

/// Per-key state.
struct Slot {
    active: Active,
    pending: Option<TaskEntry>,
}

impl Slot {
    /// Records `entry` as active and returns it for spawning.
    fn occupied_by(entry: &TaskEntry) -> Self {
        Self {
            active: Active {
                id: entry.id,
                token: entry.token.clone(),
            },
            pending: None,
        }
    }

    /// Cancels and drops the pending task, if any.
    fn take_pending(&mut self) -> Option<TaskId> {
        self.pending.take().map(|p| {
            p.token.cancel();
            p.id
        })
    }
}

/// Result of [`Registry::admit`].
pub(crate) enum Decision {
    /// Key was free; `entry` is now active and must be spawned.
    Start(TaskEntry),
    /// `entry` is now the pending task.
    Queue { id: TaskId, superseded: Option<TaskId> },
    /// `entry` replaced the active task and must be spawned.
    Preempt {
        entry: TaskEntry,
        cancelled: TaskId,
        superseded: Option<TaskId>,
    },
    /// Key was busy; the submission was not admitted.
    Discard(TaskEntry),
}

impl Decision {
    pub fn admitted(&self) -> Admitted {
        match self {
            Decision::Start(_) => Admitted::Started,
            Decision::Queue { .. } => Admitted::Queued,
            Decision::Preempt { .. } => Admitted::Preempted,
            Decision::Discard(_) => Admitted::Discarded,
        }
    }
}

/// Result of [`Registry::finalize`].
pub(crate) enum Finalize {
    /// Pending task is now active and must be spawned.
    Promote(TaskEntry),
    /// No successor; slot removed.
    Cleared,
    /// The finishing task was already replaced or cancelled.
    Stale,
    /// The finishing task is not recorded, yet nothing ever cancelled it.
    Orphaned,
}

/// Ids cancelled by [`Registry::cancel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Cancelled {
    pub active: TaskId,
    pub pending: Option<TaskId>,
}

/// Key → slot map plus the closed flag checked by admissions.
pub(crate) struct Registry<K> {
    slots: HashMap<K, Slot>,
    closed: bool,
}

impl<K> Registry<K>
where
    K: Eq + Hash,
{
    /// Creates an empty, open registry.
    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
            closed: false,
        }
    }

    /// Applies `admission` for `key`.
    pub fn admit(&mut self, key: K, admission: Admission, entry: TaskEntry) -> Decision {
        let Some(slot) = self.slots.get_mut(&key) else {
            self.slots.insert(key, Slot::occupied_by(&entry));
            return Decision::Start(entry);
        };

        match admission {
            Admission::RunIfNotRunning => Decision::Discard(entry),
            Admission::RunAfterCurrent => {
                let superseded = slot.take_pending();
                let id = entry.id;
                slot.pending = Some(entry);
                Decision::Queue { id, superseded }
            }
            Admission::CancelCurrentThenRun => {
                let superseded = slot.take_pending();
                let old = std::mem::replace(
                    &mut slot.active,
                    Active {
                        id: entry.id,
                        token: entry.token.clone(),
                    },
                );
                old.token.cancel();
                Decision::Preempt {
                    entry,
                    cancelled: old.id,
                    superseded,
                }
            }
        }
    }

    /// Runs the completion bookkeeping for task `id` of `key`.
    ///
    /// `token` is the finishing task's own token; it tells a legitimately replaced task
    /// (token cancelled by `admit`/`cancel`) from one the registry lost track of.
    pub fn finalize(&mut self, key: &K, id: TaskId, token: &CancellationToken) -> Finalize {
        match self.slots.get_mut(key) {
            Some(slot) if slot.active.id == id => match slot.pending.take() {
                Some(next) => {
                    slot.active = Active {
                        id: next.id,
                        token: next.token.clone(),
                    };
                    Finalize::Promote(next)
                }
                None => {
                    self.slots.remove(key);
                    Finalize::Cleared
                }
            },
            _ if token.is_cancelled() => Finalize::Stale,
            _ => Finalize::Orphaned,
        }
    }

    /// Cancels everything recorded for `key` and removes its slot.
    pub fn cancel(&mut self, key: &K) -> Option<Cancelled> {
        let mut slot = self.slots.remove(key)?;
        let pending = slot.take_pending();
        slot.active.token.cancel();
        Some(Cancelled {
            active: slot.active.id,
            pending,
        })
    }

    /// Cancels every slot and empties the registry.
    pub fn cancel_all(&mut self) -> Vec<(K, Cancelled)> {
        self.slots
            .drain()
            .map(|(key, mut slot)| {
                let pending = slot.take_pending();
                slot.active.token.cancel();
                let ids = Cancelled {
                    active: slot.active.id,
                    pending,
                };
                (key, ids)
            })
            .collect()
    }

    /// Marks the registry closed; later admissions are refused by the scheduler.
    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.slots.contains_key(key)
    }

    pub fn has_pending(&self, key: &K) -> bool {
        self.slots.get(key).is_some_and(|s| s.pending.is_some())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.slots.keys()
    }
}
