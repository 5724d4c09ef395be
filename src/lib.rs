//! # slotvisor
//!
//! **Slotvisor** is a keyed coordinator for asynchronous work on tokio.
//!
//! Callers pick a key and submit one-shot async work under an admission policy. For each
//! key the scheduler keeps at most one **active** task and at most one **pending**
//! successor, and decides atomically whether new work starts, waits, replaces the active
//! task, or is dropped.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   run_if_not_running  run_after_current  cancel_current_then_run  cancel
//!            │                  │                    │                 │
//!            ▼                  ▼                    ▼                 ▼
//! ┌───────────────────────────────────────────────────────────────────────────┐
//! │  Scheduler                                                                │
//! │  - Registry (key → Slot { active, pending }) behind one async mutex       │
//! │  - TaskTracker (spawns admitted work on the runtime handle)               │
//! │  - Bus (broadcast events)                                                 │
//! │  - SubscriberSet (fans out to user subscribers)                           │
//! └──────┬──────────────────┬──────────────────┬──────────────────────────────┘
//!        ▼                  ▼                  ▼
//!     ┌──────────┐       ┌──────────┐       ┌──────────┐
//!     │  runner  │       │  runner  │       │  runner  │   one per started task
//!     │ (key A)  │       │ (key B)  │       │ (key C)  │
//!     └────┬─────┘       └────┬─────┘       └────┬─────┘
//!          │ TaskCompleted / TaskFailed / TaskCancelled / TaskPanicked
//!          ▼
//!     completion hook (under the registry lock):
//!          ├─ still active + pending  → promote pending, spawn it
//!          ├─ still active, no pending→ remove slot
//!          └─ replaced / cancelled    → leave slot alone
//! ```
//!
//! ### Lifecycle of one key
//! ```text
//! (no slot) ──admit──► [active]            ──hook──► (no slot)
//!                         │ run_after_current
//!                         ▼
//!                      [active, pending]   ──hook──► [pending promoted to active]
//!                         │ cancel_current_then_run
//!                         ▼
//!                      [new active]        (old active cancelled, pending superseded)
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                        |
//! |-------------------|--------------------------------------------------------------|-------------------------------------------|
//! | **Admission**     | Single-flight, queue-one, preempt, cancel per key.           | [`Scheduler`], [`Admission`], [`Admitted`]|
//! | **Work**          | One-shot cancelable async units (closures or custom types).  | [`Work`], [`TaskId`]                      |
//! | **Subscriber API**| Hook into admission and lifecycle events.                    | [`Subscribe`], [`Event`], [`EventKind`]   |
//! | **Errors**        | Typed errors for work, submission and shutdown.              | [`TaskError`], [`SubmitError`], [`RuntimeError`] |
//! | **Configuration** | Bus capacity and shutdown grace.                             | [`SchedulerConfig`]                       |
//!
//! ## Optional features
//! - `logging`: exports a built-in [`LogWriter`] that renders events through `tracing`.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use slotvisor::{Scheduler, SchedulerConfig, TaskError};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let scheduler: Scheduler<&'static str> = Scheduler::new(SchedulerConfig::default());
//!
//!     // Search-as-you-type: every keystroke preempts the previous query.
//!     for query in ["r", "ru", "rus", "rust"] {
//!         let admitted = scheduler
//!             .cancel_current_then_run("search", move |ctx: CancellationToken| async move {
//!                 tokio::select! {
//!                     _ = ctx.cancelled() => Err(TaskError::Canceled),
//!                     _ = tokio::time::sleep(Duration::from_millis(20)) => {
//!                         println!("results for {query}");
//!                         Ok(())
//!                     }
//!                 }
//!             })
//!             .await?;
//!         assert!(admitted.is_started());
//!     }
//!
//!     tokio::time::sleep(Duration::from_millis(50)).await;
//!     assert!(scheduler.is_empty().await);
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod policies;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use crate::core::{Scheduler, SchedulerBuilder, SchedulerConfig};
pub use error::{RuntimeError, SubmitError, TaskError};
pub use events::{Event, EventKind};
pub use policies::{Admission, Admitted};
pub use subscribers::Subscribe;
pub use tasks::{BoxWork, BoxWorkFuture, TaskId, Work};

// Optional: expose a simple built-in logger subscriber.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
