//! # Unit of work submitted to the scheduler.
//!
//! [`Work`] is a one-shot, cancelable async unit. Closures of the shape
//! `FnOnce(CancellationToken) -> impl Future<Output = Result<(), TaskError>>` implement it
//! through a blanket impl, so most callers never name the trait.
//!
//! A work item receives a [`CancellationToken`] that fires when the scheduler cancels it
//! (preemption, `cancel`, shutdown). Cancellation is cooperative: the runner awaits the
//! work to the end, so the body is expected to watch the token and unwind (running any
//! async cleanup it needs). Whatever it returns after the token fired is reported as
//! cancellation.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use slotvisor::{BoxWork, TaskError};
//!
//! let work: BoxWork = Box::new(|ctx: CancellationToken| async move {
//!     tokio::select! {
//!         _ = ctx.cancelled() => {
//!             // release locks, flush buffers...
//!             Err(TaskError::Canceled)
//!         }
//!         _ = tokio::time::sleep(Duration::from_secs(1)) => Ok(()),
//!     }
//! });
//! # let _ = work;
//! ```

use std::future::Future;
use std::pin::Pin;

use tokio_util::sync::CancellationToken;

use crate::error::TaskError;

/// Boxed future produced by [`Work::run`].
pub type BoxWorkFuture = Pin<Box<dyn Future<Output = Result<(), TaskError>> + Send + 'static>>;

/// Owned, type-erased work item.
pub type BoxWork = Box<dyn Work>;

/// # Asynchronous, cancelable, one-shot unit.
///
/// Consumed by [`run`](Work::run): a work item produces exactly one future and never restarts.
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use slotvisor::{BoxWorkFuture, TaskError, Work};
///
/// struct Refresh {
///     page: u32,
/// }
///
/// impl Work for Refresh {
///     fn run(self: Box<Self>, ctx: CancellationToken) -> BoxWorkFuture {
///         Box::pin(async move {
///             if ctx.is_cancelled() {
///                 return Err(TaskError::Canceled);
///             }
///             let _ = self.page;
///             Ok(())
///         })
///     }
/// }
/// ```
pub trait Work: Send + 'static {
    /// Consumes the work item and returns the future to execute.
    ///
    /// Returning `Err(TaskError::Canceled)` is reported as cancellation, not failure.
    fn run(self: Box<Self>, ctx: CancellationToken) -> BoxWorkFuture;
}

impl<F, Fut> Work for F
where
    F: FnOnce(CancellationToken) -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    fn run(self: Box<Self>, ctx: CancellationToken) -> BoxWorkFuture {
        Box::pin((*self)(ctx))
    }
}
