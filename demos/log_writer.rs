//! # Example: log_writer
//!
//! Demonstrates the built-in [`LogWriter`] subscriber rendering scheduler events
//! through `tracing`.
//!
//! Shows how to:
//! - Install a `tracing_subscriber` formatter.
//! - Wire [`LogWriter`] into [`Scheduler::builder`].
//! - See single-flight discards, coalesced successors and promotions in the log.
//!
//! ## Run
//! Requires the `logging` feature to export [`LogWriter`].
//! ```bash
//! RUST_LOG=slotvisor=debug cargo run --example log_writer --features logging
//! ```

use std::{sync::Arc, time::Duration};

use slotvisor::{BoxWorkFuture, LogWriter, Scheduler, SchedulerConfig, Subscribe, TaskError};
use tokio_util::sync::CancellationToken;

/// Pretend save taking 100ms; draft 0 fails.
fn save(draft: u32) -> impl FnOnce(CancellationToken) -> BoxWorkFuture + Send + 'static {
    move |ctx: CancellationToken| {
        let fut: BoxWorkFuture = Box::pin(async move {
            tokio::select! {
                _ = ctx.cancelled() => Err(TaskError::Canceled),
                _ = tokio::time::sleep(Duration::from_millis(100)) => {
                    if draft == 0 {
                        Err(TaskError::fail("empty draft"))
                    } else {
                        Ok(())
                    }
                }
            }
        });
        fut
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let scheduler: Scheduler<&'static str> = Scheduler::builder(SchedulerConfig::default())
        .with_subscribers(subs)
        .build();

    // Autosave: the current save runs to the end, only the newest draft follows it.
    let _ = scheduler.run_after_current("autosave", save(0)).await?;
    let _ = scheduler.run_after_current("autosave", save(1)).await?;
    let _ = scheduler.run_after_current("autosave", save(2)).await?;

    // Refresh: duplicates while one is in flight are dropped.
    let _ = scheduler.run_if_not_running("refresh", save(3)).await?;
    let _ = scheduler.run_if_not_running("refresh", save(4)).await?;

    tokio::time::sleep(Duration::from_millis(400)).await;
    scheduler.shutdown().await?;

    // Let the subscriber worker drain the last events.
    tokio::time::sleep(Duration::from_millis(50)).await;
    Ok(())
}
