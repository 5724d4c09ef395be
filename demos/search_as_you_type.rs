//! # Example: search_as_you_type
//!
//! Demonstrates preemption with [`Scheduler::cancel_current_then_run`].
//!
//! Shows how to:
//! - Submit one query per keystroke under the same key.
//! - Let each query observe its [`CancellationToken`] and clean up when a newer
//!   keystroke replaces it.
//! - Watch only the last query complete.
//!
//! ## Flow
//! ```text
//! keystroke "r"    ──► cancel_current_then_run("search") → Started
//! keystroke "ru"   ──► cancel_current_then_run("search") → Preempted ("r" cancelled)
//! keystroke "rus"  ──► ...                               → Preempted ("ru" cancelled)
//! keystroke "rust" ──► ...                               → Preempted ("rus" cancelled)
//!                                                          "rust" completes
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example search_as_you_type
//! ```

use std::time::Duration;

use slotvisor::{Scheduler, SchedulerConfig, TaskError};
use tokio_util::sync::CancellationToken;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    println!("=== search_as_you_type example ===\n");

    let scheduler: Scheduler<&'static str> = Scheduler::new(SchedulerConfig::default());

    for query in ["r", "ru", "rus", "rust"] {
        let admitted = scheduler
            .cancel_current_then_run("search", move |ctx: CancellationToken| async move {
                println!("[search] querying {query:?}");
                tokio::select! {
                    _ = ctx.cancelled() => {
                        println!("[search] {query:?} superseded, dropping partial results");
                        Err(TaskError::Canceled)
                    }
                    _ = tokio::time::sleep(Duration::from_millis(150)) => {
                        println!("[search] results for {query:?}");
                        Ok(())
                    }
                }
            })
            .await?;
        println!("[keyboard] typed {query:?} -> {admitted:?}");

        // Typing speed: faster than a query takes.
        tokio::time::sleep(Duration::from_millis(60)).await;
    }

    tokio::time::sleep(Duration::from_millis(300)).await;
    println!("\nsearch slot still busy: {}", scheduler.contains_key(&"search").await);

    scheduler.shutdown().await?;
    Ok(())
}
