//! # SubscriberSet: non-blocking fan-out over multiple subscribers
//!
//! [`SubscriberSet`] distributes each [`Event`] to multiple subscribers **without
//! awaiting** their processing.
//!
//! ## What it guarantees
//! - `emit(&Event)` returns immediately.
//! - Per-subscriber FIFO (queue order).
//! - Panics inside subscribers are caught and republished (isolation); a panic while
//!   handling a `SubscriberPanicked` event is only logged, so panics cannot feed back.
//!
//! ## What it does **not** guarantee
//! - No global ordering across different subscribers.
//! - No retries on per-subscriber queue overflow.
//!
//! ## Diagram
//! ```text
//!    emit(&Event)
//!        │                        (Arc-clone per subscriber)
//!        ├────────────────► [queue S1] ─► worker S1 ─► on_event()
//!        ├────────────────► [queue S2] ─► worker S2 ─► on_event()
//!        └────────────────► [queue SN] ─► worker SN ─► on_event()
//! ```
//!
//! Workers exit once the set is dropped (their queues close).

use std::any::Any;
use std::sync::Arc;

use futures::FutureExt;
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use super::Subscribe;
use crate::events::{Bus, Event, EventKind};

/// Per-subscriber channel with metadata.
struct SubscriberChannel {
    name: &'static str,
    sender: mpsc::Sender<Arc<Event>>,
}

/// Composite fan-out with per-subscriber bounded queues and worker tasks.
pub struct SubscriberSet {
    channels: Vec<SubscriberChannel>,
    bus: Bus,
}

impl SubscriberSet {
    /// Creates a new set and spawns one worker per subscriber on `runtime`.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus, runtime: &Handle) -> Self {
        let mut channels = Vec::with_capacity(subs.len());

        for sub in subs {
            let name = sub.name();
            let (tx, mut rx) = mpsc::channel::<Arc<Event>>(sub.queue_capacity().max(1));
            let worker_bus = bus.clone();

            runtime.spawn(async move {
                while let Some(ev) = rx.recv().await {
                    let fut = sub.on_event(ev.as_ref());
                    if let Err(panic) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                        let info = panic_message(&*panic);
                        tracing::warn!(subscriber = name, info = %info, "subscriber panicked");
                        // No panic-on-panic events.
                        if !ev.is_subscriber_panic() {
                            worker_bus.publish(Event::subscriber_panicked(name, info));
                        }
                    }
                }
            });

            channels.push(SubscriberChannel { name, sender: tx });
        }

        Self { channels, bus }
    }

    /// Fan-out one event to all subscribers (non-blocking).
    ///
    /// If a subscriber's queue is **full** or **closed**, the event is dropped for it
    /// and a `SubscriberOverflow` event is published.
    pub fn emit(&self, event: &Event) {
        // No overflow-on-overflow events.
        let is_overflow_evt = matches!(event.kind, EventKind::SubscriberOverflow);

        let ev = Arc::new(event.clone());
        for channel in &self.channels {
            let reason = match channel.sender.try_send(Arc::clone(&ev)) {
                Ok(()) => continue,
                Err(mpsc::error::TrySendError::Full(_)) => "full",
                Err(mpsc::error::TrySendError::Closed(_)) => "closed",
            };
            tracing::debug!(subscriber = channel.name, reason, seq = ev.seq, "subscriber dropped event");
            if !is_overflow_evt {
                self.bus
                    .publish(Event::subscriber_overflow(channel.name, reason));
            }
        }
    }

    /// Number of subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }
}

/// Extracts a printable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
