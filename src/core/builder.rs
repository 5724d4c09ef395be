//! # Scheduler builder.
//!
//! Wires the event bus, the optional subscriber fan-out and the runtime handle that
//! admitted work is spawned on.

use std::fmt::Debug;
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::broadcast::{Receiver, error::RecvError};
use tokio_util::sync::CancellationToken;

use super::{config::SchedulerConfig, scheduler::Scheduler};
use crate::{
    events::{Bus, Event},
    subscribers::{Subscribe, SubscriberSet},
};

/// Builder for constructing a [`Scheduler`] with optional subscribers and runtime.
pub struct SchedulerBuilder<K> {
    cfg: SchedulerConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
    runtime: Option<Handle>,
    _key: PhantomData<fn() -> K>,
}

impl<K> SchedulerBuilder<K>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
{
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: SchedulerConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            runtime: None,
            _key: PhantomData,
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive scheduler events through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Spawns work (and subscriber workers) on `runtime` instead of the current runtime.
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Builds the scheduler.
    ///
    /// # Panics
    /// Panics if no runtime was supplied and this is called outside a tokio runtime.
    pub fn build(self) -> Scheduler<K> {
        let runtime = self.runtime.unwrap_or_else(Handle::current);
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let listener_token = CancellationToken::new();

        if !self.subscribers.is_empty() {
            let subs = SubscriberSet::new(self.subscribers, bus.clone(), &runtime);
            tracing::debug!(subscribers = subs.len(), "starting subscriber listener");
            spawn_listener(&runtime, bus.subscribe(), subs, listener_token.clone());
        }

        Scheduler::new_internal(self.cfg, bus, runtime, listener_token)
    }
}

/// Forwards bus events to the subscriber set until the scheduler is dropped.
fn spawn_listener(
    runtime: &Handle,
    mut rx: Receiver<Event>,
    subs: SubscriberSet,
    token: CancellationToken,
) {
    runtime.spawn(async move {
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                msg = rx.recv() => match msg {
                    Ok(ev) => subs.emit(&ev),
                    Err(RecvError::Closed) => break,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "subscriber listener lagged behind the event bus");
                        continue;
                    }
                }
            }
        }
    });
}
