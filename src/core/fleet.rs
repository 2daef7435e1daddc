//! # Fleet map: task name → running worker handle.
//!
//! [`Fleet`] owns the only mapping from names to live workers. Entries are
//! inserted when a worker is spawned and removed only after that worker has
//! announced completion and its handle has been joined, so a name can never
//! be reused while its prior worker is still draining.
//!
//! Workers never touch the map. They report completion on a dedicated
//! channel; the listener spawned by [`Fleet::spawn_listener`] removes the
//! entry, joins the handle, and publishes [`EventKind::TaskTerminated`].

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::slot::TaskSlot;
use crate::descriptor::TaskDescriptor;
use crate::events::{Bus, Event, EventKind};

/// Handle to one running worker.
pub(crate) struct Handle {
    /// Mailbox shared with the worker.
    pub(crate) slot: Arc<TaskSlot>,
    /// Join handle for the worker's execution.
    pub(crate) join: JoinHandle<()>,
}

/// The name→worker map and its completion cleanup.
pub(crate) struct Fleet {
    tasks: RwLock<HashMap<String, Handle>>,
    bus: Bus,
}

impl Fleet {
    pub(crate) fn new(bus: Bus) -> Arc<Self> {
        Arc::new(Self {
            tasks: RwLock::new(HashMap::new()),
            bus,
        })
    }

    /// Spawns the completion listener.
    ///
    /// Runs until shutdown; late completions during shutdown are handled by
    /// the supervisor's drain, which takes every remaining handle itself.
    pub(crate) fn spawn_listener(
        self: Arc<Self>,
        mut done_rx: mpsc::UnboundedReceiver<String>,
        token: CancellationToken,
    ) {
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    msg = done_rx.recv() => match msg {
                        Some(name) => self.cleanup(&name).await,
                        None => break,
                    }
                }
            }
        });
    }

    /// Removes a completed worker's entry and reports it.
    async fn cleanup(&self, name: &str) {
        if let Some(handle) = self.take(name).await {
            let event = match handle.join.await {
                Ok(()) => Event::now(EventKind::TaskTerminated).with_task(name),
                Err(_join_err) => Event::now(EventKind::TaskTerminated)
                    .with_task(name)
                    .with_reason("worker panicked"),
            };
            self.bus.publish(event);
        }
    }

    pub(crate) async fn insert(&self, name: String, handle: Handle) {
        let mut tasks = self.tasks.write().await;
        tasks.insert(name, handle);
    }

    pub(crate) async fn contains(&self, name: &str) -> bool {
        self.tasks.read().await.contains_key(name)
    }

    /// Snapshot of every live task's currently applied parameters.
    pub(crate) async fn live_view(&self) -> HashMap<String, TaskDescriptor> {
        let tasks = self.tasks.read().await;
        tasks
            .iter()
            .map(|(name, handle)| (name.clone(), handle.slot.applied()))
            .collect()
    }

    /// Stages a descriptor on a running worker's slot.
    pub(crate) async fn stage(&self, name: &str, descriptor: TaskDescriptor) -> bool {
        let tasks = self.tasks.read().await;
        match tasks.get(name) {
            Some(handle) => {
                handle.slot.stage(descriptor);
                true
            }
            None => false,
        }
    }

    /// Requests termination at the worker's next tick.
    pub(crate) async fn mark_removed(&self, name: &str) -> bool {
        let tasks = self.tasks.read().await;
        match tasks.get(name) {
            Some(handle) => {
                handle.slot.request_termination();
                true
            }
            None => false,
        }
    }

    /// Returns the sorted list of live task names.
    pub(crate) async fn names(&self) -> Vec<String> {
        let tasks = self.tasks.read().await;
        let mut names: Vec<String> = tasks.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Removes every entry, handing the handles to the caller.
    pub(crate) async fn drain(&self) -> Vec<(String, Handle)> {
        let mut tasks = self.tasks.write().await;
        tasks.drain().collect()
    }

    async fn take(&self, name: &str) -> Option<Handle> {
        let mut tasks = self.tasks.write().await;
        tasks.remove(name)
    }
}
