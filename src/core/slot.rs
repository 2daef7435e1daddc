//! # Per-task mailbox.
//!
//! [`TaskSlot`] is the only state shared between the supervisor and one
//! worker. Each field is a single-writer/single-reader handoff:
//!
//! - `pending`: supervisor stages a whole descriptor, worker takes it at its
//!   next tick. Staging replaces any previously staged descriptor, so the
//!   worker always applies the newest declaration, never a stale one.
//! - `terminate`: supervisor sets it once, worker reads it at each tick
//!   boundary. Never cleared.
//! - `applied`: worker records what it is actually running, supervisor reads
//!   it when reconciling the next declaration round.
//!
//! Descriptors move through the slot whole; a worker can never observe a
//! half-written reload.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, RwLock};

use crate::descriptor::TaskDescriptor;

/// Shared mailbox between the supervisor and one worker.
#[derive(Debug)]
pub(crate) struct TaskSlot {
    terminate: AtomicBool,
    pending: Mutex<Option<TaskDescriptor>>,
    applied: RwLock<TaskDescriptor>,
}

impl TaskSlot {
    /// Creates a slot for a worker spawned from `descriptor`.
    pub(crate) fn new(descriptor: TaskDescriptor) -> Self {
        Self {
            terminate: AtomicBool::new(false),
            pending: Mutex::new(None),
            applied: RwLock::new(descriptor),
        }
    }

    /// Marks the task for termination at its next tick. One-way.
    pub(crate) fn request_termination(&self) {
        self.terminate.store(true, Ordering::Release);
    }

    /// True once termination has been requested.
    pub(crate) fn termination_requested(&self) -> bool {
        self.terminate.load(Ordering::Acquire)
    }

    /// Stages a descriptor for the worker to apply at its next tick.
    pub(crate) fn stage(&self, descriptor: TaskDescriptor) {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        *pending = Some(descriptor);
    }

    /// Takes the staged descriptor, leaving the slot empty.
    pub(crate) fn take_pending(&self) -> Option<TaskDescriptor> {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        pending.take()
    }

    /// Records the parameters the worker is now running with.
    pub(crate) fn record_applied(&self, descriptor: &TaskDescriptor) {
        let mut applied = self.applied.write().unwrap_or_else(|e| e.into_inner());
        *applied = descriptor.clone();
    }

    /// Snapshot of the worker's currently applied parameters.
    pub(crate) fn applied(&self) -> TaskDescriptor {
        self.applied
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}
