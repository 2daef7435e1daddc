//! # Runtime events emitted by the supervisor and workers.
//!
//! [`EventKind`] classifies what happened; [`Event`] carries the metadata
//! (timestamp, task name, reason). Each event has a globally unique sequence
//! number that increases monotonically, so delivery order can always be
//! reconstructed.
//!
//! ## Example
//! ```rust
//! use pollvisor::{Event, EventKind};
//!
//! let ev = Event::now(EventKind::FetchFailed)
//!     .with_task("router")
//!     .with_reason("connection refused");
//!
//! assert_eq!(ev.kind, EventKind::FetchFailed);
//! assert_eq!(ev.task.as_deref(), Some("router"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Fleet membership ===
    /// A worker was spawned for a newly declared task.
    ///
    /// Sets: `task`.
    TaskSpawned,

    /// A descriptor failed validation; no worker was started or updated.
    ///
    /// Sets: `task`, `reason`.
    TaskRejected,

    /// A worker finished and its fleet entry was removed.
    ///
    /// Sets: `task`.
    TaskTerminated,

    // === Reconfiguration ===
    /// A changed descriptor was staged for a running worker.
    ///
    /// Sets: `task`.
    ReloadStaged,

    /// A worker applied a staged descriptor at a tick boundary.
    ///
    /// Sets: `task`.
    ReloadApplied,

    /// A reload round was abandoned; the fleet keeps its last-known-good
    /// state.
    ///
    /// Sets: `reason`.
    ReloadFailed,

    // === Poll cycle ===
    /// A fetched document was handed to the sink.
    ///
    /// Sets: `task`.
    RecordPublished,

    /// One poll cycle failed; the task continues ticking.
    ///
    /// Sets: `task`, `reason`.
    FetchFailed,

    /// The sink refused a record; the record is dropped.
    ///
    /// Sets: `task`, `reason`.
    PublishFailed,

    // === Shutdown ===
    /// Shutdown was requested (signal or explicit call).
    ShutdownRequested,

    /// All workers drained within the configured grace period.
    AllStoppedWithin,

    /// Grace period exceeded; some workers were still draining.
    GraceExceeded,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - `task`/`reason`: set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Name of the task, if applicable.
    pub task: Option<Arc<str>>,
    /// Human-readable reason (errors, rejection details).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates an event of the given kind with the current timestamp and the
    /// next sequence number.
    pub fn now(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task: None,
            reason: None,
        }
    }

    /// Attaches a task name.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}
