//! # Structured logging subscriber.
//!
//! [`LogWriter`] maps each runtime event to one `tracing` line, giving every
//! failure category its own structured record:
//!
//! ```text
//! INFO  task spawned            task=router
//! INFO  reload applied          task=router
//! WARN  fetch failed            task=router reason="connection refused"
//! WARN  descriptor rejected     task=router reason="interval must be positive"
//! ERROR reload round abandoned  reason="failed to read declarations: ..."
//! ```

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscriber;

/// Logging subscriber backed by `tracing`.
#[derive(Clone, Debug, Default)]
pub struct LogWriter;

#[async_trait]
impl Subscriber for LogWriter {
    async fn handle(&self, e: &Event) {
        let task = e.task.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("-");

        match e.kind {
            EventKind::TaskSpawned => info!(task, "task spawned"),
            EventKind::TaskTerminated => info!(task, "task terminated"),
            EventKind::TaskRejected => warn!(task, reason, "descriptor rejected"),
            EventKind::ReloadStaged => info!(task, "reload staged"),
            EventKind::ReloadApplied => info!(task, "reload applied"),
            EventKind::ReloadFailed => error!(reason, "reload round abandoned"),
            EventKind::RecordPublished => info!(task, "record published"),
            EventKind::FetchFailed => warn!(task, reason, "fetch failed"),
            EventKind::PublishFailed => warn!(task, reason, "publish failed"),
            EventKind::ShutdownRequested => info!("shutdown requested"),
            EventKind::AllStoppedWithin => info!("all tasks stopped within grace"),
            EventKind::GraceExceeded => error!("shutdown grace exceeded"),
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
