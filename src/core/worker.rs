//! # Worker: the scheduling loop for exactly one task.
//!
//! A worker owns its tick source and suspends only while idle, waiting for
//! whichever fires first: the next tick or the global shutdown signal (the
//! race resolves in favor of shutdown). Every tick passes the same gate
//! sequence:
//!
//! ```text
//! tick ──► termination requested? ──► yes ──► exit loop
//!              │ no
//!              ▼
//!          staged reload? ──► apply whole descriptor
//!              │                (interval change re-arms the tick source;
//!              ▼                 endpoint/enabled take effect below)
//!          enabled? ──► fetch ──► publish record
//!              │ no        └──► on failure: report, wait for next tick
//!              ▼
//!          back to idle
//! ```
//!
//! ## Rules
//! - Termination is checked **before** reload application: a task marked for
//!   both removal and update in one round is removed, not updated.
//! - A disabled task keeps ticking, so re-enabling takes effect on the very
//!   next tick without a restart.
//! - Fetch and sink failures are reported and never terminate the task; the
//!   next attempt happens at the next natural tick.
//! - On exit the worker announces its name on the completion channel; it
//!   never touches the fleet map itself.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::core::slot::TaskSlot;
use crate::descriptor::TaskDescriptor;
use crate::events::{Bus, Event, EventKind};
use crate::fetch::Fetch;
use crate::sink::{Record, Sink};

/// Scheduling loop for one fleet member.
pub(crate) struct Worker {
    name: String,
    enabled: bool,
    interval: Duration,
    endpoint: String,
    slot: Arc<TaskSlot>,
    fetcher: Arc<dyn Fetch>,
    sink: Arc<dyn Sink>,
    bus: Bus,
    done: mpsc::UnboundedSender<String>,
}

impl Worker {
    /// Builds a worker from a validated descriptor.
    pub(crate) fn new(
        descriptor: TaskDescriptor,
        slot: Arc<TaskSlot>,
        fetcher: Arc<dyn Fetch>,
        sink: Arc<dyn Sink>,
        bus: Bus,
        done: mpsc::UnboundedSender<String>,
    ) -> Self {
        Self {
            name: descriptor.name,
            enabled: descriptor.enabled,
            interval: Duration::from_millis(descriptor.interval_ms),
            endpoint: descriptor.endpoint,
            slot,
            fetcher,
            sink,
            bus,
            done,
        }
    }

    /// Runs the loop until termination is requested or `shutdown` fires.
    pub(crate) async fn run(mut self, shutdown: CancellationToken) {
        let mut ticker = tick_source(self.interval);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }

            if self.slot.termination_requested() {
                break;
            }
            if let Some(next) = self.slot.take_pending() {
                self.apply(next, &mut ticker);
            }
            if self.enabled {
                self.poll_once().await;
            }
        }

        // Completion signal; the fleet listener removes this task's entry.
        let _ = self.done.send(self.name.clone());
    }

    /// Applies a staged descriptor as one atomic swap.
    ///
    /// The tick that just fired is not re-delivered: an interval change
    /// schedules the next tick one new interval from now.
    fn apply(&mut self, next: TaskDescriptor, ticker: &mut Interval) {
        if next.interval() != self.interval {
            self.interval = next.interval();
            *ticker = tick_source(self.interval);
        }
        self.endpoint = next.endpoint.clone();
        self.enabled = next.enabled;

        self.slot.record_applied(&next);
        self.bus
            .publish(Event::now(EventKind::ReloadApplied).with_task(self.name.as_str()));
    }

    /// One fetch+publish cycle. Failures are reported, never escalated.
    async fn poll_once(&self) {
        let document = match self.fetcher.fetch(&self.endpoint).await {
            Ok(document) => document,
            Err(e) => {
                self.bus.publish(
                    Event::now(EventKind::FetchFailed)
                        .with_task(self.name.as_str())
                        .with_reason(e.to_string()),
                );
                return;
            }
        };

        match self.sink.publish(Record::now(document)).await {
            Ok(()) => self
                .bus
                .publish(Event::now(EventKind::RecordPublished).with_task(self.name.as_str())),
            Err(e) => self.bus.publish(
                Event::now(EventKind::PublishFailed)
                    .with_task(self.name.as_str())
                    .with_reason(e.to_string()),
            ),
        }
    }
}

/// Periodic tick source: first tick one full interval from now.
///
/// Skipped ticks are dropped, not replayed, so a fetch that overruns its own
/// interval delays only this task's next tick.
fn tick_source(period: Duration) -> Interval {
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}
