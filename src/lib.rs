//! # pollvisor
//!
//! **Pollvisor** supervises a fleet of independently scheduled periodic
//! polling tasks. Each task fetches a JSON document from its own endpoint on
//! its own interval and forwards every successful fetch, wrapped with a
//! wall-clock timestamp, to a downstream sink. The fleet's membership and
//! per-task parameters are declared externally and may change at any time;
//! the supervisor reconciles the running fleet with the latest declaration
//! without disturbing tasks that did not change.
//!
//! ## Architecture
//! ```text
//!     ┌────────────────┐     ┌────────────────┐     ┌────────────────┐
//!     │ TaskDescriptor │     │ TaskDescriptor │     │ TaskDescriptor │
//!     └───────┬────────┘     └───────┬────────┘     └───────┬────────┘
//!             └──────────── ConfigSource::load ─────────────┘
//!                                  │  (every reload_period)
//!                                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  FleetSupervisor                                                  │
//! │  - reconcile(live, declared) → added/updated/removed/unchanged    │
//! │  - Fleet (name → worker handle; removal confirmed via completion) │
//! │  - Bus (broadcast events) → Subscribers (LogWriter, custom)       │
//! │  - CancellationToken (one broadcast shutdown for all workers)     │
//! └───────┬───────────────────────┬──────────────────────┬────────────┘
//!         ▼                       ▼                      ▼
//!     ┌──────────┐           ┌──────────┐           ┌──────────┐
//!     │  Worker  │           │  Worker  │           │  Worker  │
//!     │ (ticker) │           │ (ticker) │           │ (ticker) │
//!     └────┬─────┘           └────┬─────┘           └────┬─────┘
//!          │ tick: terminated? → reload? → enabled? → fetch+publish
//!          ▼                      ▼                      ▼
//!       Fetch (HTTP GET) ──► Record { at, fields } ──► Sink
//! ```
//!
//! ## Worker lifecycle
//! ```text
//! spawn ──► idle ──(tick)──► termination requested? ──► terminated
//!             ▲                     │ no                 (entry removed
//!             │                     ▼                     after join)
//!             │              apply staged reload
//!             │              (whole descriptor at once)
//!             │                     │
//!             │                     ▼
//!             └──── enabled? ──► fetch ──► publish
//!                     │ no
//!                     └──── back to idle
//! ```
//!
//! Failures stay contained: a bad descriptor skips one task, a failed fetch
//! or publish waits for the next tick, a failed reload round leaves the
//! fleet on its last-known-good state. Only an invalid initial declaration
//! set is fatal.
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use pollvisor::{
//!     FleetConfig, FleetSupervisor, HttpFetcher, JsonFileSource, LogSink, LogWriter, Subscriber,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = FleetConfig::default();
//!
//!     let subscribers: Vec<Arc<dyn Subscriber>> = vec![Arc::new(LogWriter)];
//!     let supervisor = FleetSupervisor::new(
//!         cfg,
//!         Arc::new(JsonFileSource::new("targets.json")),
//!         Arc::new(HttpFetcher::new()),
//!         Arc::new(LogSink),
//!         subscribers,
//!     );
//!
//!     // Runs until SIGINT/SIGTERM, reconciling the declaration file on the
//!     // configured cadence.
//!     supervisor.run().await?;
//!     Ok(())
//! }
//! ```

mod config;
mod core;
mod descriptor;
mod error;
mod events;
mod fetch;
mod sink;
mod source;
mod subscribers;

// ---- Public re-exports ----

pub use config::FleetConfig;
pub use core::FleetSupervisor;
pub use descriptor::TaskDescriptor;
pub use error::{DescriptorError, FetchError, FleetError, SinkError, SourceError};
pub use events::{Bus, Event, EventKind};
pub use fetch::{Fetch, HttpFetcher};
pub use sink::{LogSink, Record, Sink};
pub use source::{ConfigSource, JsonFileSource};
pub use subscribers::{LogWriter, Subscriber};
