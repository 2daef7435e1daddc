//! Error types used by the pollvisor runtime and its collaborators.
//!
//! The taxonomy follows containment boundaries, not call sites:
//!
//! - [`FleetError`] — fleet-level failures that surface to the caller
//!   (invalid startup declaration, shutdown grace exceeded).
//! - [`SourceError`] — a declaration set could not be loaded or parsed.
//!   Fatal at startup; at reload the round is abandoned and retried on the
//!   next cadence.
//! - [`DescriptorError`] — one descriptor is malformed; only that task is
//!   affected.
//! - [`FetchError`] — one poll cycle failed; the task keeps ticking.
//! - [`SinkError`] — one record was not delivered; neither task nor fleet
//!   state changes.

use std::time::Duration;

use thiserror::Error;

/// Errors raised by the fleet supervisor itself.
///
/// Everything below this level is contained at the task or reload-round
/// boundary and never terminates the process.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum FleetError {
    /// The declaration set could not be obtained.
    ///
    /// Surfaced from [`run`](crate::FleetSupervisor::run) only for the
    /// initial load; reload-time source failures are contained.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// `start` was called on a supervisor that is already running.
    #[error("supervisor already started")]
    AlreadyStarted,

    /// Shutdown grace period was exceeded; some workers were still draining.
    #[error("shutdown grace {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Names of tasks that did not stop in time.
        stuck: Vec<String>,
    },
}

impl FleetError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use std::time::Duration;
    /// use pollvisor::FleetError;
    ///
    /// let err = FleetError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "fleet_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            FleetError::Source(_) => "fleet_source_error",
            FleetError::AlreadyStarted => "fleet_already_started",
            FleetError::GraceExceeded { .. } => "fleet_grace_exceeded",
        }
    }
}

/// Errors raised while loading a declaration set from a config source.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SourceError {
    /// The declaration location could not be read.
    #[error("failed to read declarations: {0}")]
    Io(#[from] std::io::Error),

    /// The declaration document is not valid JSON of the expected shape.
    #[error("failed to parse declarations: {0}")]
    Parse(#[from] serde_json::Error),

    /// Two descriptors in one declaration set share a name.
    ///
    /// Duplicate names are a configuration error, rejected before the set
    /// ever reaches reconciliation.
    #[error("duplicate task name: {name}")]
    DuplicateName {
        /// The offending name.
        name: String,
    },
}

/// A single descriptor cannot drive a worker.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum DescriptorError {
    /// The task name is empty.
    #[error("task name is empty")]
    EmptyName,

    /// The endpoint URL is empty.
    #[error("task {name}: endpoint is empty")]
    EmptyEndpoint {
        /// Name of the rejected task.
        name: String,
    },

    /// The poll interval is zero.
    #[error("task {name}: interval must be positive")]
    ZeroInterval {
        /// Name of the rejected task.
        name: String,
    },
}

/// One request/response cycle failed.
///
/// Transport failures and malformed documents are distinct variants but are
/// treated identically by the worker: log and continue, next attempt on the
/// next natural tick.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum FetchError {
    /// The request did not complete, or the server answered non-2xx.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body is not a JSON document.
    #[error("malformed document: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// One record was not delivered downstream.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SinkError {
    /// Best-effort delivery failed; the record is dropped.
    #[error("delivery failed: {reason}")]
    Delivery {
        /// Why delivery failed.
        reason: String,
    },
}
