//! # Global runtime configuration.
//!
//! [`FleetConfig`] centralizes the supervisor's own tunables. Per-task
//! parameters (interval, endpoint, enabled) come from descriptors and are
//! deliberately absent here: the only externally tunable knob of the
//! supervisor itself is how often it re-reads the declaration source.

use std::time::Duration;

/// Configuration for the fleet supervisor runtime.
///
/// ## Field semantics
/// - `reload_period`: cadence at which the declaration source is re-read and
///   reconciled against the running fleet (one eager round also happens at
///   startup).
/// - `grace`: maximum wait for workers to stop after shutdown is requested
///   before the fleet is reported as stuck.
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped by the bus).
#[derive(Clone, Debug)]
pub struct FleetConfig {
    /// How often the declaration source is re-read and reconciled.
    pub reload_period: Duration,

    /// Maximum time to wait for workers to drain on shutdown.
    ///
    /// When shutdown is requested:
    /// - every worker observes the broadcast cancellation and exits its loop
    /// - the supervisor waits up to `grace` for all of them to finish
    /// - on timeout, [`FleetError::GraceExceeded`](crate::FleetError::GraceExceeded)
    ///   reports the stuck task names
    pub grace: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Subscribers that lag behind more than `bus_capacity` events skip the
    /// oldest items.
    pub bus_capacity: usize,
}

impl Default for FleetConfig {
    /// Default configuration:
    ///
    /// - `reload_period = 60s`
    /// - `grace = 30s`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            reload_period: Duration::from_secs(60),
            grace: Duration::from_secs(30),
            bus_capacity: 1024,
        }
    }
}
