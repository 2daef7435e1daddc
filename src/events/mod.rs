//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to runtime events emitted by the supervisor, the fleet
//! map, and individual workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] — event classification and payload metadata
//! - [`Bus`] — thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `FleetSupervisor` (rounds, shutdown), `Fleet`
//!   (spawn/terminate), `Worker` (reload application, fetch/publish
//!   outcomes).
//! - **Consumer**: the supervisor's listener task, which fans events out to
//!   registered [`Subscriber`](crate::Subscriber)s.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
