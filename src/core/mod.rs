//! Runtime core: reconciliation and lifecycle.
//!
//! The only public API from this module is [`FleetSupervisor`], which owns
//! the fleet map, drives reconciliation rounds, and performs graceful
//! shutdown.
//!
//! Internal modules:
//! - [`reconcile`]: pure classification of declared vs. live task names;
//! - [`slot`]: per-task mailbox for staged reloads and termination requests;
//! - [`worker`]: the per-task scheduling loop and state machine;
//! - [`fleet`]: the name→handle map and worker-completion cleanup;
//! - [`supervisor`]: reconciliation rounds, reload cadence, shutdown drain;
//! - [`shutdown`]: OS signal handling.

mod fleet;
mod reconcile;
mod shutdown;
mod slot;
mod supervisor;
mod worker;

pub use supervisor::FleetSupervisor;
