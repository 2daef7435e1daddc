//! # Event subscribers.
//!
//! Subscribers observe the runtime event stream broadcast through the
//! [`Bus`](crate::events::Bus): logging, metrics, alerting, test capture.
//! The supervisor owns one listener task that receives each event and hands
//! it to every registered subscriber in turn.
//!
//! ## Implementing a custom subscriber
//! ```rust
//! use async_trait::async_trait;
//! use pollvisor::{Event, EventKind, Subscriber};
//!
//! struct FailureCounter;
//!
//! #[async_trait]
//! impl Subscriber for FailureCounter {
//!     async fn handle(&self, event: &Event) {
//!         if event.kind == EventKind::FetchFailed {
//!             // increment a counter...
//!         }
//!     }
//! }
//! ```

mod log;
mod subscriber;

pub use log::LogWriter;
pub use subscriber::Subscriber;
