//! # Downstream record sink.
//!
//! Each successful fetch is wrapped with the current wall-clock timestamp
//! into a [`Record`] and handed to a [`Sink`]. Delivery is best-effort from
//! the runtime's perspective: a failed publish is reported and dropped, it
//! never retries and never changes task state.
//!
//! Sinks are invoked concurrently by many workers and must be safe for
//! concurrent use.

use std::time::SystemTime;

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use crate::error::SinkError;

/// A normalized record: one fetched document plus the time it was fetched.
#[derive(Clone, Debug)]
pub struct Record {
    /// Wall-clock timestamp taken when the fetch succeeded.
    pub at: SystemTime,
    /// The fetched document.
    pub fields: Value,
}

impl Record {
    /// Wraps a document with the current wall-clock timestamp.
    pub fn now(fields: Value) -> Self {
        Self {
            at: SystemTime::now(),
            fields,
        }
    }
}

/// Downstream delivery seam.
#[async_trait]
pub trait Sink: Send + Sync + 'static {
    /// Accepts one record, best effort.
    async fn publish(&self, record: Record) -> Result<(), SinkError>;
}

/// Sink that writes each record as a structured log line.
///
/// Useful for development and demos; attach a real pipeline behind the
/// [`Sink`] trait for durable delivery.
#[derive(Clone, Debug, Default)]
pub struct LogSink;

#[async_trait]
impl Sink for LogSink {
    async fn publish(&self, record: Record) -> Result<(), SinkError> {
        info!(at = ?record.at, fields = %record.fields, "record");
        Ok(())
    }
}
