//! Core subscriber trait.

use async_trait::async_trait;

use crate::events::Event;

/// Contract for event subscribers.
///
/// Called from the supervisor's listener task. Implementations should avoid
/// blocking the async runtime; a slow subscriber delays delivery to the
/// subscribers registered after it, never the publishers.
#[async_trait]
pub trait Subscriber: Send + Sync + 'static {
    /// Handles a single event.
    async fn handle(&self, event: &Event);

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
