//! # Outbound fetch seam.
//!
//! [`Fetch`] performs one request/response cycle against a task's endpoint
//! and returns the parsed document. Implementations are invoked concurrently
//! by many workers and must not share mutable per-call state.
//!
//! [`HttpFetcher`] is the built-in implementation: HTTP GET, status check,
//! JSON body parse.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::FetchError;

/// One request/response cycle against an endpoint.
#[async_trait]
pub trait Fetch: Send + Sync + 'static {
    /// Fetches `endpoint` and returns the parsed document.
    async fn fetch(&self, endpoint: &str) -> Result<Value, FetchError>;
}

/// HTTP GET fetcher returning the response body as a JSON document.
///
/// The inner [`reqwest::Client`] pools connections and is safe to share
/// across all workers of a fleet.
#[derive(Clone, Debug, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Creates a fetcher with a fresh client.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, endpoint: &str) -> Result<Value, FetchError> {
        let response = self
            .client
            .get(endpoint)
            .send()
            .await?
            .error_for_status()?;

        // Parse from the raw body rather than `.json()` so a non-JSON body
        // surfaces as Malformed, not as a transport failure.
        let body = response.text().await?;
        let document = serde_json::from_str(&body)?;
        Ok(document)
    }
}
