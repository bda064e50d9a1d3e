//! Where the vocabulary graph comes from.
//!
//! [`GraphSource`] is the boundary the rest of the crate depends on. The
//! production implementation downloads the JSON-LD document over HTTP and
//! compacts it; [`StaticGraphSource`] serves a document held in memory.

use crate::error::DictionaryError;
use crate::retry::{ExponentialBackoff, RetryConfig, retry_async_with_policy};
use crate::vocab::{CompactionContext, GraphIndex, compact_document};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};

pub const DEFAULT_JSONLD_URL: &str =
    "https://linkeddata.tern.org.au/viewer/ausplots/download?format=json-ld";

const JSONLD_ACCEPT: &str = "application/ld+json, application/json;q=0.9";

/// Produces a freshly compacted graph on every call
#[async_trait]
pub trait GraphSource: Send + Sync {
    async fn fetch_graph(&self) -> Result<GraphIndex, DictionaryError>;

    /// Human-readable origin, for logs
    fn describe(&self) -> String;
}

/// Fetches the JSON-LD download over HTTP
pub struct HttpGraphSource {
    client: reqwest::Client,
    url: String,
    context: CompactionContext,
    retry: ExponentialBackoff,
}

impl HttpGraphSource {
    pub fn new(url: impl Into<String>, timeout: Duration, retry: RetryConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            url: url.into(),
            context: CompactionContext::default(),
            retry: ExponentialBackoff::new(retry),
        })
    }

    async fn fetch_document(&self) -> Result<Value, DictionaryError> {
        debug!(url = %self.url, "requesting JSON-LD document");
        let response = self
            .client
            .get(&self.url)
            .header(ACCEPT, JSONLD_ACCEPT)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| DictionaryError::fetch_failed(&self.url, e))?;
        let body = response
            .bytes()
            .await
            .map_err(|e| DictionaryError::fetch_failed(&self.url, e))?;
        debug!(url = %self.url, bytes = body.len(), "JSON-LD document received");
        serde_json::from_slice(&body)
            .map_err(|e| DictionaryError::malformed(format!("response is not JSON: {e}")))
    }
}

#[async_trait]
impl GraphSource for HttpGraphSource {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn fetch_graph(&self) -> Result<GraphIndex, DictionaryError> {
        let document =
            retry_async_with_policy(move || self.fetch_document(), &self.retry, "fetch_jsonld")
                .await?;
        let entities = compact_document(&document, &self.context)?;
        Ok(GraphIndex::from_entities(entities))
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Serves one JSON-LD document from memory
#[derive(Debug, Clone)]
pub struct StaticGraphSource {
    document: Value,
    context: CompactionContext,
}

impl StaticGraphSource {
    pub fn new(document: Value) -> Self {
        Self {
            document,
            context: CompactionContext::default(),
        }
    }
}

#[async_trait]
impl GraphSource for StaticGraphSource {
    async fn fetch_graph(&self) -> Result<GraphIndex, DictionaryError> {
        let entities = compact_document(&self.document, &self.context)?;
        Ok(GraphIndex::from_entities(entities))
    }

    fn describe(&self) -> String {
        "in-memory document".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[tokio::test]
    async fn static_source_compacts_its_document() {
        let source = StaticGraphSource::new(json!({
            "@graph": [{"@id": "a", "label": "A"}, {"@id": "b"}]
        }));
        let graph = source.fetch_graph().await.unwrap();
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.resolve("a").unwrap().label.as_deref(), Some("A"));
    }

    #[tokio::test]
    async fn unreachable_source_is_fetch_failure() {
        // Port 9 (discard) on localhost is closed in test environments.
        let source = HttpGraphSource::new(
            "http://127.0.0.1:9/jsonld",
            Duration::from_millis(500),
            RetryConfig::none(),
        )
        .unwrap();
        assert_matches!(
            source.fetch_graph().await,
            Err(DictionaryError::FetchFailed { url, .. }) if url == "http://127.0.0.1:9/jsonld"
        );
    }
}
