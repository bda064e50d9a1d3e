#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use metadata_dictionary_server::vocab::{Alias, AliasResolver, GraphIndex, VocabularyCatalog};
use metadata_dictionary_server::{
    AppState, DictionaryBuilder, DictionaryError, GraphSource, RebuildCache, RebuildPipeline,
    ServerConfig, StaticGraphSource,
};
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tower::ServiceExt;

pub const CONTAINER: &str = "http://example.org/cv/container";
pub const V1: &str = "http://example.org/cv/v1";
pub const V2: &str = "http://example.org/cv/v2";
pub const V3: &str = "http://example.org/cv/v3";
pub const MISC: &str = "http://example.org/cv/misc";
pub const UNMAPPED: &str = "http://example.org/cv/unmapped";
pub const DATUM: &str = "http://example.org/cv/datum";
pub const NOTES: &str = "http://example.org/cv/notes";

const VOCABULARY: &str = include_str!("../../fixtures/vocabulary.jsonld");

/// The fixture vocabulary as published (expanded JSON-LD)
pub fn fixture_document() -> Value {
    serde_json::from_str(VOCABULARY).expect("fixture is valid JSON")
}

/// Tables matching the fixture vocabulary
pub fn fixture_catalog() -> VocabularyCatalog {
    VocabularyCatalog::new(CONTAINER)
        .with_cross_referenced(DATUM)
        .with_ignored(MISC)
        .with_coded_by_label(DATUM)
        .with_aliases(
            AliasResolver::new()
                .with_aliases(V1, [Alias::labelled("foo", "Foo Label")])
                .with_aliases(V2, [Alias::new("x"), Alias::labelled("y", "Y")])
                .with(V3, "z")
                .with_aliases(DATUM, [Alias::labelled("datum", "Pit marker datum")]),
        )
        .with_non_vocab(NOTES, "notes")
        .with_domain_only("authorship", "Person or people who described the taxon")
}

pub async fn fixture_graph() -> GraphIndex {
    StaticGraphSource::new(fixture_document())
        .fetch_graph()
        .await
        .expect("fixture compacts")
}

/// Graph source that counts fetches and can be told to fail
pub struct CountingSource {
    inner: StaticGraphSource,
    fetches: AtomicUsize,
    fail_first: usize,
    unavailable: AtomicBool,
    delay: Duration,
}

impl CountingSource {
    pub fn new(document: Value) -> Self {
        Self {
            inner: StaticGraphSource::new(document),
            fetches: AtomicUsize::new(0),
            fail_first: 0,
            unavailable: AtomicBool::new(false),
            delay: Duration::ZERO,
        }
    }

    pub fn failing_first(mut self, attempts: usize) -> Self {
        self.fail_first = attempts;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Make every later fetch fail (or succeed again)
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GraphSource for CountingSource {
    async fn fetch_graph(&self) -> Result<GraphIndex, DictionaryError> {
        let attempt = self.fetches.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if attempt < self.fail_first || self.unavailable.load(Ordering::SeqCst) {
            return Err(DictionaryError::fetch_failed(
                "http://example.org/download",
                "503 Service Unavailable",
            ));
        }
        self.inner.fetch_graph().await
    }

    fn describe(&self) -> String {
        "counting fixture source".to_string()
    }
}

pub fn fixture_cache(source: Arc<CountingSource>, ttl: Duration) -> Arc<RebuildCache> {
    let pipeline = RebuildPipeline::new(source, DictionaryBuilder::new(fixture_catalog()));
    Arc::new(RebuildCache::new(Arc::new(pipeline), ttl))
}

pub fn fixture_state(source: Arc<CountingSource>) -> AppState {
    let config = Arc::new(ServerConfig::default());
    let cache = fixture_cache(source, config.cache_ttl());
    AppState::with_cache(config, cache)
}

pub async fn get(router: &Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body.to_vec())
}

pub async fn get_json(router: &Router, uri: &str) -> (StatusCode, Value) {
    let (status, body) = get(router, uri).await;
    let json = serde_json::from_slice(&body).expect("response body is JSON");
    (status, json)
}
