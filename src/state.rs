use crate::cache::{RebuildCache, RebuildPipeline};
use crate::config::ServerConfig;
use crate::dictionary::DictionaryBuilder;
use crate::health::HealthChecker;
use crate::source::{GraphSource, HttpGraphSource};
use crate::vocab::VocabularyCatalog;
use anyhow::Result;
use axum::extract::FromRef;
use std::sync::Arc;

/// Shared handles passed to every request handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub cache: Arc<RebuildCache>,
    pub health: Arc<HealthChecker>,
}

impl AppState {
    /// Wire the HTTP source, builder and cache from configuration
    pub fn new(config: Arc<ServerConfig>) -> Result<Self> {
        let source: Arc<dyn GraphSource> = Arc::new(HttpGraphSource::new(
            config.jsonld_url.clone(),
            config.fetch_timeout(),
            config.retry_config(),
        )?);
        let catalog = VocabularyCatalog::ausplots().with_container(config.cat_var_id.clone());
        let pipeline = RebuildPipeline::new(source, DictionaryBuilder::new(catalog));
        let cache = Arc::new(RebuildCache::new(Arc::new(pipeline), config.cache_ttl()));
        Ok(Self::with_cache(config, cache))
    }

    /// Use an existing cache, e.g. one backed by an in-memory source
    pub fn with_cache(config: Arc<ServerConfig>, cache: Arc<RebuildCache>) -> Self {
        let health = Arc::new(HealthChecker::new(config.clone(), cache.clone()));
        Self {
            config,
            cache,
            health,
        }
    }
}

impl FromRef<AppState> for Arc<HealthChecker> {
    fn from_ref(state: &AppState) -> Self {
        state.health.clone()
    }
}

impl FromRef<AppState> for Arc<RebuildCache> {
    fn from_ref(state: &AppState) -> Self {
        state.cache.clone()
    }
}
