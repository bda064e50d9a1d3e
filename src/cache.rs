//! Single-slot, time-expiring cache in front of the dictionary rebuild.
//!
//! The slot is either Fresh (a dictionary younger than the TTL) or Stale.
//! A stale `get()` starts exactly one rebuild; every caller arriving while it
//! runs awaits the same shared future and sees the same result. The rebuild
//! runs on its own task, so it completes and is published even if every
//! waiting caller goes away.

use crate::dictionary::{BuildReport, Dictionary, DictionaryBuilder};
use crate::error::DictionaryError;
use crate::metrics::{METRICS, RebuildOutcome};
use crate::source::GraphSource;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use serde::Serialize;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info};

/// Produces a new dictionary. Called at most once per stale window.
#[async_trait]
pub trait DictionaryProvider: Send + Sync {
    async fn rebuild(&self) -> Result<BuildReport, DictionaryError>;
}

/// Fetches the graph from a [`GraphSource`] and runs the [`DictionaryBuilder`]
pub struct RebuildPipeline {
    source: Arc<dyn GraphSource>,
    builder: DictionaryBuilder,
}

impl RebuildPipeline {
    pub fn new(source: Arc<dyn GraphSource>, builder: DictionaryBuilder) -> Self {
        Self { source, builder }
    }
}

#[async_trait]
impl DictionaryProvider for RebuildPipeline {
    async fn rebuild(&self) -> Result<BuildReport, DictionaryError> {
        info!(source = %self.source.describe(), "fetching vocabulary graph");
        let graph = self.source.fetch_graph().await?;
        self.builder.build(&graph)
    }
}

type SharedRebuild = Shared<BoxFuture<'static, Result<Arc<Dictionary>, DictionaryError>>>;

/// Point-in-time view of the cache, for health reporting
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub rebuilds: u64,
    pub failures: u64,
    pub fresh: bool,
    pub rebuilding: bool,
    pub entries: Option<usize>,
    pub warnings: Option<usize>,
    pub age_seconds: Option<u64>,
    pub last_refreshed: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl CacheStats {
    /// At least one successful rebuild, and no failure since the last one
    pub fn is_ready(&self) -> bool {
        self.last_refreshed.is_some() && self.last_error.is_none()
    }
}

struct Held {
    dictionary: Arc<Dictionary>,
    built_at: Instant,
}

#[derive(Default)]
struct Slot {
    current: Option<Held>,
    in_flight: Option<SharedRebuild>,
    /// Bumped each time a rebuild starts
    generation: u64,
    stats: CacheStats,
}

impl Slot {
    fn fresh(&self, ttl: Duration) -> Option<Arc<Dictionary>> {
        self.current
            .as_ref()
            .filter(|held| held.built_at.elapsed() < ttl)
            .map(|held| Arc::clone(&held.dictionary))
    }

    /// The rebuild task died without publishing (cancelled, or panicked
    /// while publishing). Clear it so the next caller starts a new one.
    fn abandon(
        &mut self,
        generation: u64,
        err: DictionaryError,
        elapsed: Duration,
    ) -> Result<Arc<Dictionary>, DictionaryError> {
        if self.generation != generation || self.in_flight.is_none() {
            return Err(err);
        }
        self.publish(Err(err), elapsed)
    }

    fn publish(
        &mut self,
        result: Result<BuildReport, DictionaryError>,
        elapsed: Duration,
    ) -> Result<Arc<Dictionary>, DictionaryError> {
        self.in_flight = None;
        match result {
            Ok(report) => {
                let dictionary = Arc::new(report.dictionary);
                METRICS.record_rebuild(RebuildOutcome::Success, elapsed);
                METRICS.set_entries(dictionary.len());
                info!(
                    entries = dictionary.len(),
                    warnings = report.warnings.len(),
                    duration_ms = elapsed.as_millis() as u64,
                    "dictionary rebuild succeeded"
                );
                self.stats.entries = Some(dictionary.len());
                self.stats.warnings = Some(report.warnings.len());
                self.stats.last_refreshed = Some(Utc::now());
                self.stats.last_error = None;
                self.current = Some(Held {
                    dictionary: Arc::clone(&dictionary),
                    built_at: Instant::now(),
                });
                Ok(dictionary)
            }
            Err(err) => {
                err.track();
                METRICS.record_rebuild(RebuildOutcome::Failure, elapsed);
                error!(
                    error_code = %err.code(),
                    error = %err,
                    duration_ms = elapsed.as_millis() as u64,
                    "dictionary rebuild failed"
                );
                self.stats.failures += 1;
                self.stats.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }
}

/// Time-expiring, single-flight cache of the built [`Dictionary`]
pub struct RebuildCache {
    provider: Arc<dyn DictionaryProvider>,
    ttl: Duration,
    slot: Arc<Mutex<Slot>>,
}

impl RebuildCache {
    pub fn new(provider: Arc<dyn DictionaryProvider>, ttl: Duration) -> Self {
        Self {
            provider,
            ttl,
            slot: Arc::new(Mutex::new(Slot::default())),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the cached dictionary, rebuilding it first if stale.
    ///
    /// The staleness check and the decision to start a rebuild happen under
    /// one lock, so concurrent callers never start a second rebuild.
    pub async fn get(&self) -> Result<Arc<Dictionary>, DictionaryError> {
        let rebuild = {
            let mut slot = self.slot.lock();
            if let Some(dictionary) = slot.fresh(self.ttl) {
                slot.stats.hits += 1;
                METRICS.record_cache_hit();
                debug!(entries = dictionary.len(), "dictionary cache hit");
                return Ok(dictionary);
            }

            slot.stats.misses += 1;
            METRICS.record_cache_miss();
            match slot.in_flight.clone() {
                Some(rebuild) => {
                    debug!("joining in-flight dictionary rebuild");
                    rebuild
                }
                None => self.start_rebuild(&mut slot),
            }
        };
        rebuild.await
    }

    /// Mark the held dictionary stale. An in-flight rebuild is left running
    /// and still publishes its result.
    pub fn invalidate(&self) {
        let mut slot = self.slot.lock();
        if slot.current.take().is_some() {
            info!("dictionary cache invalidated");
        }
    }

    pub fn stats(&self) -> CacheStats {
        let slot = self.slot.lock();
        let mut stats = slot.stats.clone();
        stats.rebuilding = slot.in_flight.is_some();
        stats.fresh = slot.fresh(self.ttl).is_some();
        stats.age_seconds = slot
            .current
            .as_ref()
            .map(|held| held.built_at.elapsed().as_secs());
        stats
    }

    fn start_rebuild(&self, slot: &mut Slot) -> SharedRebuild {
        slot.stats.rebuilds += 1;
        slot.generation += 1;
        let generation = slot.generation;
        info!(ttl_secs = self.ttl.as_secs(), "dictionary cache stale, rebuilding");

        let started = Instant::now();
        let provider = Arc::clone(&self.provider);
        let task_slot = Arc::clone(&self.slot);
        let task = tokio::spawn(async move {
            let result = AssertUnwindSafe(provider.rebuild())
                .catch_unwind()
                .await
                .unwrap_or_else(|_| {
                    Err(DictionaryError::RebuildAborted {
                        reason: "rebuild panicked".to_string(),
                    })
                });
            task_slot.lock().publish(result, started.elapsed())
        });

        let join_slot = Arc::clone(&self.slot);
        let rebuild = task
            .map(move |joined| match joined {
                Ok(result) => result,
                Err(e) => {
                    let err = DictionaryError::RebuildAborted {
                        reason: e.to_string(),
                    };
                    join_slot.lock().abandon(generation, err, started.elapsed())
                }
            })
            .boxed()
            .shared();
        slot.in_flight = Some(rebuild.clone());
        rebuild
    }
}
