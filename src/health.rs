//! Liveness, readiness and component health endpoints.
//!
//! Liveness only says the process is serving. Readiness and the component
//! view are derived from [`CacheStats`]: the server is ready once a
//! dictionary has been built and no rebuild has failed since.

use crate::cache::{CacheStats, RebuildCache};
use crate::config::ServerConfig;
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Ordered from best to worst, so the overall status is the maximum
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    /// Serving, but without a dictionary yet
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    pub fn status_code(self) -> StatusCode {
        match self {
            HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
            HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        }
    }

    /// The worse of the two
    pub fn combine(self, other: Self) -> Self {
        self.max(other)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ComponentHealth {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub details: serde_json::Value,
}

impl ComponentHealth {
    pub fn new(status: HealthStatus, details: serde_json::Value) -> Self {
        Self {
            status,
            error: None,
            details,
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub timestamp: DateTime<Utc>,
    pub version: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComponentHealthResponse {
    pub status: HealthStatus,
    pub timestamp: DateTime<Utc>,
    pub components: BTreeMap<&'static str, ComponentHealth>,
}

impl IntoResponse for HealthResponse {
    fn into_response(self) -> Response {
        (self.status.status_code(), Json(self)).into_response()
    }
}

impl IntoResponse for ReadinessResponse {
    fn into_response(self) -> Response {
        let code = if self.ready {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        };
        (code, Json(self)).into_response()
    }
}

impl IntoResponse for ComponentHealthResponse {
    fn into_response(self) -> Response {
        (self.status.status_code(), Json(self)).into_response()
    }
}

pub struct HealthChecker {
    config: Arc<ServerConfig>,
    cache: Arc<RebuildCache>,
}

impl HealthChecker {
    pub fn new(config: Arc<ServerConfig>, cache: Arc<RebuildCache>) -> Self {
        Self { config, cache }
    }

    pub fn liveness(&self) -> HealthResponse {
        HealthResponse {
            status: HealthStatus::Healthy,
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION"),
        }
    }

    pub fn readiness(&self) -> ReadinessResponse {
        let stats = self.cache.stats();
        let reason = match (&stats.last_error, stats.last_refreshed) {
            (Some(error), _) => Some(format!("last dictionary rebuild failed: {error}")),
            (None, None) => Some("dictionary has not been built yet".to_string()),
            (None, Some(_)) => None,
        };
        ReadinessResponse {
            ready: reason.is_none(),
            timestamp: Utc::now(),
            reason,
        }
    }

    pub fn components(&self) -> ComponentHealthResponse {
        let components = BTreeMap::from([
            (
                "dictionary_cache",
                check_cache(&self.cache.stats(), self.cache.ttl().as_secs()),
            ),
            ("source", self.check_source()),
        ]);
        let status = components
            .values()
            .map(|component| component.status)
            .fold(HealthStatus::Healthy, HealthStatus::combine);

        ComponentHealthResponse {
            status,
            timestamp: Utc::now(),
            components,
        }
    }

    /// Static view of where rebuilds fetch from; failures surface on the cache
    fn check_source(&self) -> ComponentHealth {
        ComponentHealth::new(
            HealthStatus::Healthy,
            json!({
                "url": self.config.jsonld_url,
                "container_id": self.config.cat_var_id,
                "fetch_timeout_ms": self.config.fetch_timeout_ms,
                "fetch_attempts": self.config.fetch_attempts,
            }),
        )
    }
}

fn check_cache(stats: &CacheStats, ttl_secs: u64) -> ComponentHealth {
    let lookups = stats.hits + stats.misses;
    let hit_rate_pct = if lookups == 0 {
        0.0
    } else {
        (stats.hits as f64 * 100.0 / lookups as f64).round()
    };
    let details = json!({
        "fresh": stats.fresh,
        "rebuilding": stats.rebuilding,
        "entries": stats.entries,
        "warnings": stats.warnings,
        "age_seconds": stats.age_seconds,
        "ttl_seconds": ttl_secs,
        "last_refreshed": stats.last_refreshed,
        "hits": stats.hits,
        "misses": stats.misses,
        "hit_rate_pct": hit_rate_pct,
        "rebuilds": stats.rebuilds,
        "failures": stats.failures,
    });

    match (&stats.last_error, stats.last_refreshed) {
        (Some(error), _) => ComponentHealth::new(HealthStatus::Unhealthy, details)
            .with_error(format!("last rebuild failed: {error}")),
        (None, None) => ComponentHealth::new(HealthStatus::Degraded, details)
            .with_error("dictionary has not been built yet"),
        (None, Some(_)) => ComponentHealth::new(HealthStatus::Healthy, details),
    }
}

pub async fn liveness_handler(State(checker): State<Arc<HealthChecker>>) -> HealthResponse {
    checker.liveness()
}

pub async fn readiness_handler(State(checker): State<Arc<HealthChecker>>) -> ReadinessResponse {
    checker.readiness()
}

pub async fn components_handler(
    State(checker): State<Arc<HealthChecker>>,
) -> ComponentHealthResponse {
    checker.components()
}
