pub mod cache;
pub mod config;
pub mod diagnostics;
pub mod dictionary;
pub mod error;
pub mod health;
pub mod logging;
pub mod metrics;
pub mod retry;
pub mod shutdown;
pub mod source;
pub mod state;
pub mod vocab;

pub use cache::{CacheStats, DictionaryProvider, RebuildCache, RebuildPipeline};
pub use config::{CliArgs, ServerConfig};
pub use dictionary::{BuildReport, Dictionary, DictionaryBuilder, DictionaryEntry};
pub use error::{ApiError, DictionaryError, ErrorCode};
pub use logging::{LoggingConfig, init_logging, shutdown_telemetry};
pub use shutdown::{ShutdownConfig, ShutdownCoordinator};
pub use source::{GraphSource, HttpGraphSource, StaticGraphSource};
pub use state::AppState;

use anyhow::Result;
use axum::{
    Json, Router,
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
};
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::Instrument;

const METRICS_CONTENT_TYPE: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";

pub async fn run_server(config: ServerConfig) -> Result<()> {
    let config = Arc::new(config);
    let state = AppState::new(config.clone())?;

    tracing::info!(
        port = config.http_bind_address.port(),
        bind = %config.http_bind_address,
        cache_expiry_secs = config.cache_expiry_secs,
        jsonld_url = %config.jsonld_url,
        cat_var_id = %config.cat_var_id,
        "starting metadata dictionary server",
    );

    if config.warm_cache {
        match state.cache.get().await {
            Ok(dictionary) => {
                tracing::info!(entries = dictionary.len(), "dictionary cache warmed")
            }
            Err(error) => tracing::warn!(
                %error,
                "failed to warm dictionary cache, the first request will retry"
            ),
        }
    }

    let listener = TcpListener::bind(config.http_bind_address).await?;
    serve(listener, state, ShutdownCoordinator::default()).await
}

/// Serve `state` on `listener` until the coordinator signals shutdown
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    coordinator: ShutdownCoordinator,
) -> Result<()> {
    let actual_addr = listener.local_addr()?;
    tracing::info!(bind = %actual_addr, "listening");

    let drain_timeout = coordinator.config().drain_timeout;
    let token = coordinator.token();
    let server = axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async move { coordinator.wait_for_shutdown().await })
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => result?,
        _ = async {
            token.cancelled().await;
            tokio::time::sleep(drain_timeout).await;
        } => {
            tracing::warn!(
                timeout_secs = drain_timeout.as_secs(),
                "in-flight requests did not drain in time, stopping"
            );
        }
    }

    tracing::info!("server stopped");
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(dictionary_handler))
        .route("/health", get(health::liveness_handler))
        .route("/ready", get(health::readiness_handler))
        .route("/health/components", get(health::components_handler))
        .route("/metrics", get(metrics_handler))
        .layer(middleware::from_fn(trace_request))
        .with_state(state)
}

async fn dictionary_handler(
    State(cache): State<Arc<RebuildCache>>,
) -> Result<Json<Arc<Dictionary>>, ApiError> {
    Ok(Json(cache.get().await?))
}

/// Prometheus metrics endpoint handler
async fn metrics_handler() -> Response {
    match metrics::METRICS.encode() {
        Ok(text) => ([(header::CONTENT_TYPE, METRICS_CONTENT_TYPE)], text).into_response(),
        Err(error) => {
            tracing::error!(%error, "failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn trace_request(request: Request, next: Next) -> Response {
    let span = logging::request_span(request.method().as_str(), request.uri().path());
    async move {
        let started = Instant::now();
        let response = next.run(request).await;
        let status = response.status().as_u16();
        tracing::Span::current().record("http.status", status);
        tracing::info!(
            status,
            duration_ms = started.elapsed().as_millis() as u64,
            "request completed"
        );
        response
    }
    .instrument(span)
    .await
}
