//! Graceful shutdown coordination
//!
//! SIGINT or SIGTERM (or an explicit [`ShutdownCoordinator::trigger`]) cancels
//! a shared [`CancellationToken`]. The HTTP server stops accepting connections
//! and drains in-flight requests; anything else holding a token clone exits
//! on the same signal.

use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Configuration for graceful shutdown behavior
#[derive(Debug, Clone)]
pub struct ShutdownConfig {
    /// Time allowed for in-flight requests once the listener has stopped
    pub drain_timeout: Duration,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            drain_timeout: Duration::from_secs(30),
        }
    }
}

impl ShutdownConfig {
    pub fn with_drain_timeout(mut self, timeout_secs: u64) -> Self {
        self.drain_timeout = Duration::from_secs(timeout_secs);
        self
    }
}

/// Coordinates graceful shutdown across server components
#[derive(Debug, Clone, Default)]
pub struct ShutdownCoordinator {
    config: ShutdownConfig,
    shutdown_token: CancellationToken,
}

impl ShutdownCoordinator {
    pub fn new(config: ShutdownConfig) -> Self {
        Self {
            config,
            shutdown_token: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &ShutdownConfig {
        &self.config
    }

    /// Get a shutdown token that can be used to coordinate async task cancellation
    pub fn token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Check if shutdown has been initiated
    pub fn is_shutdown_initiated(&self) -> bool {
        self.shutdown_token.is_cancelled()
    }

    /// Initiate shutdown without waiting for a signal
    pub fn trigger(&self) {
        if !self.shutdown_token.is_cancelled() {
            info!("shutdown requested");
            self.shutdown_token.cancel();
        }
    }

    /// Resolve once shutdown starts, by signal or by [`trigger`](Self::trigger)
    pub async fn wait_for_shutdown(&self) {
        tokio::select! {
            _ = wait_for_signal() => self.shutdown_token.cancel(),
            _ = self.shutdown_token.cancelled() => {}
        }
    }
}

/// Wait for a shutdown signal (SIGTERM or SIGINT)
pub async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("received SIGINT (Ctrl+C), initiating graceful shutdown");
        },
        _ = terminate => {
            info!("received SIGTERM, initiating graceful shutdown");
        },
    }
}
