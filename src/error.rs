//! Error handling for the metadata dictionary server
//!
//! This module provides:
//! - The fatal, rebuild-aborting error taxonomy (`DictionaryError`)
//! - Error codes and categories for metrics
//! - The HTTP mapping of rebuild failures (`ApiError`)
//!
//! Data-quality problems (missing value codes, unmapped variables) are not
//! errors; see [`crate::dictionary::DataQualityWarning`].

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

// =============================================================================
// ERROR CODES
// =============================================================================

/// Stable identifiers for each fatal error kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The categorical-variable container is absent from the graph
    ContainerNotFound,
    /// A referenced identifier is absent from the graph
    EntityNotFound,
    /// The source could not be reached or answered with an error status
    FetchFailed,
    /// The source answered with something that is not a usable graph
    MalformedGraph,
    /// The rebuild task ended without producing a result
    RebuildAborted,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ContainerNotFound => "container_not_found",
            ErrorCode::EntityNotFound => "entity_not_found",
            ErrorCode::FetchFailed => "fetch_failed",
            ErrorCode::MalformedGraph => "malformed_graph",
            ErrorCode::RebuildAborted => "rebuild_aborted",
        }
    }

    /// Get the error category for metrics
    pub fn category(&self) -> &'static str {
        match self {
            ErrorCode::ContainerNotFound | ErrorCode::EntityNotFound => "graph_integrity",
            ErrorCode::FetchFailed | ErrorCode::MalformedGraph => "source",
            ErrorCode::RebuildAborted => "server_error",
        }
    }

    /// Check if a later attempt could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorCode::FetchFailed | ErrorCode::RebuildAborted)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// DICTIONARY ERROR
// =============================================================================

/// Fatal errors that abort a dictionary rebuild.
///
/// `Clone` so that one failed rebuild can be handed to every caller that was
/// waiting on it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DictionaryError {
    #[error("could not find categorical variable container with ID={id}")]
    ContainerNotFound { id: String },

    #[error("could not find record with @id={id}")]
    EntityNotFound { id: String },

    #[error("failed to fetch JSON-LD graph from {url}: {reason}")]
    FetchFailed { url: String, reason: String },

    #[error("malformed JSON-LD graph: {reason}")]
    MalformedGraph { reason: String },

    #[error("dictionary rebuild aborted: {reason}")]
    RebuildAborted { reason: String },
}

impl DictionaryError {
    pub fn container_not_found(id: impl Into<String>) -> Self {
        Self::ContainerNotFound { id: id.into() }
    }

    pub fn entity_not_found(id: impl Into<String>) -> Self {
        Self::EntityNotFound { id: id.into() }
    }

    pub fn fetch_failed(url: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::FetchFailed {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedGraph {
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            DictionaryError::ContainerNotFound { .. } => ErrorCode::ContainerNotFound,
            DictionaryError::EntityNotFound { .. } => ErrorCode::EntityNotFound,
            DictionaryError::FetchFailed { .. } => ErrorCode::FetchFailed,
            DictionaryError::MalformedGraph { .. } => ErrorCode::MalformedGraph,
            DictionaryError::RebuildAborted { .. } => ErrorCode::RebuildAborted,
        }
    }

    /// Record this error in the Prometheus error counters
    pub fn track(&self) {
        crate::metrics::METRICS.record_error(self.code());
    }
}

// =============================================================================
// HTTP MAPPING
// =============================================================================

/// Body returned to clients when the dictionary cannot be produced.
///
/// Details stay in the logs; clients only learn that the server failed.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub status: u16,
    pub msg: &'static str,
}

/// Handler-facing error wrapper that renders as a 500 response
#[derive(Debug)]
pub struct ApiError(pub DictionaryError);

impl From<DictionaryError> for ApiError {
    fn from(error: DictionaryError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!(
            error_code = %self.0.code(),
            category = self.0.code().category(),
            error = %self.0,
            "request failed"
        );
        let status = StatusCode::INTERNAL_SERVER_ERROR;
        let body = ErrorBody {
            status: status.as_u16(),
            msg: "Internal Server Error",
        };
        (status, Json(body)).into_response()
    }
}
