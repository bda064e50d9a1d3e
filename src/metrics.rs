/// Prometheus metrics for production observability
///
/// Counters and gauges describing dictionary rebuilds, cache behaviour and
/// data quality. Exposed in text format on `/metrics`.
use crate::error::ErrorCode;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use prometheus_client::encoding::{EncodeLabelSet, text::encode};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::metrics::histogram::{Histogram, exponential_buckets};
use prometheus_client::registry::Registry;
use std::sync::Arc;
use std::time::Duration;

/// Global metrics registry instance
pub static METRICS: Lazy<Arc<MetricsCollector>> = Lazy::new(|| Arc::new(MetricsCollector::new()));

/// How a rebuild ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildOutcome {
    Success,
    Failure,
}

impl RebuildOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RebuildOutcome::Success => "success",
            RebuildOutcome::Failure => "failure",
        }
    }
}

/// Labels for rebuild metrics
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct OutcomeLabels {
    /// "success" or "failure"
    pub outcome: String,
}

/// Labels for warning and error metrics
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct KindLabels {
    pub kind: String,
}

/// Central metrics collector with Prometheus registry
pub struct MetricsCollector {
    registry: RwLock<Registry>,

    /// Rebuilds by outcome
    pub dictionary_rebuilds: Family<OutcomeLabels, Counter>,

    /// Wall-clock rebuild duration, fetch included
    pub dictionary_rebuild_duration_seconds: Histogram,

    pub dictionary_cache_hits: Counter,

    pub dictionary_cache_misses: Counter,

    /// Rows in the dictionary currently being served
    pub dictionary_entries: Gauge,

    /// Data-quality warnings by kind
    pub dictionary_warnings: Family<KindLabels, Counter>,

    /// Fatal rebuild errors by error code
    pub dictionary_errors: Family<KindLabels, Counter>,
}

impl MetricsCollector {
    /// Create a new metrics collector with all metrics registered
    pub fn new() -> Self {
        let mut registry = Registry::default();

        // Counters get the `_total` suffix from the encoder.
        let dictionary_rebuilds = Family::<OutcomeLabels, Counter>::default();
        registry.register(
            "dictionary_rebuilds",
            "Number of dictionary rebuilds by outcome",
            dictionary_rebuilds.clone(),
        );

        // Buckets: 50ms .. ~100s
        let dictionary_rebuild_duration_seconds = Histogram::new(exponential_buckets(0.05, 2.0, 12));
        registry.register(
            "dictionary_rebuild_duration_seconds",
            "Dictionary rebuild duration in seconds",
            dictionary_rebuild_duration_seconds.clone(),
        );

        let dictionary_cache_hits = Counter::default();
        registry.register(
            "dictionary_cache_hits",
            "Requests served from a fresh cached dictionary",
            dictionary_cache_hits.clone(),
        );

        let dictionary_cache_misses = Counter::default();
        registry.register(
            "dictionary_cache_misses",
            "Requests that waited on a rebuild",
            dictionary_cache_misses.clone(),
        );

        let dictionary_entries = Gauge::default();
        registry.register(
            "dictionary_entries",
            "Number of entries in the cached dictionary",
            dictionary_entries.clone(),
        );

        let dictionary_warnings = Family::<KindLabels, Counter>::default();
        registry.register(
            "dictionary_warnings",
            "Data-quality warnings raised during rebuilds",
            dictionary_warnings.clone(),
        );

        let dictionary_errors = Family::<KindLabels, Counter>::default();
        registry.register(
            "dictionary_errors",
            "Fatal rebuild errors by error code",
            dictionary_errors.clone(),
        );

        Self {
            registry: RwLock::new(registry),
            dictionary_rebuilds,
            dictionary_rebuild_duration_seconds,
            dictionary_cache_hits,
            dictionary_cache_misses,
            dictionary_entries,
            dictionary_warnings,
            dictionary_errors,
        }
    }

    /// Encode metrics in Prometheus text format
    pub fn encode(&self) -> Result<String, std::fmt::Error> {
        let mut buffer = String::new();
        let registry = self.registry.read();
        encode(&mut buffer, &registry)?;
        Ok(buffer)
    }

    /// Record a finished rebuild
    pub fn record_rebuild(&self, outcome: RebuildOutcome, duration: Duration) {
        self.dictionary_rebuilds
            .get_or_create(&OutcomeLabels {
                outcome: outcome.as_str().to_string(),
            })
            .inc();
        self.dictionary_rebuild_duration_seconds
            .observe(duration.as_secs_f64());
    }

    pub fn record_cache_hit(&self) {
        self.dictionary_cache_hits.inc();
    }

    pub fn record_cache_miss(&self) {
        self.dictionary_cache_misses.inc();
    }

    pub fn set_entries(&self, entries: usize) {
        self.dictionary_entries.set(entries as i64);
    }

    pub fn record_warning(&self, kind: &str) {
        self.dictionary_warnings
            .get_or_create(&KindLabels {
                kind: kind.to_string(),
            })
            .inc();
    }

    pub fn record_error(&self, code: ErrorCode) {
        self.dictionary_errors
            .get_or_create(&KindLabels {
                kind: code.as_str().to_string(),
            })
            .inc();
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_collector_creation() {
        let collector = MetricsCollector::new();
        collector.record_rebuild(RebuildOutcome::Success, Duration::from_millis(120));
        let output = collector.encode().unwrap();

        assert!(output.contains("dictionary_rebuilds_total"));
        assert!(output.contains("dictionary_rebuild_duration_seconds"));
        assert!(output.contains("dictionary_cache_hits_total"));
        assert!(output.contains("dictionary_cache_misses_total"));
        assert!(output.contains("dictionary_entries"));
    }

    #[test]
    fn test_cache_metrics() {
        let collector = MetricsCollector::new();

        collector.record_cache_hit();
        collector.record_cache_hit();
        collector.record_cache_miss();
        collector.set_entries(340);

        let output = collector.encode().unwrap();
        assert!(output.contains("dictionary_cache_hits_total 2"));
        assert!(output.contains("dictionary_cache_misses_total 1"));
        assert!(output.contains("dictionary_entries 340"));
    }

    #[test]
    fn test_rebuild_outcomes_are_labelled() {
        let collector = MetricsCollector::new();
        collector.record_rebuild(RebuildOutcome::Failure, Duration::from_secs(1));

        let output = collector.encode().unwrap();
        assert!(output.contains("outcome=\"failure\""));
        assert!(!output.contains("outcome=\"success\""));
    }

    #[test]
    fn test_warnings_and_errors_by_kind() {
        let collector = MetricsCollector::new();
        collector.record_warning("missing_value_code");
        collector.record_warning("missing_value_code");
        collector.record_error(ErrorCode::EntityNotFound);

        let output = collector.encode().unwrap();
        assert!(output.contains("dictionary_warnings_total{kind=\"missing_value_code\"} 2"));
        assert!(output.contains("dictionary_errors_total{kind=\"entity_not_found\"} 1"));
    }
}
