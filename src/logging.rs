//! Structured logging setup.
//!
//! JSON lines in production and pretty output elsewhere, written to stdout,
//! stderr or a daily-rotated file. When `OTEL_EXPORTER_OTLP_ENDPOINT` is set,
//! spans and events (rebuild failures, data-quality warnings) are also
//! exported over OTLP.

use anyhow::{Context, Result};
use opentelemetry::{KeyValue, trace::TraceError};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    Resource,
    trace::{RandomIdGenerator, Sampler, Tracer},
};
use std::env;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const SERVICE_NAME: &str = "metadata-dictionary-server";

/// Log line encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "pretty" => Some(Self::Pretty),
            _ => None,
        }
    }
}

/// Where log lines are written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    Stdout,
    Stderr,
    /// Daily-rotated file under `log_dir`
    File,
}

impl LogOutput {
    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "stdout" => Some(Self::Stdout),
            "stderr" => Some(Self::Stderr),
            "file" => Some(Self::File),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub output: LogOutput,
    pub log_dir: PathBuf,
    pub log_file_prefix: String,
    pub service_name: String,
    pub service_version: String,
    pub environment: String,
    /// Filter used when `RUST_LOG` is unset
    pub level: Option<String>,
    /// OTLP collector; export is off when `None`
    pub otlp_endpoint: Option<String>,
    /// Fraction of traces exported, 0.0 to 1.0
    pub otel_sampling_rate: f64,
    pub otlp_timeout: Duration,
}

impl LoggingConfig {
    /// Defaults for the given deployment environment
    pub fn for_environment(environment: impl Into<String>) -> Self {
        let environment = environment.into();
        let production = is_production(&environment);
        Self {
            format: if production {
                LogFormat::Json
            } else {
                LogFormat::Pretty
            },
            output: LogOutput::Stdout,
            log_dir: PathBuf::from("logs"),
            log_file_prefix: SERVICE_NAME.to_string(),
            service_name: SERVICE_NAME.to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            environment,
            level: None,
            otlp_endpoint: None,
            otel_sampling_rate: if production { 0.1 } else { 1.0 },
            otlp_timeout: Duration::from_secs(10),
        }
    }

    /// Read `ENVIRONMENT` (or `NODE_ENV`), `LOG_FORMAT`, `LOG_OUTPUT`,
    /// `LOG_DIR`, `LOG_LEVEL` and the OTLP variables.
    pub fn from_env() -> Self {
        let environment = env_value("ENVIRONMENT")
            .or_else(|| env_value("NODE_ENV"))
            .unwrap_or_else(|| "development".to_string());
        let mut config = Self::for_environment(environment);

        if let Some(format) = env_value("LOG_FORMAT").as_deref().and_then(LogFormat::parse) {
            config.format = format;
        }
        if let Some(output) = env_value("LOG_OUTPUT").as_deref().and_then(LogOutput::parse) {
            config.output = output;
        }
        if let Some(dir) = env_value("LOG_DIR") {
            config.log_dir = PathBuf::from(dir);
        }
        config.level = env_value("LOG_LEVEL").map(|level| level.to_ascii_lowercase());
        config.otlp_endpoint = env_value("OTEL_EXPORTER_OTLP_ENDPOINT");
        if let Some(rate) = env_value("OTEL_SAMPLING_RATE").and_then(|v| v.parse::<f64>().ok()) {
            config.otel_sampling_rate = rate.clamp(0.0, 1.0);
        }
        if let Some(secs) = env_value("OTEL_EXPORTER_OTLP_TIMEOUT").and_then(|v| v.parse().ok()) {
            config.otlp_timeout = Duration::from_secs(secs);
        }
        config
    }

    pub fn otel_enabled(&self) -> bool {
        self.otlp_endpoint.is_some()
    }

    /// Filter directives used when `RUST_LOG` is not set
    pub fn default_directives(&self) -> String {
        let level = self.level.as_deref().unwrap_or(if is_production(&self.environment) {
            "info"
        } else {
            "debug"
        });
        format!("{level},hyper=info,reqwest=info,h2=info")
    }

    fn resource(&self) -> Resource {
        use opentelemetry_semantic_conventions::resource;
        Resource::new([
            KeyValue::new(resource::SERVICE_NAME, self.service_name.clone()),
            KeyValue::new(resource::SERVICE_VERSION, self.service_version.clone()),
            KeyValue::new("deployment.environment", self.environment.clone()),
        ])
    }

    fn sampler(&self) -> Sampler {
        match self.otel_sampling_rate {
            rate if rate >= 1.0 => Sampler::AlwaysOn,
            rate if rate <= 0.0 => Sampler::AlwaysOff,
            rate => Sampler::ParentBased(Box::new(Sampler::TraceIdRatioBased(rate))),
        }
    }

    fn writer(&self) -> Result<(NonBlocking, WorkerGuard)> {
        Ok(match self.output {
            LogOutput::Stdout => tracing_appender::non_blocking(io::stdout()),
            LogOutput::Stderr => tracing_appender::non_blocking(io::stderr()),
            LogOutput::File => {
                std::fs::create_dir_all(&self.log_dir).with_context(|| {
                    format!("failed to create log directory {:?}", self.log_dir)
                })?;
                tracing_appender::non_blocking(tracing_appender::rolling::daily(
                    &self.log_dir,
                    &self.log_file_prefix,
                ))
            }
        })
    }
}

fn is_production(environment: &str) -> bool {
    matches!(environment, "production" | "prod")
}

fn env_value(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Install the global subscriber.
///
/// The returned guard flushes buffered lines on drop; hold it until exit.
pub fn init_logging(config: LoggingConfig) -> Result<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_directives()));
    let (writer, guard) = config.writer()?;

    let fmt_layer = match config.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(writer)
            .with_current_span(true)
            .with_span_list(false)
            .with_span_events(FmtSpan::CLOSE)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_writer(writer)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(config.output != LogOutput::File)
            .boxed(),
    };

    let otel_layer = config
        .otel_enabled()
        .then(|| init_tracer(&config))
        .and_then(|tracer| match tracer {
            Ok(tracer) => Some(tracing_opentelemetry::layer().with_tracer(tracer)),
            Err(error) => {
                eprintln!("OpenTelemetry exporter unavailable, continuing without it: {error}");
                None
            }
        });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(otel_layer)
        .try_init()
        .context("failed to install tracing subscriber")?;

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = %config.environment,
        format = ?config.format,
        output = ?config.output,
        otel = config.otel_enabled(),
        "logging initialized"
    );
    Ok(guard)
}

/// Build the OTLP batch pipeline and install it as the global provider
fn init_tracer(config: &LoggingConfig) -> Result<Tracer, TraceError> {
    let endpoint = config
        .otlp_endpoint
        .as_deref()
        .ok_or_else(|| TraceError::Other("no OTLP endpoint configured".into()))?;

    let exporter = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint(endpoint)
        .with_timeout(config.otlp_timeout);

    opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(exporter)
        .with_trace_config(
            opentelemetry_sdk::trace::Config::default()
                .with_sampler(config.sampler())
                .with_id_generator(RandomIdGenerator::default())
                .with_resource(config.resource()),
        )
        .install_batch(opentelemetry_sdk::runtime::Tokio)
}

/// Flush and stop the OTLP exporter, if one was installed
pub fn shutdown_telemetry() {
    tracing::debug!("shutting down telemetry");
    opentelemetry::global::shutdown_tracer_provider();
}

/// Span wrapping one inbound HTTP request
pub fn request_span(method: &str, path: &str) -> tracing::Span {
    tracing::info_span!(
        "http_request",
        http.method = method,
        http.path = path,
        http.status = tracing::field::Empty,
    )
}
