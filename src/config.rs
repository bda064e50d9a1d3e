use crate::retry::RetryConfig;
use crate::source::DEFAULT_JSONLD_URL;
use crate::vocab::catalog::CATEGORICAL_VARIABLES_CONTAINER;
use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_CACHE_EXPIRY_SECS: u64 = 4 * 60 * 60;
const DEFAULT_FETCH_TIMEOUT_MS: u64 = 60_000;
const DEFAULT_FETCH_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub http_bind_address: SocketAddr,
    pub jsonld_url: String,
    pub cat_var_id: String,
    pub cache_expiry_secs: u64,
    pub fetch_timeout_ms: u64,
    pub fetch_attempts: u32,
    pub warm_cache: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_bind_address: bind_all(DEFAULT_PORT),
            jsonld_url: DEFAULT_JSONLD_URL.to_string(),
            cat_var_id: CATEGORICAL_VARIABLES_CONTAINER.to_string(),
            cache_expiry_secs: DEFAULT_CACHE_EXPIRY_SECS,
            fetch_timeout_ms: DEFAULT_FETCH_TIMEOUT_MS,
            fetch_attempts: DEFAULT_FETCH_ATTEMPTS,
            warm_cache: false,
        }
    }
}

impl ServerConfig {
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let CliArgs {
            config,
            http_bind: cli_http_bind,
            port: cli_port,
            jsonld_url: cli_jsonld_url,
            cat_var_id: cli_cat_var_id,
            cache_expiry_seconds: cli_cache_expiry,
            fetch_timeout_ms: cli_fetch_timeout,
            fetch_retries: cli_fetch_retries,
            warm_cache: cli_warm_cache,
        } = args;

        let file_config = if let Some(path) = config.as_ref() {
            load_config_file(path)?
        } else {
            PartialConfig::default()
        };

        let PartialConfig {
            http_bind: file_http_bind,
            port: file_port,
            jsonld_url: file_jsonld_url,
            cat_var_id: file_cat_var_id,
            cache_expiry_seconds: file_cache_expiry,
            fetch_timeout_ms: file_fetch_timeout,
            fetch_retries: file_fetch_retries,
            warm_cache: file_warm_cache,
        } = file_config;

        let defaults = Self::default();

        let http_bind_address = cli_http_bind
            .or(cli_port.map(bind_all))
            .or(file_http_bind)
            .or(file_port.map(bind_all))
            .unwrap_or(defaults.http_bind_address);

        let jsonld_url = cli_jsonld_url
            .or(file_jsonld_url)
            .map(|url| url.trim().to_string())
            .unwrap_or(defaults.jsonld_url);

        let cat_var_id = cli_cat_var_id
            .or(file_cat_var_id)
            .map(|id| id.trim().to_string())
            .unwrap_or(defaults.cat_var_id);

        Ok(Self {
            http_bind_address,
            jsonld_url,
            cat_var_id,
            cache_expiry_secs: cli_cache_expiry
                .or(file_cache_expiry)
                .unwrap_or(defaults.cache_expiry_secs),
            fetch_timeout_ms: cli_fetch_timeout
                .or(file_fetch_timeout)
                .unwrap_or(defaults.fetch_timeout_ms),
            fetch_attempts: cli_fetch_retries
                .or(file_fetch_retries)
                .unwrap_or(defaults.fetch_attempts),
            warm_cache: cli_warm_cache || file_warm_cache.unwrap_or(false),
        })
    }

    /// Fail fast on values the server cannot run with
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.cache_expiry_secs > 0,
            "cache expiry must be greater than zero seconds"
        );
        anyhow::ensure!(
            self.fetch_timeout_ms > 0,
            "fetch timeout must be greater than zero milliseconds"
        );
        anyhow::ensure!(
            self.fetch_attempts > 0,
            "fetch retries must allow at least one attempt"
        );
        anyhow::ensure!(
            self.jsonld_url.starts_with("http://") || self.jsonld_url.starts_with("https://"),
            "JSON-LD URL {:?} must be http or https",
            self.jsonld_url
        );
        anyhow::ensure!(
            !self.cat_var_id.is_empty(),
            "categorical variable container id must not be empty"
        );
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_expiry_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::network().with_max_attempts(self.fetch_attempts)
    }
}

fn bind_all(port: u16) -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, port))
}

#[derive(Parser, Debug, Default, Clone)]
#[command(
    name = "metadata-dictionary-server",
    about = "Serves the AusPlots metadata dictionary over HTTP",
    version
)]
pub struct CliArgs {
    #[arg(
        long,
        value_name = "FILE",
        help = "Path to a configuration file (YAML, JSON or TOML)"
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        env = "DICTIONARY_HTTP_BIND",
        value_name = "ADDR",
        help = "HTTP bind address"
    )]
    pub http_bind: Option<SocketAddr>,

    #[arg(
        long,
        env = "PORT",
        value_name = "PORT",
        help = "Port to listen on (all interfaces) when no bind address is given",
        value_parser = clap::value_parser!(u16)
    )]
    pub port: Option<u16>,

    #[arg(
        long,
        env = "JSONLD_URL",
        value_name = "URL",
        help = "URL of the JSON-LD vocabulary download"
    )]
    pub jsonld_url: Option<String>,

    #[arg(
        long,
        env = "CAT_VAR_ID",
        value_name = "IRI",
        help = "Identifier of the categorical variable container"
    )]
    pub cat_var_id: Option<String>,

    #[arg(
        long,
        env = "CACHE_EXPIRY_SECONDS",
        value_name = "SECS",
        help = "Seconds a built dictionary is served before it is rebuilt",
        value_parser = clap::value_parser!(u64)
    )]
    pub cache_expiry_seconds: Option<u64>,

    #[arg(
        long,
        env = "DICTIONARY_FETCH_TIMEOUT_MS",
        value_name = "MS",
        help = "Timeout for one download of the JSON-LD document",
        value_parser = clap::value_parser!(u64)
    )]
    pub fetch_timeout_ms: Option<u64>,

    #[arg(
        long,
        env = "DICTIONARY_FETCH_RETRIES",
        value_name = "N",
        help = "Download attempts per rebuild",
        value_parser = clap::value_parser!(u32)
    )]
    pub fetch_retries: Option<u32>,

    #[arg(
        long,
        env = "DICTIONARY_WARM_CACHE",
        help = "Build the dictionary before accepting requests"
    )]
    pub warm_cache: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PartialConfig {
    http_bind: Option<SocketAddr>,
    port: Option<u16>,
    jsonld_url: Option<String>,
    cat_var_id: Option<String>,
    cache_expiry_seconds: Option<u64>,
    fetch_timeout_ms: Option<u64>,
    fetch_retries: Option<u32>,
    warm_cache: Option<bool>,
}

fn load_config_file(path: &Path) -> Result<PartialConfig> {
    if !path.exists() {
        anyhow::bail!("config file {:?} does not exist", path);
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {:?}", path))?;
    let ext = path
        .extension()
        .and_then(|os| os.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let parsed = match ext.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse YAML config {:?}", path))?,
        "json" => serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse JSON config {:?}", path))?,
        "toml" => toml::from_str(&contents)
            .with_context(|| format!("failed to parse TOML config {:?}", path))?,
        other => anyhow::bail!("unsupported config extension: {other}"),
    };
    Ok(parsed)
}
