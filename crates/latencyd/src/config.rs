//! Configuration management for latencyd.
//!
//! Loads settings from /etc/latencyd/config.toml or uses defaults. Command
//! line flags override file values.

use anyhow::{bail, Context, Result};
use latency_common::DEFAULT_THRESHOLD_MS;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Config file path
pub const CONFIG_PATH: &str = "/etc/latencyd/config.toml";

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Largest accepted request body
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_bind_addr() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_max_body_bytes() -> usize {
    64 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

/// Telemetry dataset location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_path")]
    pub path: PathBuf,
}

fn default_data_path() -> PathBuf {
    PathBuf::from("data/q-vercel-latency.json")
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: default_data_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Threshold used when a request has no `threshold_ms`
    #[serde(default = "default_threshold_ms")]
    pub default_threshold_ms: f64,
}

fn default_threshold_ms() -> f64 {
    DEFAULT_THRESHOLD_MS
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            default_threshold_ms: default_threshold_ms(),
        }
    }
}

/// CORS policy applied to every route
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Allowed origins; `"*"` allows any
    #[serde(default = "default_allow_origins")]
    pub allow_origins: Vec<String>,

    /// Preflight cache lifetime sent as Access-Control-Max-Age
    #[serde(default = "default_max_age_secs")]
    pub max_age_secs: u64,
}

fn default_allow_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_max_age_secs() -> u64 {
    3600
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_origins: default_allow_origins(),
            max_age_secs: default_max_age_secs(),
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub aggregation: AggregationConfig,

    #[serde(default)]
    pub cors: CorsConfig,
}

impl Config {
    /// Load config from `path`, or return defaults when the file is absent.
    ///
    /// A file that exists but does not parse is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            warn!("Config not found at {}, using defaults", path.display());
            return Ok(Config::default());
        }
        Self::load_from_path(path)
    }

    fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("invalid config {}", path.display()))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Apply command line overrides
    pub fn apply_overrides(&mut self, data: Option<PathBuf>, bind: Option<String>) {
        if let Some(path) = data {
            self.data.path = path;
        }
        if let Some(addr) = bind {
            self.server.bind_addr = addr;
        }
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.server
            .bind_addr
            .parse()
            .with_context(|| format!("invalid bind address '{}'", self.server.bind_addr))
    }

    /// Reject settings the server cannot start with
    pub fn validate(&self) -> Result<()> {
        self.bind_addr()?;
        if self.server.max_body_bytes == 0 {
            bail!("server.max_body_bytes must be greater than zero");
        }
        if !self.aggregation.default_threshold_ms.is_finite() {
            bail!("aggregation.default_threshold_ms must be a finite number");
        }
        if self.cors.allow_origins.is_empty() {
            bail!("cors.allow_origins must name at least one origin");
        }
        Ok(())
    }
}
