//! Configuration management for the ad server.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use crate::error::{AdServerError, Result};

/// Prefix for environment overrides, e.g. `ADSERVER__SERVER__HTTP_ADDR`.
const ENV_PREFIX: &str = "ADSERVER";

/// Main configuration for the ad server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdServerConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Ad store behavior
    #[serde(default)]
    pub ads: AdsConfig,

    /// Per-client admission control
    #[serde(default)]
    pub rate_limit: RateLimitSettings,

    /// Log output
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP listen address
    #[serde(default = "default_http_addr")]
    pub http_addr: SocketAddr,

    /// Upper bound on handling a single request
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_http_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_request_timeout() -> u64 {
    30
}

/// Ad store configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdsConfig {
    /// TTL applied when a create request leaves `ttlMinutes` out (0 = never expires)
    #[serde(default)]
    pub default_ttl_minutes: u32,
}

/// Token bucket parameters shared by every client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLimitSettings {
    /// Tokens added per second
    #[serde(default = "default_refill_rate")]
    pub refill_rate: f64,

    /// Bucket capacity
    #[serde(default = "default_burst")]
    pub burst: u32,

    /// Drop buckets idle for this long; unset keeps every bucket forever
    #[serde(default)]
    pub idle_eviction_secs: Option<u64>,
}

impl RateLimitSettings {
    /// Conservative limits for production traffic: 10/s, burst 20.
    pub fn standard() -> Self {
        Self {
            refill_rate: default_refill_rate(),
            burst: default_burst(),
            idle_eviction_secs: None,
        }
    }

    /// Looser limits for tests and diagnostics: 100/s, burst 200.
    pub fn relaxed() -> Self {
        Self {
            refill_rate: 100.0,
            burst: 200,
            idle_eviction_secs: None,
        }
    }

    pub fn idle_eviction(&self) -> Option<Duration> {
        self.idle_eviction_secs.map(Duration::from_secs)
    }

    /// Reject parameters the token bucket cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !self.refill_rate.is_finite() || self.refill_rate <= 0.0 {
            return Err(AdServerError::Config(format!(
                "rate_limit.refill_rate must be positive, got {}",
                self.refill_rate
            )));
        }
        if self.burst == 0 {
            return Err(AdServerError::Config(
                "rate_limit.burst must be at least 1".to_string(),
            ));
        }
        if let Some(idle) = self.idle_eviction_secs {
            // An evicted bucket comes back full, so the window must cover a full refill
            let refill_secs = (f64::from(self.burst) / self.refill_rate).ceil().max(1.0);
            if (idle as f64) < refill_secs {
                return Err(AdServerError::Config(format!(
                    "rate_limit.idle_eviction_secs must be at least {refill_secs} \
                     (burst / refill_rate), got {idle}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self::standard()
    }
}

fn default_refill_rate() -> f64 {
    10.0
}

fn default_burst() -> u32 {
    20
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` wins when set
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AdServerConfig {
    /// Load configuration from an optional YAML file, then apply
    /// `ADSERVER__SECTION__KEY` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = ::config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(
                ::config::File::from(path).format(::config::FileFormat::Yaml),
            );
        }

        let config: AdServerConfig = builder
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file path, without environment overrides.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: AdServerConfig = serde_yaml::from_str(yaml)
            .map_err(|e| AdServerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check every section for values the server cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.server.request_timeout_secs == 0 {
            return Err(AdServerError::Config(
                "server.request_timeout_secs must be positive".to_string(),
            ));
        }
        self.rate_limit.validate()
    }
}
