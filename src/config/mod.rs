//! Configuration management for terminwatch
//!
//! Configuration comes from environment variables or a TOML file; a few
//! values can be overridden on the command line by the binary. The poll
//! interval floor is enforced here: Berlin.de's IKT-ZMS team mandates a
//! minimum of 180 seconds between checks.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Minimum allowed poll interval in seconds, mandated by the upstream.
pub const MIN_POLL_INTERVAL_SECS: u64 = 180;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Watcher configuration
    pub watch: WatchConfig,

    /// Subscriber server configuration
    pub server: ServerConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Watcher-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Service description page; the booking calendar link is resolved
    /// from it at startup
    pub service_page_url: String,

    /// Operator contact email, sent in the user agent as required by the
    /// upstream's usage policy
    pub email: String,

    /// Identifier for this deployment, also sent in the user agent
    pub script_id: String,

    /// Seconds between successful poll cycles
    pub poll_interval_secs: u64,

    /// Seconds to wait after the upstream rejects a request
    pub backoff_interval_secs: u64,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,

    /// Suppress the audible signal
    pub quiet: bool,
}

/// Subscriber server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Websocket port for subscribers
    pub port: u16,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

/// Parse a set environment variable, or fall back to `default` when unset.
/// A variable that is set but unparseable is a configuration error, not a
/// silent fallback.
fn env_parse<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(value) => value
            .parse::<T>()
            .with_context(|| format!("{name} is set to '{value}', which is not a valid value")),
        Err(_) => Ok(default),
    }
}

/// Boolean flavor of [`env_parse`]: accepts 1/0, true/false, yes/no.
fn env_flag(name: &str, default: bool) -> Result<bool> {
    match std::env::var(name) {
        Ok(value) => match value.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" => Ok(false),
            other => anyhow::bail!("{name} is set to '{other}', expected a boolean"),
        },
        Err(_) => Ok(default),
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let service_page_url = std::env::var("TERMINWATCH_URL")
            .unwrap_or_else(|_| String::from("https://service.berlin.de/dienstleistung/120686/"));

        let email = std::env::var("TERMINWATCH_EMAIL").unwrap_or_default();

        let script_id = std::env::var("TERMINWATCH_SCRIPT_ID")
            .unwrap_or_else(|_| String::from("terminwatch"));

        let poll_interval_secs =
            env_parse("TERMINWATCH_POLL_INTERVAL", MIN_POLL_INTERVAL_SECS)?;

        let backoff_interval_secs = env_parse("TERMINWATCH_BACKOFF_INTERVAL", 600)?;

        let request_timeout_secs = env_parse("TERMINWATCH_REQUEST_TIMEOUT", 20)?;

        let quiet = env_flag("TERMINWATCH_QUIET", false)?;

        let port = env_parse::<u16>("TERMINWATCH_PORT", 80)?;

        let level = std::env::var("TERMINWATCH_LOG_LEVEL").unwrap_or_else(|_| String::from("info"));

        let format = std::env::var("TERMINWATCH_LOG_FORMAT").unwrap_or_else(|_| String::from("text"));

        Ok(Self {
            watch: WatchConfig {
                service_page_url,
                email,
                script_id,
                poll_interval_secs,
                backoff_interval_secs,
                request_timeout_secs,
                quiet,
            },
            server: ServerConfig { port },
            logging: LoggingConfig { level, format },
        })
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.watch.service_page_url.is_empty() {
            anyhow::bail!("service_page_url must not be empty");
        }

        if self.watch.email.is_empty() {
            anyhow::bail!(
                "email must be set; Berlin.de requires an operator contact in the user agent"
            );
        }

        if self.watch.poll_interval_secs < MIN_POLL_INTERVAL_SECS {
            anyhow::bail!(
                "poll_interval_secs must be at least {MIN_POLL_INTERVAL_SECS} (upstream-mandated floor)"
            );
        }

        if self.watch.backoff_interval_secs < self.watch.poll_interval_secs {
            anyhow::bail!("backoff_interval_secs must not be shorter than poll_interval_secs");
        }

        if self.watch.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be greater than 0");
        }

        Ok(())
    }

    /// Get request timeout as Duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.watch.request_timeout_secs)
    }

    /// Get base poll interval as Duration
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.watch.poll_interval_secs)
    }

    /// Get escalated retry interval as Duration
    #[must_use]
    pub fn backoff_interval(&self) -> Duration {
        Duration::from_secs(self.watch.backoff_interval_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            watch: WatchConfig {
                service_page_url: String::from("https://service.berlin.de/dienstleistung/120686/"),
                email: String::from("operator@example.com"),
                script_id: String::from("terminwatch"),
                poll_interval_secs: MIN_POLL_INTERVAL_SECS,
                backoff_interval_secs: 600,
                request_timeout_secs: 20,
                quiet: false,
            },
            server: ServerConfig { port: 80 },
            logging: LoggingConfig {
                level: String::from("info"),
                format: String::from("text"),
            },
        }
    }
}
