//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `LOSTFOUND_BASE_URL` - Public URL embedded in every QR code
//! - `LOSTFOUND_DATABASE_URL` - Privileged `PostgreSQL` connection string used by
//!   the write paths (falls back to `DATABASE_URL`; not needed with the memory store)
//!
//! ## Optional
//! - `LOSTFOUND_STORE` - `postgres` or `memory` (default: postgres)
//! - `LOSTFOUND_READER_DATABASE_URL` - Restricted read-only role for activity
//!   queries and the scan change listener
//! - `LOSTFOUND_HOST` - Bind address (default: 127.0.0.1)
//! - `LOSTFOUND_PORT` - Listen port (default: 3000)
//! - `LOSTFOUND_QR_WIDTH` - QR image width in pixels (default: 300)
//! - `LOSTFOUND_QR_MARGIN` - Quiet zone in modules (default: 2)
//! - `LOSTFOUND_QR_DARK` - Foreground color (default: #000000)
//! - `LOSTFOUND_QR_LIGHT` - Background color (default: #FFFFFF)
//! - `LOSTFOUND_FEED_CAPACITY` - Buffered scan events per owner channel (default: 64)
//! - `LOSTFOUND_LOG_FORMAT` - `text` or `json` (default: text)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use crate::qr::{QrColor, QrOptions};

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Server application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL, used to build `<base>/scan?code=...` links
    pub base_url: Url,
    /// Which store backs the service
    pub store: StoreConfig,
    /// Rendering options for generated QR images
    pub qr: QrOptions,
    /// Per-owner buffer size of the scan notification feed
    pub feed_capacity: usize,
    /// Log output format
    pub log_format: LogFormat,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag (e.g. "production")
    pub sentry_environment: Option<String>,
    /// Fraction of error events sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions sent to Sentry
    pub sentry_traces_sample_rate: f32,
}

/// Backing store selection.
///
/// `SecretString` redacts the connection strings in `Debug` output.
#[derive(Debug, Clone)]
pub enum StoreConfig {
    /// `PostgreSQL` with an optional restricted reader role.
    Postgres {
        /// Privileged connection used by registration and scan logging
        database_url: SecretString,
        /// Read-only connection used by activity queries and the listener
        reader_database_url: Option<SecretString>,
    },
    /// Process-local store; data is lost on restart.
    Memory,
}

/// Log output format for the `fmt` layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}' (expected text or json)")),
        }
    }
}

impl AppConfig {
    /// Default per-owner feed buffer.
    pub const DEFAULT_FEED_CAPACITY: usize = 64;

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env_or_default::<IpAddr>("LOSTFOUND_HOST", "127.0.0.1")?;
        let port = parse_env_or_default::<u16>("LOSTFOUND_PORT", "3000")?;
        let base_url = parse_base_url(&get_required_env("LOSTFOUND_BASE_URL")?)
            .map_err(|e| ConfigError::InvalidEnvVar("LOSTFOUND_BASE_URL".to_string(), e))?;
        let store = StoreConfig::from_env()?;
        let qr = qr_options_from_env()?;

        let feed_capacity = parse_env_or_default::<usize>(
            "LOSTFOUND_FEED_CAPACITY",
            &Self::DEFAULT_FEED_CAPACITY.to_string(),
        )?;
        if feed_capacity == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "LOSTFOUND_FEED_CAPACITY".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let log_format = parse_env_or_default::<LogFormat>("LOSTFOUND_LOG_FORMAT", "text")?;

        Ok(Self {
            host,
            port,
            base_url,
            store,
            qr,
            feed_capacity,
            log_format,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env_or_default::<f32>("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env_or_default::<f32>(
                "SENTRY_TRACES_SAMPLE_RATE",
                "0.0",
            )?,
        })
    }

    /// Configuration for an in-memory deployment with defaults everywhere.
    ///
    /// Used by tests and by `LOSTFOUND_STORE=memory` local runs.
    #[must_use]
    pub fn in_memory(base_url: Url) -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            base_url,
            store: StoreConfig::Memory,
            qr: QrOptions::default(),
            feed_capacity: Self::DEFAULT_FEED_CAPACITY,
            log_format: LogFormat::Text,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Build the URL a QR code for `code` should point at.
    ///
    /// `https://tags.example.com/app` yields
    /// `https://tags.example.com/app/scan?code=<code>`.
    #[must_use]
    pub fn scan_url(&self, code: &str) -> Url {
        scan_url(&self.base_url, code)
    }
}

/// Build `<base>/scan?code=<code>` for any base URL.
#[must_use]
pub fn scan_url(base_url: &Url, code: &str) -> Url {
    let mut url = base_url.clone();
    // `Url::join` would drop the last path segment of a base without a
    // trailing slash, so push the segment explicitly.
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().push("scan");
    }
    url.set_fragment(None);
    url.query_pairs_mut().clear().append_pair("code", code);
    url
}

impl StoreConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let backend = get_env_or_default("LOSTFOUND_STORE", "postgres");
        match backend.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres {
                database_url: get_database_url("LOSTFOUND_DATABASE_URL")?,
                reader_database_url: get_optional_env("LOSTFOUND_READER_DATABASE_URL")
                    .map(SecretString::from),
            }),
            "memory" => Ok(Self::Memory),
            other => Err(ConfigError::InvalidEnvVar(
                "LOSTFOUND_STORE".to_string(),
                format!("unknown store '{other}' (expected postgres or memory)"),
            )),
        }
    }
}

fn qr_options_from_env() -> Result<QrOptions, ConfigError> {
    let defaults = QrOptions::default();
    Ok(QrOptions {
        width: parse_env_or_default::<u32>("LOSTFOUND_QR_WIDTH", &defaults.width.to_string())?,
        margin: parse_env_or_default::<u32>("LOSTFOUND_QR_MARGIN", &defaults.margin.to_string())?,
        dark: parse_env_or_default::<QrColor>("LOSTFOUND_QR_DARK", &defaults.dark.to_string())?,
        light: parse_env_or_default::<QrColor>(
            "LOSTFOUND_QR_LIGHT",
            &defaults.light.to_string(),
        )?,
    })
}

/// Parse and check the public base URL.
///
/// # Errors
///
/// Returns a description of the problem if `raw` is not an absolute
/// http(s) URL with a host.
pub fn parse_base_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("scheme must be http or https (got {})", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err("must have a host".to_string());
    }
    Ok(url)
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable (or its default) into `T`.
fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    fn config_with_base(base: &str) -> AppConfig {
        AppConfig::in_memory(Url::parse(base).unwrap())
    }

    #[test]
    fn test_scan_url_root() {
        let config = config_with_base("https://tags.example.com");
        assert_eq!(
            config.scan_url("1a2b3c4d").as_str(),
            "https://tags.example.com/scan?code=1a2b3c4d"
        );
    }

    #[test]
    fn test_scan_url_keeps_base_path() {
        let config = config_with_base("https://example.com/lost-found");
        assert_eq!(
            config.scan_url("abc").as_str(),
            "https://example.com/lost-found/scan?code=abc"
        );

        let config = config_with_base("https://example.com/lost-found/");
        assert_eq!(
            config.scan_url("abc").as_str(),
            "https://example.com/lost-found/scan?code=abc"
        );
    }

    #[test]
    fn test_scan_url_encodes_code() {
        let config = config_with_base("http://localhost:3000");
        assert_eq!(
            config.scan_url("a b&c").as_str(),
            "http://localhost:3000/scan?code=a+b%26c"
        );
    }

    #[test]
    fn test_parse_base_url() {
        assert!(parse_base_url("https://tags.example.com").is_ok());
        assert!(parse_base_url("ftp://tags.example.com").is_err());
        assert!(parse_base_url("not a url").is_err());
    }

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_socket_addr() {
        let config = config_with_base("http://localhost:3000");
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_store_config_debug_redacts_urls() {
        let store = StoreConfig::Postgres {
            database_url: SecretString::from("postgres://svc:hunter2@db/lostfound"),
            reader_database_url: Some(SecretString::from("postgres://ro:swordfish@db/lostfound")),
        };

        let debug_output = format!("{store:?}");
        assert!(!debug_output.contains("hunter2"));
        assert!(!debug_output.contains("swordfish"));

        if let StoreConfig::Postgres { database_url, .. } = &store {
            assert!(database_url.expose_secret().contains("hunter2"));
        }
    }
}
