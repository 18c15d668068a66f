//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOPFRONT_API_BASE_URL` - Base URL of the REST API (e.g. `https://api.example.com/api`)
//! - `SHOPFRONT_BASE_URL` - Public URL for the storefront (https enables secure cookies)
//!
//! ## Optional
//! - `SHOPFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `SHOPFRONT_PORT` - Listen port (default: 3000)
//! - `SHOPFRONT_STATIC_DIR` - Directory served under `/static` (default: the crate's `static/`)
//! - `SHOPFRONT_API_TIMEOUT_SECS` - Per-request timeout for API calls (default: 10)
//! - `SHOPFRONT_CACHE_TTL_SECS` - Product/category cache TTL, 0 disables (default: 60)
//! - `SHOPFRONT_PAGE_SIZE` - Products per listing page (default: 12)
//! - `SHOPFRONT_SEARCH_DEBOUNCE_MS` - Search input debounce delay (default: 300)
//! - `SHOPFRONT_SESSION_REVALIDATE_SECS` - How often a session is re-checked against
//!   the profile endpoint (default: 300)
//! - `SHOPFRONT_LOG_FORMAT` - `pretty` or `json` (default: pretty)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_API_TIMEOUT_SECS: u64 = 10;
const DEFAULT_CACHE_TTL_SECS: u64 = 60;
const DEFAULT_PAGE_SIZE: u32 = 12;
const MAX_PAGE_SIZE: u32 = 100;
const DEFAULT_SEARCH_DEBOUNCE_MS: u32 = 300;
const DEFAULT_SESSION_REVALIDATE_SECS: u64 = 300;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Directory served under `/static`
    pub static_dir: PathBuf,
    /// Remote REST API configuration
    pub api: ApiConfig,
    /// Product listing behaviour
    pub catalog: CatalogConfig,
    /// Minimum age of a session before it is re-checked against the profile endpoint
    pub session_revalidate_interval: Duration,
    /// Log output format
    pub log_format: LogFormat,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name (e.g. "production")
    pub sentry_environment: Option<String>,
}

/// Remote REST API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to
    pub base_url: Url,
    /// Per-request timeout
    pub timeout: Duration,
    /// Time-to-live for cached product and category reads (zero disables caching)
    pub cache_ttl: Duration,
}

/// Product listing configuration.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Products per page
    pub page_size: u32,
    /// Delay after the last keystroke before the search refetches
    pub search_debounce_ms: u32,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("expected 'pretty' or 'json', got '{other}'")),
        }
    }
}

impl StorefrontConfig {
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
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let api_base_url = parse_http_url("SHOPFRONT_API_BASE_URL", &env.required("SHOPFRONT_API_BASE_URL")?)?;
        let base_url = env.required("SHOPFRONT_BASE_URL")?;
        parse_http_url("SHOPFRONT_BASE_URL", &base_url)?;

        let page_size = env.parsed("SHOPFRONT_PAGE_SIZE", DEFAULT_PAGE_SIZE)?;
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::InvalidEnvVar(
                "SHOPFRONT_PAGE_SIZE".to_string(),
                format!("must be between 1 and {MAX_PAGE_SIZE}"),
            ));
        }

        Ok(Self {
            host: env.parsed("SHOPFRONT_HOST", IpAddr::V4(Ipv4Addr::LOCALHOST))?,
            port: env.parsed("SHOPFRONT_PORT", DEFAULT_PORT)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            static_dir: env
                .optional("SHOPFRONT_STATIC_DIR")
                .map_or_else(default_static_dir, PathBuf::from),
            api: ApiConfig {
                base_url: api_base_url,
                timeout: Duration::from_secs(
                    env.parsed("SHOPFRONT_API_TIMEOUT_SECS", DEFAULT_API_TIMEOUT_SECS)?,
                ),
                cache_ttl: Duration::from_secs(
                    env.parsed("SHOPFRONT_CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS)?,
                ),
            },
            catalog: CatalogConfig {
                page_size,
                search_debounce_ms: env
                    .parsed("SHOPFRONT_SEARCH_DEBOUNCE_MS", DEFAULT_SEARCH_DEBOUNCE_MS)?,
            },
            session_revalidate_interval: Duration::from_secs(env.parsed(
                "SHOPFRONT_SESSION_REVALIDATE_SECS",
                DEFAULT_SESSION_REVALIDATE_SECS,
            )?),
            log_format: env.parsed("SHOPFRONT_LOG_FORMAT", LogFormat::default())?,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
        })
    }

    /// Defaults for everything except the API location.
    ///
    /// Used by tests and tools that point the storefront at a known API.
    #[must_use]
    pub fn with_api_base_url(api_base_url: Url) -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
            base_url: format!("http://127.0.0.1:{DEFAULT_PORT}"),
            static_dir: default_static_dir(),
            api: ApiConfig {
                base_url: api_base_url,
                timeout: Duration::from_secs(DEFAULT_API_TIMEOUT_SECS),
                cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            },
            catalog: CatalogConfig {
                page_size: DEFAULT_PAGE_SIZE,
                search_debounce_ms: DEFAULT_SEARCH_DEBOUNCE_MS,
            },
            session_revalidate_interval: Duration::from_secs(DEFAULT_SESSION_REVALIDATE_SECS),
            log_format: LogFormat::Pretty,
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Variable lookup with the error reporting shared by every field.
struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Get a variable, treating blank values as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Parse a variable, falling back to `default` when unset.
    fn parsed<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key).map_or(Ok(default), |value| {
            value
                .parse::<T>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }
}

/// Parse an absolute http(s) URL.
fn parse_http_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be an absolute http or https URL".to_string(),
        ));
    }

    Ok(url)
}

fn default_static_dir() -> PathBuf {
    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/static"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<StorefrontConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        StorefrontConfig::from_lookup(|key| vars.get(key).cloned())
    }

    const REQUIRED: [(&str, &str); 2] = [
        ("SHOPFRONT_API_BASE_URL", "https://api.example.com/api"),
        ("SHOPFRONT_BASE_URL", "https://shop.example.com/"),
    ];

    #[test]
    fn test_defaults() {
        let config = load(&REQUIRED).unwrap();

        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert_eq!(config.base_url, "https://shop.example.com");
        assert_eq!(config.api.base_url.as_str(), "https://api.example.com/api");
        assert_eq!(config.api.timeout, Duration::from_secs(10));
        assert_eq!(config.api.cache_ttl, Duration::from_secs(60));
        assert_eq!(config.catalog.page_size, 12);
        assert_eq!(config.catalog.search_debounce_ms, 300);
        assert_eq!(config.session_revalidate_interval, Duration::from_secs(300));
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.sentry_dsn.is_none());
        assert!(config.secure_cookies());
    }

    #[test]
    fn test_missing_api_base_url() {
        let err = load(&[("SHOPFRONT_BASE_URL", "http://localhost:3000")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref key) if key == "SHOPFRONT_API_BASE_URL"));
    }

    #[test]
    fn test_blank_value_counts_as_missing() {
        let err = load(&[
            ("SHOPFRONT_API_BASE_URL", "   "),
            ("SHOPFRONT_BASE_URL", "http://localhost:3000"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(_)));
    }

    #[test]
    fn test_rejects_non_http_api_url() {
        let err = load(&[
            ("SHOPFRONT_API_BASE_URL", "ftp://api.example.com"),
            ("SHOPFRONT_BASE_URL", "http://localhost:3000"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "SHOPFRONT_API_BASE_URL"));
    }

    #[test]
    fn test_invalid_port() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("SHOPFRONT_PORT", "eighty"));
        let err = load(&vars).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "SHOPFRONT_PORT"));
    }

    #[test]
    fn test_page_size_bounds() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("SHOPFRONT_PAGE_SIZE", "0"));
        assert!(load(&vars).is_err());

        let mut vars = REQUIRED.to_vec();
        vars.push(("SHOPFRONT_PAGE_SIZE", "24"));
        assert_eq!(load(&vars).unwrap().catalog.page_size, 24);
    }

    #[test]
    fn test_overrides() {
        let mut vars = REQUIRED.to_vec();
        vars.extend([
            ("SHOPFRONT_HOST", "0.0.0.0"),
            ("SHOPFRONT_PORT", "8080"),
            ("SHOPFRONT_CACHE_TTL_SECS", "0"),
            ("SHOPFRONT_SEARCH_DEBOUNCE_MS", "500"),
            ("SHOPFRONT_LOG_FORMAT", "JSON"),
            ("SENTRY_DSN", "https://key@sentry.example.com/1"),
        ]);
        let config = load(&vars).unwrap();

        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8080");
        assert_eq!(config.api.cache_ttl, Duration::ZERO);
        assert_eq!(config.catalog.search_debounce_ms, 500);
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(config.sentry_dsn.is_some());
    }

    #[test]
    fn test_plain_http_disables_secure_cookies() {
        let config =
            StorefrontConfig::with_api_base_url(Url::parse("http://127.0.0.1:9000").unwrap());
        assert!(!config.secure_cookies());
    }
}
