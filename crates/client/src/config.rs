//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional:
//! - `ABA_MARKET_API_URL` - Base URL of the storefront API
//!   (default: `http://localhost:8080/api`)
//! - `ABA_MARKET_IDENTITY_FILE` - Path of the persisted identity file
//!   (default: `.aba-market/identity.json`)
//! - `ABA_MARKET_TIMEOUT_SECS` - Request timeout in seconds
//!   (default: transport default, i.e. none)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:8080/api";
const DEFAULT_IDENTITY_FILE: &str = ".aba-market/identity.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the storefront API, including the `/api` prefix.
    pub base_url: Url,
    /// Where the session identity (token, guest cart id) is persisted.
    pub identity_path: PathBuf,
    /// Per-request timeout. `None` leaves the transport default in place.
    pub request_timeout: Option<Duration>,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a provided value does not parse.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let raw_url =
            lookup("ABA_MARKET_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let base_url = Url::parse(&raw_url).map_err(|e| {
            ConfigError::InvalidEnvVar("ABA_MARKET_API_URL".to_string(), e.to_string())
        })?;

        let identity_path = lookup("ABA_MARKET_IDENTITY_FILE")
            .map_or_else(|| PathBuf::from(DEFAULT_IDENTITY_FILE), PathBuf::from);

        let request_timeout = lookup("ABA_MARKET_TIMEOUT_SECS")
            .map(|raw| {
                raw.parse::<u64>().map(Duration::from_secs).map_err(|e| {
                    ConfigError::InvalidEnvVar(
                        "ABA_MARKET_TIMEOUT_SECS".to_string(),
                        e.to_string(),
                    )
                })
            })
            .transpose()?;

        Ok(Self {
            base_url,
            identity_path,
            request_timeout,
        })
    }

    /// Create a configuration for a known base URL, with defaults elsewhere.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            identity_path: PathBuf::from(DEFAULT_IDENTITY_FILE),
            request_timeout: None,
        }
    }

    /// Override the identity file path.
    #[must_use]
    pub fn with_identity_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.identity_path = path.into();
        self
    }

    /// Override the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// The base URL as a string without a trailing slash, ready for path
    /// concatenation.
    #[must_use]
    pub fn api_root(&self) -> String {
        self.base_url.as_str().trim_end_matches('/').to_string()
    }
}
