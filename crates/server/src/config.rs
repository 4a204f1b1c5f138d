//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `FIREBASE_PROJECT_ID` - Identity issuer project (token audience)
//! - `VOLUNTEER_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`; not needed when `VOLUNTEER_STORE=memory`)
//!
//! ## Optional
//! - `VOLUNTEER_STORE` - `postgres` (default) or `memory`
//! - `VOLUNTEER_DATABASE_MAX_CONNECTIONS` - Pool size (default: 10)
//! - `VOLUNTEER_HOST` - Bind address (default: 127.0.0.1)
//! - `VOLUNTEER_PORT` - Listen port (falls back to `PORT`, default: 5000)
//! - `FIREBASE_JWKS_URL` - Issuer signing key set
//! - `VOLUNTEER_CORS_ORIGINS` - Comma-separated allowed origins (default: any)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Google's public key set for Firebase ID tokens.
pub const DEFAULT_FIREBASE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

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
pub struct ServerConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Where posts and volunteer requests are stored
    pub store: StoreConfig,
    /// Identity issuer configuration
    pub identity: IdentityConfig,
    /// Allowed CORS origins (`None` allows any origin)
    pub cors_origins: Option<Vec<String>>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
    /// Fraction of error events sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions sent to Sentry
    pub sentry_traces_sample_rate: f32,
}

/// Storage backend selection.
///
/// `Debug` never prints the database URL; `SecretString` redacts it.
#[derive(Debug, Clone)]
pub enum StoreConfig {
    /// `PostgreSQL` via a sqlx pool.
    Postgres {
        /// Connection URL (contains password)
        database_url: SecretString,
        /// Maximum pooled connections
        max_connections: u32,
    },
    /// Process-local store; contents are lost on restart.
    Memory,
}

/// Identity issuer (Firebase Authentication) configuration.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    /// Project ID; expected `aud` claim and issuer suffix
    pub project_id: String,
    /// URL of the issuer's JSON Web Key Set
    pub jwks_url: Url,
}

impl IdentityConfig {
    /// Expected `iss` claim for tokens minted for this project.
    #[must_use]
    pub fn issuer(&self) -> String {
        format!("https://securetoken.google.com/{}", self.project_id)
    }
}

impl ServerConfig {
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

        let host = parse_env("VOLUNTEER_HOST", &get_env_or_default("VOLUNTEER_HOST", "127.0.0.1"))?;
        let port_raw = get_optional_env("VOLUNTEER_PORT")
            .or_else(|| get_optional_env("PORT"))
            .unwrap_or_else(|| "5000".to_string());
        let port = parse_env("VOLUNTEER_PORT", &port_raw)?;

        let store = StoreConfig::from_env()?;
        let identity = IdentityConfig::from_env()?;
        let cors_origins = get_optional_env("VOLUNTEER_CORS_ORIGINS").map(|raw| split_list(&raw));

        Ok(Self {
            host,
            port,
            store,
            identity,
            cors_origins,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env(
                "SENTRY_SAMPLE_RATE",
                &get_env_or_default("SENTRY_SAMPLE_RATE", "1.0"),
            )?,
            sentry_traces_sample_rate: parse_env(
                "SENTRY_TRACES_SAMPLE_RATE",
                &get_env_or_default("SENTRY_TRACES_SAMPLE_RATE", "0.0"),
            )?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Loopback configuration on an ephemeral port with the in-memory store
    /// and no error tracking.
    #[must_use]
    pub fn local(identity: IdentityConfig) -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            store: StoreConfig::Memory,
            identity,
            cors_origins: None,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }
}

impl StoreConfig {
    fn from_env() -> Result<Self, ConfigError> {
        match get_env_or_default("VOLUNTEER_STORE", "postgres").as_str() {
            "postgres" => Ok(Self::Postgres {
                database_url: get_database_url("VOLUNTEER_DATABASE_URL")?,
                max_connections: parse_env(
                    "VOLUNTEER_DATABASE_MAX_CONNECTIONS",
                    &get_env_or_default("VOLUNTEER_DATABASE_MAX_CONNECTIONS", "10"),
                )?,
            }),
            "memory" => Ok(Self::Memory),
            other => Err(ConfigError::InvalidEnvVar(
                "VOLUNTEER_STORE".to_string(),
                format!("expected `postgres` or `memory`, got `{other}`"),
            )),
        }
    }
}

impl IdentityConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let project_id = get_required_env("FIREBASE_PROJECT_ID")?;
        if project_id.trim().is_empty() {
            return Err(ConfigError::InvalidEnvVar(
                "FIREBASE_PROJECT_ID".to_string(),
                "must not be empty".to_string(),
            ));
        }
        let jwks_url = Url::parse(&get_env_or_default("FIREBASE_JWKS_URL", DEFAULT_FIREBASE_JWKS_URL))
            .map_err(|e| ConfigError::InvalidEnvVar("FIREBASE_JWKS_URL".to_string(), e.to_string()))?;

        Ok(Self {
            project_id,
            jwks_url,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
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
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse a raw value, reporting failures against `key`.
fn parse_env<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Split a comma-separated list, dropping blanks.
fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn identity() -> IdentityConfig {
        IdentityConfig {
            project_id: "volunteer-board-dev".to_string(),
            jwks_url: Url::parse(DEFAULT_FIREBASE_JWKS_URL).unwrap(),
        }
    }

    #[test]
    fn test_parse_env_reports_key() {
        let err = parse_env::<u16>("VOLUNTEER_PORT", "not-a-port").unwrap_err();
        match err {
            ConfigError::InvalidEnvVar(key, _) => assert_eq!(key, "VOLUNTEER_PORT"),
            ConfigError::MissingEnvVar(_) => panic!("wrong variant"),
        }
    }

    #[test]
    fn test_parse_env_trims() {
        let port: u16 = parse_env("VOLUNTEER_PORT", " 5000 ").unwrap();
        assert_eq!(port, 5000);
    }

    #[test]
    fn test_split_list() {
        assert_eq!(
            split_list("https://a.example, ,https://b.example,"),
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
        assert!(split_list("").is_empty());
    }

    #[test]
    fn test_issuer() {
        assert_eq!(
            identity().issuer(),
            "https://securetoken.google.com/volunteer-board-dev"
        );
    }

    #[test]
    fn test_socket_addr() {
        let config = ServerConfig {
            port: 5000,
            ..ServerConfig::local(identity())
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 5000);
        assert!(matches!(config.store, StoreConfig::Memory));
    }

    #[test]
    fn test_store_debug_redacts_database_url() {
        let store = StoreConfig::Postgres {
            database_url: SecretString::from("postgres://board:hunter2@db/board"),
            max_connections: 10,
        };

        let debug_output = format!("{store:?}");
        assert!(!debug_output.contains("hunter2"));
        assert!(debug_output.contains("max_connections"));
    }
}
