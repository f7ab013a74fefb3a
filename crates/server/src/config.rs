//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CLINIC_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `CLINIC_JWT_SECRET` - Token signing secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `CLINIC_HOST` - Bind address (default: 127.0.0.1)
//! - `CLINIC_PORT` - Listen port (default: 8000)
//! - `CLINIC_JWT_ISSUER` - `iss` claim for issued tokens (default: clinic)
//! - `CLINIC_ACCESS_TOKEN_TTL_SECS` - Access token lifetime (default: 300)
//! - `CLINIC_REFRESH_TOKEN_TTL_SECS` - Refresh token lifetime (default: 86400)
//! - `CLINIC_TRUSTED_PROXY_HEADER` - Header carrying the client IP, set by a
//!   fronting proxy (e.g. `x-forwarded-for`). Unset means the peer address is used.
//! - `CLINIC_AUTH_RATE_LIMIT_PERIOD_SECS` - Seconds per replenished credential request (default: 6)
//! - `CLINIC_AUTH_RATE_LIMIT_BURST` - Credential requests allowed in a burst (default: 5)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag
//! - `SENTRY_SAMPLE_RATE` - Fraction of errors sent to Sentry (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Fraction of transactions traced (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::num::{NonZeroU32, NonZeroU64};
use std::time::Duration;

use axum::http::HeaderName;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_JWT_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Clinic server configuration.
#[derive(Debug, Clone)]
pub struct ClinicConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Bearer token settings
    pub auth: AuthConfig,
    /// Rate limiting for signup, login, and refresh
    pub rate_limit: RateLimitConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag (e.g. "production")
    pub sentry_environment: Option<String>,
    /// Fraction of error events sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

/// Bearer token settings.
///
/// Implements `Debug` manually to redact the signing secret.
#[derive(Clone)]
pub struct AuthConfig {
    /// HMAC secret used to sign and verify tokens
    pub jwt_secret: SecretString,
    /// Value of the `iss` claim
    pub issuer: String,
    /// Lifetime of access tokens
    pub access_ttl: Duration,
    /// Lifetime of refresh tokens
    pub refresh_ttl: Duration,
}

/// Per-IP rate limit on the credential routes.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Header holding the client IP, trusted only because a proxy sets it.
    /// `None` keys on the TCP peer address.
    pub trusted_proxy_header: Option<HeaderName>,
    /// Seconds to replenish one request
    pub period_secs: NonZeroU64,
    /// Requests allowed before the limiter engages
    pub burst: NonZeroU32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            trusted_proxy_header: None,
            period_secs: NonZeroU64::MIN.saturating_add(5),
            burst: NonZeroU32::MIN.saturating_add(4),
        }
    }
}

impl RateLimitConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let trusted_proxy_header = get_optional_env("CLINIC_TRUSTED_PROXY_HEADER")
            .map(|name| {
                HeaderName::try_from(name.trim()).map_err(|e| {
                    ConfigError::InvalidEnvVar(
                        "CLINIC_TRUSTED_PROXY_HEADER".to_string(),
                        e.to_string(),
                    )
                })
            })
            .transpose()?;

        Ok(Self {
            trusted_proxy_header,
            period_secs: parse_env_or_default("CLINIC_AUTH_RATE_LIMIT_PERIOD_SECS", "6")?,
            burst: parse_env_or_default("CLINIC_AUTH_RATE_LIMIT_BURST", "5")?,
        })
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("issuer", &self.issuer)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

impl ClinicConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the signing secret fails validation (length, placeholder detection,
    /// entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("CLINIC_DATABASE_URL")?;
        let host: IpAddr = parse_env_or_default("CLINIC_HOST", "127.0.0.1")?;
        let port: u16 = parse_env_or_default("CLINIC_PORT", "8000")?;
        let auth = AuthConfig::from_env()?;
        let rate_limit = RateLimitConfig::from_env()?;

        Ok(Self {
            database_url,
            host,
            port,
            auth,
            rate_limit,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env_or_default("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env_or_default("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl AuthConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let jwt_secret = get_validated_secret("CLINIC_JWT_SECRET")?;
        validate_secret_length(&jwt_secret, "CLINIC_JWT_SECRET")?;

        let access_secs: u64 = parse_env_or_default("CLINIC_ACCESS_TOKEN_TTL_SECS", "300")?;
        let refresh_secs: u64 = parse_env_or_default("CLINIC_REFRESH_TOKEN_TTL_SECS", "86400")?;
        if refresh_secs <= access_secs {
            return Err(ConfigError::InvalidEnvVar(
                "CLINIC_REFRESH_TOKEN_TTL_SECS".to_string(),
                "must be longer than the access token lifetime".to_string(),
            ));
        }

        Ok(Self {
            jwt_secret,
            issuer: get_env_or_default("CLINIC_JWT_ISSUER", "clinic"),
            access_ttl: Duration::from_secs(access_secs),
            refresh_ttl: Duration::from_secs(refresh_secs),
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

/// Load only the database URL, for tools that do not serve HTTP.
///
/// Reads `CLINIC_DATABASE_URL`, falling back to `DATABASE_URL`.
///
/// # Errors
///
/// Returns `ConfigError::MissingEnvVar` if neither is set.
pub fn database_url_from_env() -> Result<SecretString, ConfigError> {
    let _ = dotenvy::dotenv();
    get_database_url("CLINIC_DATABASE_URL")
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

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Validate that a signing secret meets minimum length requirements.
fn validate_secret_length(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_JWT_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_JWT_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_auth() -> AuthConfig {
        AuthConfig {
            jwt_secret: SecretString::from("kV9#qL2!xR7@mN4$wT8^zB1&cF5*hJ3%"),
            issuer: "clinic".to_string(),
            access_ttl: Duration::from_secs(300),
            refresh_ttl: Duration::from_secs(86400),
        }
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let err = validate_secret_strength("your-jwt-key-goes-here", "TEST_VAR").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
        assert!(validate_secret_strength("changeme123", "TEST_VAR").is_err());
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let err =
            validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        assert!(validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR").is_ok());
    }

    #[test]
    fn test_validate_secret_length() {
        assert!(validate_secret_length(&SecretString::from("short"), "TEST_JWT").is_err());
        assert!(validate_secret_length(&SecretString::from("a".repeat(32)), "TEST_JWT").is_ok());
    }

    #[test]
    fn test_parse_env_or_default_uses_default() {
        let port: u16 = parse_env_or_default("CLINIC_TEST_UNSET_PORT", "8000").unwrap();
        assert_eq!(port, 8000);
        let bad = parse_env_or_default::<u16>("CLINIC_TEST_UNSET_PORT", "eight");
        assert!(matches!(bad, Err(ConfigError::InvalidEnvVar(_, _))));
    }

    #[test]
    fn test_socket_addr() {
        let config = ClinicConfig {
            database_url: SecretString::from("postgres://localhost/clinic"),
            host: "127.0.0.1".parse().unwrap(),
            port: 8000,
            auth: test_auth(),
            rate_limit: RateLimitConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 8000);
    }

    #[test]
    fn test_rate_limit_defaults() {
        let limits = RateLimitConfig::default();
        assert!(limits.trusted_proxy_header.is_none());
        assert_eq!(limits.period_secs.get(), 6);
        assert_eq!(limits.burst.get(), 5);
    }

    #[test]
    fn test_zero_burst_is_rejected() {
        let bad = "0".parse::<NonZeroU32>();
        assert!(bad.is_err());
        let parsed = parse_env_or_default::<NonZeroU32>("CLINIC_TEST_UNSET_BURST", "0");
        assert!(matches!(parsed, Err(ConfigError::InvalidEnvVar(_, _))));
    }

    #[test]
    fn test_auth_config_debug_redacts_secret() {
        let debug_output = format!("{:?}", test_auth());

        assert!(debug_output.contains("clinic"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("kV9#qL2"));
    }
}
