//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `STOREFRONT_BASE_URL` - Public URL of this service
//! - `COMMERCE_BACKEND_URL` - Commerce backend base URL (e.g., <http://localhost:9000>)
//! - `COMMERCE_PUBLISHABLE_KEY` - Store API publishable key
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 9000)
//! - `APP_ENV` - `development` or `production` (default: development)
//! - `REVALIDATE_URL` - Rendering layer base URL (default: <http://localhost:3000>)
//! - `REVALIDATE_SECRET` - Shared secret for revalidation and product hooks
//! - `CONTENT_CACHE_TTL_SECS` - Content cache revalidate window (default: 3600)
//! - `RESEND_API_KEY` - Transactional email provider API key
//! - `EMAIL_FROM` - Sender address (default: The Joy Junction <hello@thejoyjunction.com>)
//! - `STORE_INBOX_EMAIL` - Where contact/newsletter notifications go
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use joy_junction_core::Email;

/// Default upstream used when `REVALIDATE_URL` is not set.
pub const DEFAULT_REVALIDATE_URL: &str = "http://localhost:3000";

/// Public storefront linked from customer emails when `SHOP_URL` is not set.
pub const DEFAULT_SHOP_URL: &str = "https://thejoyjunction.com";

const MIN_REVALIDATE_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
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

/// Deployment environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_lowercase().as_str() {
            "development" | "dev" | "local" | "test" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(ConfigError::InvalidEnvVar(
                "APP_ENV".to_string(),
                format!("expected 'development' or 'production', got '{other}'"),
            )),
        }
    }

    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for this service
    pub base_url: String,
    /// Deployment environment (gates dev-only endpoints)
    pub environment: Environment,
    /// Rendering layer revalidation settings
    pub revalidation: RevalidationConfig,
    /// Commerce backend store API settings
    pub commerce: CommerceConfig,
    /// Transactional email settings (disabled when no API key is set)
    pub email: Option<EmailConfig>,
    /// Content cache revalidate window
    pub content_cache_ttl: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate
    pub sentry_sample_rate: f32,
    /// Sentry transaction sample rate
    pub sentry_traces_sample_rate: f32,
}

/// Revalidation proxy configuration.
///
/// Implements `Debug` manually to redact the secret.
#[derive(Clone)]
pub struct RevalidationConfig {
    /// Rendering layer base URL. `None` means the default is used.
    pub url: Option<String>,
    /// Shared secret sent upstream and required on inbound internal calls
    pub secret: Option<SecretString>,
}

impl std::fmt::Debug for RevalidationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevalidationConfig")
            .field("url", &self.url)
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Commerce backend store API configuration.
#[derive(Debug, Clone)]
pub struct CommerceConfig {
    /// Backend base URL without trailing slash
    pub backend_url: String,
    /// Publishable API key (safe to expose in browser)
    pub publishable_key: String,
}

/// Transactional email configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct EmailConfig {
    /// Provider API key
    pub api_key: SecretString,
    /// Sender, e.g. `The Joy Junction <hello@thejoyjunction.com>`
    pub from_address: String,
    /// Store inbox receiving contact and newsletter notifications
    pub store_inbox: Email,
    /// Public shop address linked from customer-facing emails
    pub shop_url: String,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("api_key", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .field("store_inbox", &self.store_inbox)
            .field("shop_url", &self.shop_url)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("STOREFRONT_DATABASE_URL")?;
        let host = get_env_or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("STOREFRONT_PORT", "9000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), e.to_string())
            })?;
        let base_url = get_required_url("STOREFRONT_BASE_URL")?;
        let environment = Environment::parse(&get_env_or_default("APP_ENV", "development"))?;

        let revalidation = RevalidationConfig::from_env()?;
        let commerce = CommerceConfig::from_env()?;
        let email = EmailConfig::from_env()?;

        let content_cache_ttl = Duration::from_secs(
            get_env_or_default("CONTENT_CACHE_TTL_SECS", "3600")
                .parse::<u64>()
                .map_err(|e| {
                    ConfigError::InvalidEnvVar("CONTENT_CACHE_TTL_SECS".to_string(), e.to_string())
                })?,
        );

        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_rate("SENTRY_SAMPLE_RATE", 1.0)?;
        let sentry_traces_sample_rate = get_rate("SENTRY_TRACES_SAMPLE_RATE", 0.0)?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            environment,
            revalidation,
            commerce,
            email,
            content_cache_ttl,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl RevalidationConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let url = match get_optional_env("REVALIDATE_URL") {
            Some(raw) => Some(parse_url("REVALIDATE_URL", &raw)?),
            None => None,
        };

        let secret = match get_optional_env("REVALIDATE_SECRET") {
            Some(raw) => {
                validate_secret_strength(&raw, "REVALIDATE_SECRET")?;
                let secret = SecretString::from(raw);
                validate_secret_length(&secret, "REVALIDATE_SECRET")?;
                Some(secret)
            }
            None => None,
        };

        Ok(Self { url, secret })
    }

    /// Upstream base URL, falling back to [`DEFAULT_REVALIDATE_URL`].
    #[must_use]
    pub fn url_or_default(&self) -> &str {
        self.url.as_deref().unwrap_or(DEFAULT_REVALIDATE_URL)
    }
}

impl CommerceConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            backend_url: get_required_url("COMMERCE_BACKEND_URL")?,
            publishable_key: get_required_env("COMMERCE_PUBLISHABLE_KEY")?,
        })
    }
}

impl EmailConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(api_key) = get_optional_env("RESEND_API_KEY") else {
            return Ok(None);
        };
        validate_secret_strength(&api_key, "RESEND_API_KEY")?;

        let from_address = get_env_or_default(
            "EMAIL_FROM",
            "The Joy Junction <hello@thejoyjunction.com>",
        );
        let store_inbox = Email::normalize(&get_env_or_default(
            "STORE_INBOX_EMAIL",
            "hello@thejoyjunction.com",
        ))
        .map_err(|e| ConfigError::InvalidEnvVar("STORE_INBOX_EMAIL".to_string(), e.to_string()))?;
        let shop_url = parse_url("SHOP_URL", &get_env_or_default("SHOP_URL", DEFAULT_SHOP_URL))?;

        Ok(Some(Self {
            api_key: SecretString::from(api_key),
            from_address,
            store_inbox,
            shop_url,
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required URL, validated and stripped of any trailing slash.
fn get_required_url(key: &str) -> Result<String, ConfigError> {
    let raw = get_required_env(key)?;
    parse_url(key, &raw)
}

fn parse_url(key: &str, raw: &str) -> Result<String, ConfigError> {
    let url = url::Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(url.as_str().trim_end_matches('/').to_string())
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

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Get a sample rate in `0.0..=1.0`.
fn get_rate(key: &str, default: f32) -> Result<f32, ConfigError> {
    let Some(raw) = get_optional_env(key) else {
        return Ok(default);
    };
    let rate = raw
        .parse::<f32>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !(0.0..=1.0).contains(&rate) {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("must be between 0.0 and 1.0 (got {rate})"),
        ));
    }
    Ok(rate)
}

/// Validate that the revalidation secret meets minimum length requirements.
fn validate_secret_length(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_REVALIDATE_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_REVALIDATE_SECRET_LENGTH,
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

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
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

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    /// Configuration usable by unit tests (no secrets, no email).
    pub(crate) fn test_config(environment: Environment) -> StorefrontConfig {
        StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/joy_junction_test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 9000,
            base_url: "http://localhost:9000".to_string(),
            environment,
            revalidation: RevalidationConfig {
                url: None,
                secret: None,
            },
            commerce: CommerceConfig {
                backend_url: "http://127.0.0.1:1".to_string(),
                publishable_key: "pk_test".to_string(),
            },
            email: None,
            content_cache_ttl: Duration::from_secs(60),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        // "ab" has entropy of 1 bit per char (50% a, 50% b)
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_shannon_entropy_high() {
        let entropy = shannon_entropy("aB3$xY9!mK2@nL5#");
        assert!(entropy > 3.3);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-api-key-here", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_secret_length() {
        assert!(validate_secret_length(&SecretString::from("short"), "X").is_err());
        assert!(validate_secret_length(&SecretString::from("a".repeat(32)), "X").is_ok());
    }

    #[test]
    fn test_environment_parse() {
        assert_eq!(
            Environment::parse("Production").unwrap(),
            Environment::Production
        );
        assert_eq!(
            Environment::parse("dev").unwrap(),
            Environment::Development
        );
        assert!(Environment::parse("staging").is_err());
        assert!(Environment::Production.is_production());
    }

    #[test]
    fn test_parse_url_strips_trailing_slash() {
        assert_eq!(
            parse_url("X", "https://shop.example.com/").unwrap(),
            "https://shop.example.com"
        );
        assert!(parse_url("X", "ftp://shop.example.com").is_err());
        assert!(parse_url("X", "not a url").is_err());
    }

    #[test]
    fn test_revalidation_url_default() {
        let config = RevalidationConfig {
            url: None,
            secret: None,
        };
        assert_eq!(config.url_or_default(), DEFAULT_REVALIDATE_URL);
    }

    #[test]
    fn test_socket_addr() {
        let config = test_config(Environment::Development);
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 9000);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let revalidation = RevalidationConfig {
            url: Some("http://render:3000".to_string()),
            secret: Some(SecretString::from("super_secret_revalidate_token")),
        };
        let email = EmailConfig {
            api_key: SecretString::from("re_super_secret_api_key"),
            from_address: "shop@example.com".to_string(),
            store_inbox: Email::parse("inbox@example.com").unwrap(),
            shop_url: DEFAULT_SHOP_URL.to_string(),
        };

        let debug_output = format!("{revalidation:?} {email:?}");

        assert!(debug_output.contains("http://render:3000"));
        assert!(debug_output.contains("inbox@example.com"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_revalidate_token"));
        assert!(!debug_output.contains("re_super_secret_api_key"));
    }
}
