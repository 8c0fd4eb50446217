//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `APPWRITE_ENDPOINT` - Base URL of the storage platform REST API
//! - `APPWRITE_PROJECT_ID` - Platform project identifier
//! - `APPWRITE_API_KEY` - Server API key (admin scope, high entropy)
//! - `APPWRITE_DATABASE_ID` - Database holding the app collections
//! - `APPWRITE_USERS_COLLECTION_ID` - Collection of user records
//! - `APPWRITE_FILES_COLLECTION_ID` - Collection of file records
//! - `APPWRITE_BUCKET_ID` - Bucket holding uploaded file blobs
//!
//! ## Optional
//! - `STRATUS_HOST` - Bind address (default: 127.0.0.1)
//! - `STRATUS_PORT` - Listen port (default: 3000)
//! - `STRATUS_BASE_URL` - Public URL for the server (default: http://localhost:3000)
//! - `STRATUS_AVATAR_PLACEHOLDER_URL` - Avatar assigned to new user records
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Avatar assigned to user records when no other placeholder is configured.
const DEFAULT_AVATAR_PLACEHOLDER_URL: &str =
    "https://commons.wikimedia.org/wiki/File:Profile_avatar_placeholder_large.png";

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

/// Stratus server configuration.
#[derive(Debug, Clone)]
pub struct StratusConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the server
    pub base_url: String,
    /// Avatar URL assigned to newly created user records
    pub avatar_placeholder_url: String,
    /// Storage platform configuration
    pub platform: PlatformConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Storage platform REST API configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct PlatformConfig {
    /// Base URL of the platform REST API (e.g., https://cloud.appwrite.io/v1)
    pub endpoint: String,
    /// Platform project identifier
    pub project_id: String,
    /// Server API key (admin scope)
    pub api_key: SecretString,
    /// Database holding the app collections
    pub database_id: String,
    /// Collection of user records
    pub users_collection_id: String,
    /// Collection of file records
    pub files_collection_id: String,
    /// Bucket holding uploaded file blobs
    pub bucket_id: String,
}

impl std::fmt::Debug for PlatformConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformConfig")
            .field("endpoint", &self.endpoint)
            .field("project_id", &self.project_id)
            .field("api_key", &"[REDACTED]")
            .field("database_id", &self.database_id)
            .field("users_collection_id", &self.users_collection_id)
            .field("files_collection_id", &self.files_collection_id)
            .field("bucket_id", &self.bucket_id)
            .finish()
    }
}

impl StratusConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the API key fails validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("STRATUS_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("STRATUS_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("STRATUS_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("STRATUS_PORT".to_string(), e.to_string()))?;
        let base_url = get_env_or_default("STRATUS_BASE_URL", "http://localhost:3000");
        let avatar_placeholder_url = get_env_or_default(
            "STRATUS_AVATAR_PLACEHOLDER_URL",
            DEFAULT_AVATAR_PLACEHOLDER_URL,
        );

        let platform = PlatformConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            host,
            port,
            base_url,
            avatar_placeholder_url,
            platform,
            sentry_dsn,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl PlatformConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            endpoint: get_required_env("APPWRITE_ENDPOINT")?,
            project_id: get_required_env("APPWRITE_PROJECT_ID")?,
            api_key: get_validated_secret("APPWRITE_API_KEY")?,
            database_id: get_required_env("APPWRITE_DATABASE_ID")?,
            users_collection_id: get_required_env("APPWRITE_USERS_COLLECTION_ID")?,
            files_collection_id: get_required_env("APPWRITE_FILES_COLLECTION_ID")?,
            bucket_id: get_required_env("APPWRITE_BUCKET_ID")?,
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

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
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

    // Check blocklist
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Check entropy (real secrets like API keys have high entropy)
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

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        // All same character = 0 entropy
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        // "ab" has entropy of 1 bit per char (50% a, 50% b)
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_shannon_entropy_high() {
        // Random-looking string should have high entropy
        let entropy = shannon_entropy("aB3$xY9!mK2@nL5#");
        assert!(entropy > 3.3);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-api-key-here", "TEST_VAR");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_changeme() {
        let result = validate_secret_strength("changeme123", "TEST_VAR");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        // High-entropy random string
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_socket_addr() {
        let config = StratusConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            avatar_placeholder_url: DEFAULT_AVATAR_PLACEHOLDER_URL.to_string(),
            platform: PlatformConfig {
                endpoint: "https://cloud.appwrite.io/v1".to_string(),
                project_id: "stratus-test".to_string(),
                api_key: SecretString::from("k3y"),
                database_id: "main".to_string(),
                users_collection_id: "users".to_string(),
                files_collection_id: "files".to_string(),
                bucket_id: "uploads".to_string(),
            },
            sentry_dsn: None,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_platform_config_debug_redacts_api_key() {
        let config = PlatformConfig {
            endpoint: "https://cloud.appwrite.io/v1".to_string(),
            project_id: "stratus-test".to_string(),
            api_key: SecretString::from("super_secret_api_key"),
            database_id: "main".to_string(),
            users_collection_id: "users".to_string(),
            files_collection_id: "files".to_string(),
            bucket_id: "uploads".to_string(),
        };

        let debug_output = format!("{config:?}");

        // Public fields should be visible
        assert!(debug_output.contains("cloud.appwrite.io"));
        assert!(debug_output.contains("stratus-test"));

        // The API key should be redacted
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_api_key"));
    }
}
