//! Jingle Configuration Management
//!
//! Handles configuration from environment variables and TOML files
//! with sensible defaults for development.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Authentication core configuration
    pub auth: AuthConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().override_from(|key| std::env::var(key).ok())
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(self) -> Result<Self, ConfigError> {
        self.override_from(|key| std::env::var(key).ok())
    }

    /// Apply every recognised variable that `lookup` yields on top of `self`
    pub fn override_from<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server
        if let Some(host) = lookup("API_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("API_PORT") {
            self.server.port = parse_value("API_PORT", port)?;
        }

        // Auth
        if let Some(ttl) = lookup("AUTH_TOKEN_TTL_MS") {
            self.auth.token_ttl_ms = parse_value("AUTH_TOKEN_TTL_MS", ttl)?;
        }
        if let Some(workers) = lookup("AUTH_HASH_WORKERS") {
            self.auth.hash_workers = parse_value("AUTH_HASH_WORKERS", workers)?;
        }
        if let Some(depth) = lookup("AUTH_HASH_QUEUE_DEPTH") {
            self.auth.hash_queue_depth = parse_value("AUTH_HASH_QUEUE_DEPTH", depth)?;
        }
        if let Some(scheme) = lookup("AUTH_SALT_SCHEME") {
            self.auth.salt_scheme = scheme.parse()?;
        }
        if let Some(interval) = lookup("AUTH_EVICTION_INTERVAL_SECS") {
            self.auth.eviction_interval_secs = parse_value("AUTH_EVICTION_INTERVAL_SECS", interval)?;
        }

        // Logging
        if let Some(level) = lookup("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(json) = lookup("LOG_JSON") {
            self.logging.json_format = parse_value("LOG_JSON", json)?;
        }

        self.auth.validate()?;
        Ok(self)
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value,
    })
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Authentication core configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Lifetime of an issued auth key in milliseconds
    pub token_ttl_ms: u64,

    /// Password derivations allowed to run at the same time
    pub hash_workers: usize,

    /// Derivations allowed to wait for a worker before callers are turned away
    pub hash_queue_depth: usize,

    /// How new password hashes are salted
    pub salt_scheme: SaltScheme,

    /// Seconds between sweeps of expired auth keys (0 disables the sweep)
    pub eviction_interval_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_ttl_ms: 20 * 60 * 1000, // 20 minutes
            hash_workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            hash_queue_depth: 64,
            salt_scheme: SaltScheme::Legacy,
            eviction_interval_secs: 300,
        }
    }
}

impl AuthConfig {
    /// Token lifetime as a duration
    pub fn token_ttl(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.token_ttl_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.hash_workers == 0 {
            return Err(ConfigError::InvalidValue {
                key: "AUTH_HASH_WORKERS".to_string(),
                value: "0".to_string(),
            });
        }
        if self.token_ttl_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "AUTH_TOKEN_TTL_MS".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

/// Salt policy for newly stored password hashes
///
/// `Legacy` derives the salt from the password itself and produces the bare
/// 16-byte key, which is what every existing account was stored with.
/// `Random` draws a fresh 20-byte salt per credential and stores it in front
/// of the key. Verification accepts both layouts regardless of this setting,
/// so switching to `Random` migrates accounts as their passwords change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaltScheme {
    #[default]
    Legacy,
    Random,
}

impl std::str::FromStr for SaltScheme {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "legacy" => Ok(Self::Legacy),
            "random" => Ok(Self::Random),
            _ => Err(ConfigError::InvalidValue {
                key: "AUTH_SALT_SCHEME".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for SaltScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Legacy => write!(f, "legacy"),
            Self::Random => write!(f, "random"),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.auth.token_ttl_ms, 1_200_000);
        assert_eq!(config.auth.salt_scheme, SaltScheme::Legacy);
        assert!(config.auth.hash_workers >= 1);
    }

    #[test]
    fn test_env_override() {
        let env = vars(&[
            ("API_PORT", "9090"),
            ("AUTH_TOKEN_TTL_MS", "1000"),
            ("AUTH_SALT_SCHEME", "Random"),
            ("LOG_JSON", "true"),
        ]);
        let config = AppConfig::default()
            .override_from(|k| env.get(k).cloned())
            .unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.auth.token_ttl(), std::time::Duration::from_millis(1000));
        assert_eq!(config.auth.salt_scheme, SaltScheme::Random);
        assert!(config.logging.json_format);
    }

    #[test]
    fn test_invalid_port_rejected() {
        let env = vars(&[("API_PORT", "not-a-port")]);
        let err = AppConfig::default()
            .override_from(|k| env.get(k).cloned())
            .unwrap_err();

        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "API_PORT"));
    }

    #[test]
    fn test_zero_workers_rejected() {
        let env = vars(&[("AUTH_HASH_WORKERS", "0")]);
        assert!(AppConfig::default()
            .override_from(|k| env.get(k).cloned())
            .is_err());
    }

    #[test]
    fn test_salt_scheme_parse() {
        assert_eq!("legacy".parse::<SaltScheme>().unwrap(), SaltScheme::Legacy);
        assert_eq!("RANDOM".parse::<SaltScheme>().unwrap(), SaltScheme::Random);
        assert!("sha256".parse::<SaltScheme>().is_err());
    }

    #[test]
    fn test_partial_toml() {
        let config: AppConfig = toml::from_str(
            r#"
            [auth]
            token_ttl_ms = 5000
            salt_scheme = "random"
            "#,
        )
        .unwrap();

        assert_eq!(config.auth.token_ttl_ms, 5000);
        assert_eq!(config.auth.salt_scheme, SaltScheme::Random);
        assert_eq!(config.auth.hash_queue_depth, 64);
        assert_eq!(config.server.port, 8080);
    }
}
