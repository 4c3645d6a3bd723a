//! services/client/src/config.rs
//!
//! Defines the client's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub api_base_url: String,
    pub log_level: Level,
    pub session_path: PathBuf,
    pub request_timeout: Duration,
    /// Allow the local credential table when the backend is unreachable.
    /// Only honoured by builds with the `dev-fallback` feature.
    pub dev_fallback_login: bool,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let api_base_url = std::env::var("INFRADOC_API_URL")
            .unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let api_base_url = api_base_url.trim().trim_end_matches('/').to_string();
        if !(api_base_url.starts_with("http://") || api_base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue(
                "INFRADOC_API_URL".to_string(),
                format!("'{}' is not an http(s) URL", api_base_url),
            ));
        }

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let session_path = match std::env::var("INFRADOC_SESSION_PATH") {
            Ok(path) => PathBuf::from(path),
            Err(_) => default_session_path()?,
        };

        let request_timeout = match std::env::var("INFRADOC_TIMEOUT_SECS") {
            Ok(raw) => raw.trim().parse::<u64>().map(Duration::from_secs).map_err(|e| {
                ConfigError::InvalidValue("INFRADOC_TIMEOUT_SECS".to_string(), e.to_string())
            })?,
            Err(_) => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let dev_fallback_login = std::env::var("INFRADOC_DEV_FALLBACK")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            api_base_url,
            log_level,
            session_path,
            request_timeout,
            dev_fallback_login,
        })
    }
}

fn default_session_path() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join("infradoc").join("session.json"))
        .ok_or_else(|| ConfigError::MissingVar("INFRADOC_SESSION_PATH".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "INFRADOC_API_URL",
        "RUST_LOG",
        "INFRADOC_SESSION_PATH",
        "INFRADOC_TIMEOUT_SECS",
        "INFRADOC_DEV_FALLBACK",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn explicit_values_are_used() {
        clear_env();
        std::env::set_var("INFRADOC_API_URL", "https://docs.example.com/api/");
        std::env::set_var("RUST_LOG", "debug");
        std::env::set_var("INFRADOC_SESSION_PATH", "/tmp/infradoc-session.json");
        std::env::set_var("INFRADOC_TIMEOUT_SECS", "5");
        std::env::set_var("INFRADOC_DEV_FALLBACK", "true");

        let config = Config::from_env().unwrap();
        assert_eq!(config.api_base_url, "https://docs.example.com/api");
        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(config.session_path, PathBuf::from("/tmp/infradoc-session.json"));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert!(config.dev_fallback_login);
        clear_env();
    }

    #[test]
    #[serial]
    fn defaults_apply_when_unset() {
        clear_env();
        std::env::set_var("INFRADOC_SESSION_PATH", "/tmp/s.json");
        let config = Config::from_env().unwrap();
        assert_eq!(config.api_base_url, DEFAULT_API_URL);
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.request_timeout, Duration::from_secs(60));
        assert!(!config.dev_fallback_login);
        clear_env();
    }

    #[test]
    #[serial]
    fn invalid_values_are_rejected() {
        clear_env();
        std::env::set_var("INFRADOC_SESSION_PATH", "/tmp/s.json");
        std::env::set_var("INFRADOC_TIMEOUT_SECS", "soon");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::InvalidValue(var, _)) if var == "INFRADOC_TIMEOUT_SECS"
        ));
        std::env::remove_var("INFRADOC_TIMEOUT_SECS");
        std::env::set_var("INFRADOC_API_URL", "localhost:5000");
        assert!(Config::from_env().is_err());
        clear_env();
    }
}
