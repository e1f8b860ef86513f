//! # Configuration Management
//!
//! Configuration is read from environment variables. A `.env` file is
//! loaded by the binary before this module reads anything.
//!
//! | Variable | Meaning |
//! |---|---|
//! | `APIFOX_ENABLED` | Force capture on or off |
//! | `APP_ENV` | Capture is on by default when this is `testing` |
//! | `APIFOX_PROJECT_ID` | Project to import into |
//! | `APIFOX_ACCESS_TOKEN` | Personal access token |
//! | `APIFOX_BASE_URL` | Import API base URL |
//! | `APIFOX_API_VERSION` | `X-Apifox-Version` header value |
//! | `APIFOX_TIMEOUT_SECONDS` | Request timeout |
//! | `APP_NAME` / `APP_VERSION` | Document title and version |
//! | `APIFOX_LOG_LEVEL` / `APIFOX_LOG_JSON` | Logging |

pub mod settings;

pub use settings::{ApiFoxConfig, ObservabilityConfig, DEFAULT_API_VERSION, DEFAULT_BASE_URL};

use crate::errors::{Error, Result};

const TESTING_ENVIRONMENT: &str = "testing";

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::config(format!("Invalid boolean for {}: '{}'", name, other))),
    }
}

impl ApiFoxConfig {
    /// Create configuration from environment variables.
    ///
    /// Missing credentials are not an error here: a disabled setup never
    /// needs them, and an enabled one fails when it first pushes.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let enabled = match env_var("APIFOX_ENABLED") {
            Some(value) => parse_bool("APIFOX_ENABLED", &value)?,
            None => env_var("APP_ENV").is_some_and(|env| env == TESTING_ENVIRONMENT),
        };

        let timeout_seconds = match env_var("APIFOX_TIMEOUT_SECONDS") {
            Some(value) => value
                .parse()
                .map_err(|e| Error::config(format!("Invalid APIFOX_TIMEOUT_SECONDS: {}", e)))?,
            None => defaults.timeout_seconds,
        };

        let config = Self {
            enabled,
            project_id: env_var("APIFOX_PROJECT_ID"),
            access_token: env_var("APIFOX_ACCESS_TOKEN"),
            base_url: env_var("APIFOX_BASE_URL").unwrap_or(defaults.base_url),
            api_version: env_var("APIFOX_API_VERSION").unwrap_or(defaults.api_version),
            app_name: env_var("APP_NAME").unwrap_or(defaults.app_name),
            app_version: env_var("APP_VERSION").unwrap_or(defaults.app_version),
            timeout_seconds,
        };

        config.validate_settings()?;
        Ok(config)
    }
}

impl ObservabilityConfig {
    /// Create logging configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let json_logging = match env_var("APIFOX_LOG_JSON") {
            Some(value) => parse_bool("APIFOX_LOG_JSON", &value)?,
            None => defaults.json_logging,
        };

        let log_level = env_var("APIFOX_LOG_LEVEL").unwrap_or(defaults.log_level);
        Ok(Self { log_level, json_logging })
    }
}
