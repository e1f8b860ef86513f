//! # Settings
//!
//! Typed settings for the ApiFox import client and for logging.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

use crate::errors::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.apifox.cn";
/// Value of the `X-Apifox-Version` header the import API expects
pub const DEFAULT_API_VERSION: &str = "2022-11-16";
pub const DEFAULT_APP_VERSION: &str = "1.0.0";

/// ApiFox import configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ApiFoxConfig {
    /// Capture and push only when enabled (normally: when running tests)
    pub enabled: bool,

    /// ApiFox project identifier
    pub project_id: Option<String>,

    /// ApiFox personal access token
    #[serde(skip_serializing)]
    pub access_token: Option<String>,

    /// Base URL of the ApiFox open API
    #[validate(url(message = "Base URL must be a valid URL"))]
    pub base_url: String,

    /// Value sent in the `X-Apifox-Version` header
    #[validate(length(min = 1, message = "API version cannot be empty"))]
    pub api_version: String,

    /// Title of the generated documents
    pub app_name: String,

    /// Version of the generated documents
    #[validate(length(min = 1, message = "App version cannot be empty"))]
    pub app_version: String,

    /// Request timeout in seconds
    #[validate(range(min = 1, max = 300, message = "Timeout must be between 1 and 300 seconds"))]
    pub timeout_seconds: u64,
}

impl Default for ApiFoxConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            project_id: None,
            access_token: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            app_name: String::new(),
            app_version: DEFAULT_APP_VERSION.to_string(),
            timeout_seconds: 30,
        }
    }
}

impl ApiFoxConfig {
    /// Enabled configuration with credentials, for tests and explicit setups
    pub fn new<P: Into<String>, T: Into<String>>(project_id: P, access_token: T) -> Self {
        Self {
            enabled: true,
            project_id: Some(project_id.into()),
            access_token: Some(access_token.into()),
            ..Default::default()
        }
    }

    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_app_name<S: Into<String>>(mut self, app_name: S) -> Self {
        self.app_name = app_name.into();
        self
    }

    /// Validate field formats
    pub fn validate_settings(&self) -> Result<()> {
        Validate::validate(self).map_err(Error::from)
    }

    /// Project ID and access token, or a configuration error naming what is missing
    pub fn require_credentials(&self) -> Result<(&str, &str)> {
        let project_id = self.project_id.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let token = self.access_token.as_deref().map(str::trim).filter(|s| !s.is_empty());

        match (project_id, token) {
            (Some(project_id), Some(token)) => Ok((project_id, token)),
            (None, Some(_)) => {
                Err(Error::config("ApiFox project ID is not set (APIFOX_PROJECT_ID)"))
            }
            (Some(_), None) => {
                Err(Error::config("ApiFox access token is not set (APIFOX_ACCESS_TOKEN)"))
            }
            (None, None) => Err(Error::config(concat!(
                "ApiFox project ID and access token are not set ",
                "(APIFOX_PROJECT_ID, APIFOX_ACCESS_TOKEN)"
            ))),
        }
    }

    /// Import endpoint for a project
    pub fn import_url(&self, project_id: &str) -> String {
        let base_url = self.base_url.trim_end_matches('/');
        format!("{}/api/v1/projects/{}/import-data", base_url, project_id)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ObservabilityConfig {
    /// Log level or filter directive (trace, debug, info, warn, error)
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    /// Enable JSON structured logging
    pub json_logging: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self { log_level: "info".to_string(), json_logging: false }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ApiFoxConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.base_url, "https://api.apifox.cn");
        assert_eq!(config.api_version, "2022-11-16");
        assert!(config.validate_settings().is_ok());
    }

    #[test]
    fn test_require_credentials() {
        let config = ApiFoxConfig::new("123", "token");
        assert_eq!(config.require_credentials().unwrap(), ("123", "token"));

        let missing_token = ApiFoxConfig { access_token: None, ..ApiFoxConfig::new("123", "t") };
        let err = missing_token.require_credentials().unwrap_err();
        assert!(err.to_string().contains("access token"));

        let blank_project = ApiFoxConfig::new("  ", "t");
        let err = blank_project.require_credentials().unwrap_err();
        assert!(err.to_string().contains("project ID"));

        assert!(matches!(ApiFoxConfig::default().require_credentials(), Err(Error::Config(_))));
    }

    #[test]
    fn test_import_url() {
        let config = ApiFoxConfig::default().with_base_url("http://127.0.0.1:9000/");
        assert_eq!(config.import_url("42"), "http://127.0.0.1:9000/api/v1/projects/42/import-data");
    }

    #[test]
    fn test_invalid_settings() {
        let config = ApiFoxConfig { timeout_seconds: 0, ..ApiFoxConfig::default() }
            .with_base_url("not a url");
        let err = config.validate_settings().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("base_url"));
        assert!(message.contains("timeout_seconds"));
    }
}
