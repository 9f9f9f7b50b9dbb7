//! Configuration schema structures with serde support

use super::error::{ValidationError, ValidationErrorKind};
use super::secrets::SecretString;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use url::Url;

/// Supported schema version
pub const CONFIG_VERSION: &str = "0.1";

/// Root configuration for a FastGPT deployment
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FastGptConfig {
    /// Schema version (required - no default)
    pub version: String,

    /// Service root, e.g. `https://fastgpt.example.com`; routes live under `/api/`
    pub host: String,

    /// Key used when a call does not name a configured application
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_api_key: Option<SecretString>,

    /// Per-application credentials keyed by the local application name
    #[serde(default)]
    pub apps: HashMap<String, AppCredentials>,

    /// Connection settings
    #[serde(default)]
    pub connection: ConnectionConfig,
}

/// Credentials of one FastGPT application
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppCredentials {
    /// Application id used by the history endpoints
    pub app_id: String,
    pub api_key: SecretString,
}

/// Connection configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionConfig {
    /// Connection timeout in milliseconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,

    /// Request timeout in milliseconds; covers the whole response body,
    /// including a streamed one
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_connect_timeout(),
            request_timeout_ms: default_request_timeout(),
        }
    }
}

fn default_connect_timeout() -> u64 {
    10_000
}

fn default_request_timeout() -> u64 {
    300_000
}

impl FastGptConfig {
    /// Minimal configuration with a host and a global key
    pub fn new(host: impl Into<String>, global_api_key: impl Into<SecretString>) -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            host: host.into(),
            global_api_key: Some(global_api_key.into()),
            apps: HashMap::new(),
            connection: ConnectionConfig::default(),
        }
    }

    /// Register credentials for a named application
    pub fn with_app(
        mut self,
        name: impl Into<String>,
        app_id: impl Into<String>,
        api_key: impl Into<SecretString>,
    ) -> Self {
        self.apps.insert(
            name.into(),
            AppCredentials {
                app_id: app_id.into(),
                api_key: api_key.into(),
            },
        );
        self
    }

    /// Base URL every route is joined onto, always ending in `/api/`
    pub fn api_base(&self) -> Result<Url, ValidationError> {
        let base = format!("{}/api/", self.host.trim_end_matches('/'));
        Url::parse(&base).map_err(|e| ValidationError::invalid_url("host", e.to_string()))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.version.is_empty() {
            return Err(ValidationError::required("version"));
        }
        if self.version != CONFIG_VERSION {
            return Err(ValidationError::new(
                "version",
                ValidationErrorKind::InvalidVersion {
                    expected: CONFIG_VERSION.to_string(),
                    actual: self.version.clone(),
                },
            ));
        }

        if self.host.trim().is_empty() {
            return Err(ValidationError::required("host"));
        }
        match Url::parse(&self.host) {
            Ok(url) if url.scheme() != "http" && url.scheme() != "https" => {
                return Err(ValidationError::invalid_url(
                    "host",
                    format!("URL scheme must be http or https, got: {}", url.scheme()),
                ));
            }
            Ok(_) => {}
            Err(e) => return Err(ValidationError::invalid_url("host", e.to_string())),
        }

        if let Some(key) = &self.global_api_key {
            if key.is_empty() {
                return Err(ValidationError::required("global_api_key")
                    .with_context("Remove the field or provide a key"));
            }
        }

        if self.global_api_key.is_none() && self.apps.is_empty() {
            return Err(ValidationError::required("apps")
                .with_context("Configure at least one application or a global_api_key"));
        }

        for (name, app) in &self.apps {
            app.validate(&format!("apps.{}", name))?;
        }

        self.connection.validate("connection")
    }
}

impl AppCredentials {
    pub fn validate(&self, path: &str) -> Result<(), ValidationError> {
        if self.app_id.trim().is_empty() {
            return Err(ValidationError::required(format!("{}.app_id", path)));
        }
        if self.api_key.is_empty() {
            return Err(ValidationError::required(format!("{}.api_key", path)));
        }
        Ok(())
    }
}

impl ConnectionConfig {
    pub fn validate(&self, path: &str) -> Result<(), ValidationError> {
        if self.connect_timeout_ms == 0 {
            return Err(ValidationError::out_of_range(
                format!("{}.connect_timeout_ms", path),
                "Timeout must be greater than zero",
            ));
        }
        if self.request_timeout_ms == 0 {
            return Err(ValidationError::out_of_range(
                format!("{}.request_timeout_ms", path),
                "Timeout must be greater than zero",
            ));
        }
        Ok(())
    }
}
