//! Client configuration
//!
//! Host, global key and per-application credentials, loaded from YAML or
//! JSON with `${VAR}` environment interpolation.

mod env;
mod error;
mod schema;
mod secrets;

pub use env::interpolate_env_vars;
pub use error::{ConfigError, ConfigResult, ValidationError, ValidationErrorKind};
pub use schema::{AppCredentials, ConnectionConfig, FastGptConfig, CONFIG_VERSION};
pub use secrets::SecretString;

use std::fs;
use std::path::Path;

fn read_interpolated(path: &Path) -> Result<String, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;

    env::interpolate_env_vars(&content)
}

/// Load a configuration from a YAML file
pub fn load_from_yaml<P: AsRef<Path>>(path: P) -> Result<FastGptConfig, ConfigError> {
    let path = path.as_ref();
    let interpolated = read_interpolated(path)?;

    let config: FastGptConfig =
        serde_yaml::from_str(&interpolated).map_err(|e| ConfigError::ParseError {
            path: path.to_string_lossy().to_string(),
            line: e.location().map(|l| l.line()),
            column: e.location().map(|l| l.column()),
            message: e.to_string(),
        })?;

    config.validate()?;
    Ok(config)
}

/// Load a configuration from a JSON file
pub fn load_from_json<P: AsRef<Path>>(path: P) -> Result<FastGptConfig, ConfigError> {
    let path = path.as_ref();
    let interpolated = read_interpolated(path)?;

    let config: FastGptConfig =
        serde_json::from_str(&interpolated).map_err(|e| ConfigError::ParseError {
            path: path.to_string_lossy().to_string(),
            line: Some(e.line()),
            column: Some(e.column()),
            message: e.to_string(),
        })?;

    config.validate()?;
    Ok(config)
}

/// Load a configuration, picking the format from the file extension
pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<FastGptConfig, ConfigError> {
    let path = path.as_ref();
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => load_from_yaml(path),
        Some("json") => load_from_json(path),
        _ => Err(ConfigError::UnsupportedFormat {
            path: path.to_string_lossy().to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yaml_document() {
        let yaml = r#"
version: "0.1"
host: https://fastgpt.example.com
global_api_key: fastgpt-global
apps:
  support:
    app_id: 6650aa
    api_key: fastgpt-support
connection:
  request_timeout_ms: 120000
"#;
        let config: FastGptConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.apps["support"].app_id, "6650aa");
        assert_eq!(config.connection.request_timeout_ms, 120000);
        assert_eq!(config.connection.connect_timeout_ms, 10_000);
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let yaml = r#"
version: "0.1"
host: https://fastgpt.example.com
providers: []
"#;
        assert!(serde_yaml::from_str::<FastGptConfig>(yaml).is_err());
    }

    #[test]
    fn test_unsupported_extension() {
        match load_from_path("fastgpt.toml") {
            Err(ConfigError::UnsupportedFormat { path }) => assert_eq!(path, "fastgpt.toml"),
            other => panic!("Expected UnsupportedFormat, got {:?}", other),
        }
    }
}
