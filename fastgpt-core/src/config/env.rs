//! `${VAR}` environment variable interpolation for configuration files

use super::error::ConfigError;
use regex::{Captures, Regex};
use std::env;
use std::sync::LazyLock;

static ENV_VAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("valid env var pattern"));

/// Replace every `${VAR}` in `content` with the value of the environment
/// variable; the first unset variable is reported as an error
pub fn interpolate_env_vars(content: &str) -> Result<String, ConfigError> {
    let mut missing: Option<String> = None;

    let result = ENV_VAR_PATTERN.replace_all(content, |cap: &Captures<'_>| {
        let var_name = &cap[1];
        match env::var(var_name) {
            Ok(value) => value,
            Err(_) => {
                missing.get_or_insert_with(|| var_name.to_string());
                String::new()
            }
        }
    });

    match missing {
        Some(var) => Err(ConfigError::EnvVarNotFound { var }),
        None => Ok(result.into_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolate_env_vars() {
        env::set_var("FASTGPT_ENV_TEST_KEY", "test_value");

        let content = "api_key: ${FASTGPT_ENV_TEST_KEY}";
        let result = interpolate_env_vars(content).unwrap();
        assert_eq!(result, "api_key: test_value");

        env::remove_var("FASTGPT_ENV_TEST_KEY");
    }

    #[test]
    fn test_missing_env_var() {
        let content = "api_key: ${FASTGPT_ENV_TEST_MISSING}";
        match interpolate_env_vars(content) {
            Err(ConfigError::EnvVarNotFound { var }) => {
                assert_eq!(var, "FASTGPT_ENV_TEST_MISSING")
            }
            other => panic!("Expected EnvVarNotFound error, got {:?}", other),
        }
    }
}
