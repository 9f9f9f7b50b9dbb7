//! API key wrapper that never prints its value

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sensitive string such as an API key
///
/// `Debug` and `Display` print `[REDACTED]`; the value is only reachable
/// through [`SecretString::expose_secret`].
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct SecretString {
    value: String,
}

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// Get the actual value (use with caution)
    pub fn expose_secret(&self) -> &str {
        &self.value
    }

    pub fn is_empty(&self) -> bool {
        self.value.trim().is_empty()
    }

    /// Partially redacted form for diagnostics, e.g. `fastgpt-...a1b2`
    pub fn partial_redact(&self) -> String {
        if self.value.is_empty() {
            return "[EMPTY]".to_string();
        }

        let len = self.value.chars().count();
        if len <= 12 {
            return "[REDACTED]".to_string();
        }
        let tail: String = self.value.chars().skip(len - 4).collect();
        match self.value.find('-') {
            Some(dash) if dash < 12 => format!("{}...{}", &self.value[..=dash], tail),
            _ => {
                let head: String = self.value.chars().take(2).collect();
                format!("{}...{}", head, tail)
            }
        }
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl PartialEq for SecretString {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_string_redaction() {
        let secret = SecretString::new("fastgpt-abcdefghijklmnop1234");
        assert_eq!(format!("{}", secret), "[REDACTED]");
        assert_eq!(format!("{:?}", secret), "[REDACTED]");
        assert_eq!(secret.partial_redact(), "fastgpt-...1234");
    }

    #[test]
    fn test_short_and_unprefixed_secrets() {
        assert_eq!(SecretString::new("short").partial_redact(), "[REDACTED]");
        assert_eq!(SecretString::new("").partial_redact(), "[EMPTY]");
        assert_eq!(
            SecretString::new("abcdefghijklmnopqrstuvwxyz").partial_redact(),
            "ab...wxyz"
        );
    }

    #[test]
    fn test_secret_string_expose() {
        let secret = SecretString::from("my-secret-value");
        assert_eq!(secret.expose_secret(), "my-secret-value");
        assert!(SecretString::new("  ").is_empty());
    }
}
