//! Lenient deserializers for fields FastGPT sends inconsistently
//!
//! FastGPT emits numeric fields either as JSON numbers or as numeric strings
//! depending on the node that produced them, and error codes either as strings
//! or as numbers, and sends explicit `null` for text it has no value for.
//! These helpers are used through `deserialize_with`.

use serde::de::{self, Deserializer};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString<T> {
    Number(T),
    String(String),
}

/// Deserialize a number that may arrive as a JSON number or a numeric string
pub fn number<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: fmt::Display,
{
    match NumberOrString::<T>::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) => s.trim().parse().map_err(|e| {
            de::Error::custom(format!("invalid numeric string '{}': {}", s, e))
        }),
    }
}

/// Optional variant of [`number`]; `null` and blank strings become `None`
pub fn optional_number<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: fmt::Display,
{
    match Option::<NumberOrString<T>>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrString::Number(n)) => Ok(Some(n)),
        Some(NumberOrString::String(s)) if s.trim().is_empty() => Ok(None),
        Some(NumberOrString::String(s)) => s.trim().parse().map(Some).map_err(|e| {
            de::Error::custom(format!("invalid numeric string '{}': {}", s, e))
        }),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(serde_json::Number),
}

/// Deserialize an optional string that may arrive as a bare number
pub fn optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<StringOrNumber>::deserialize(deserializer)? {
        None => None,
        Some(StringOrNumber::String(s)) => Some(s),
        Some(StringOrNumber::Number(n)) => Some(n.to_string()),
    })
}

/// Deserialize a value whose explicit `null` means "unset"
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(deserialize_with = "number")]
        created: i64,
        #[serde(default, deserialize_with = "optional_number")]
        running_time: Option<f64>,
        #[serde(default, deserialize_with = "optional_string")]
        code: Option<String>,
        #[serde(default, deserialize_with = "null_as_default")]
        label: String,
    }

    #[test]
    fn test_accepts_numbers_and_strings() {
        let a: Sample = serde_json::from_str(r#"{"created": 17, "running_time": 0.5}"#).unwrap();
        let b: Sample =
            serde_json::from_str(r#"{"created": "17", "running_time": "0.5"}"#).unwrap();
        assert_eq!(a.created, b.created);
        assert_eq!(a.running_time, b.running_time);
    }

    #[test]
    fn test_optional_number_null_blank_and_missing() {
        let s: Sample = serde_json::from_str(r#"{"created": 1, "running_time": null}"#).unwrap();
        assert_eq!(s.running_time, None);
        let s: Sample = serde_json::from_str(r#"{"created": 1, "running_time": " "}"#).unwrap();
        assert_eq!(s.running_time, None);
        let s: Sample = serde_json::from_str(r#"{"created": 1}"#).unwrap();
        assert_eq!(s.running_time, None);
    }

    #[test]
    fn test_rejects_non_numeric_string() {
        let err = serde_json::from_str::<Sample>(r#"{"created": "soon"}"#).unwrap_err();
        assert!(err.to_string().contains("invalid numeric string"));
    }

    #[test]
    fn test_code_string_or_number() {
        let s: Sample = serde_json::from_str(r#"{"created": 1, "code": 500}"#).unwrap();
        assert_eq!(s.code.as_deref(), Some("500"));
        let s: Sample = serde_json::from_str(r#"{"created": 1, "code": "E01"}"#).unwrap();
        assert_eq!(s.code.as_deref(), Some("E01"));
    }

    #[test]
    fn test_null_as_default() {
        let s: Sample = serde_json::from_str(r#"{"created": 1, "label": null}"#).unwrap();
        assert_eq!(s.label, "");
        let s: Sample = serde_json::from_str(r#"{"created": 1}"#).unwrap();
        assert_eq!(s.label, "");
        let s: Sample = serde_json::from_str(r#"{"created": 1, "label": "x"}"#).unwrap();
        assert_eq!(s.label, "x");
        assert!(serde_json::from_str::<Sample>(r#"{"created": 1, "label": 3}"#).is_err());
    }

    proptest! {
        #[test]
        fn prop_string_and_number_forms_agree(n in any::<i64>()) {
            let from_number: Sample =
                serde_json::from_str(&format!(r#"{{"created": {}}}"#, n)).unwrap();
            let from_string: Sample =
                serde_json::from_str(&format!(r#"{{"created": "{}"}}"#, n)).unwrap();
            prop_assert_eq!(from_number.created, n);
            prop_assert_eq!(from_string.created, n);
        }
    }
}
