//! Transport error type and HTTP status mapping

use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Failure reported by a [`ChatTransport`](super::ChatTransport)
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    #[error("No credentials configured for app '{app}'")]
    UnknownApp { app: String },

    #[error("Invalid transport configuration: {message}")]
    Configuration { message: String },

    #[error("Rate limited{}", .retry_after.map(|d| format!(" (retry after {}s)", d.as_secs())).unwrap_or_default())]
    RateLimited { retry_after: Option<Duration> },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Request timeout")]
    Timeout,

    #[error("Server error ({status_code}): {message}")]
    ServerError { status_code: u16, message: String },

    #[error("Network error: {message}")]
    Network { message: String },

    /// FastGPT answered HTTP 200 with a failure envelope
    #[error("FastGPT error [{code}]: {message}")]
    Api { code: i64, message: String },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("Response size {size} exceeds maximum {limit}")]
    ResponseTooLarge { size: u64, limit: u64 },
}

impl TransportError {
    /// Whether the failure happened before the service processed the call
    pub fn is_connection_failure(&self) -> bool {
        matches!(self, TransportError::Network { .. } | TransportError::Timeout)
    }
}

/// Map HTTP status code and response body to a [`TransportError`]
pub fn map_http_error(
    status: StatusCode,
    retry_after: Option<&str>,
    body: Option<String>,
    request_id: Uuid,
) -> TransportError {
    let error_message = body
        .as_deref()
        .and_then(|b| serde_json::from_str::<Value>(b).ok())
        .and_then(|v| extract_error_message(&v))
        .or_else(|| body.filter(|b| !b.trim().is_empty()))
        .unwrap_or_else(|| format!("HTTP error {}", status.as_u16()));

    let message_with_id = format!("{} [request_id: {}]", error_message, request_id);

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => TransportError::Authentication {
            message: message_with_id,
        },

        StatusCode::TOO_MANY_REQUESTS => TransportError::RateLimited {
            retry_after: retry_after.and_then(parse_retry_after),
        },

        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => TransportError::Timeout,

        status if status.is_server_error() => TransportError::ServerError {
            status_code: status.as_u16(),
            message: message_with_id,
        },

        _ => TransportError::InvalidRequest {
            message: message_with_id,
        },
    }
}

/// Map a FastGPT failure envelope (`{code, statusText, message}`) received
/// with a success status
pub fn map_api_error(body: &str, request_id: Uuid) -> TransportError {
    let value = serde_json::from_str::<Value>(body).unwrap_or(Value::Null);
    let code = value.get("code").and_then(|c| c.as_i64()).unwrap_or(500);
    let message = extract_error_message(&value).unwrap_or_else(|| "unknown error".to_string());

    TransportError::Api {
        code,
        message: format!("{} [request_id: {}]", message, request_id),
    }
}

/// Pull a human readable message out of a JSON error body
fn extract_error_message(json: &Value) -> Option<String> {
    let non_empty = |v: &Value| {
        v.as_str()
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
    };

    // { "error": { "message": "..." } }
    if let Some(message) = json.get("error").and_then(|e| e.get("message")).and_then(non_empty) {
        return Some(message);
    }

    // FastGPT: { "code": 500, "statusText": "...", "message": "..." }
    if let Some(message) = json.get("message").and_then(non_empty) {
        return Some(message);
    }
    if let Some(message) = json.get("statusText").and_then(non_empty) {
        return Some(message);
    }

    json.get("error").and_then(non_empty)
}

/// Parse a `Retry-After` header given in seconds
pub fn parse_retry_after(header_value: &str) -> Option<Duration> {
    header_value.trim().parse::<u64>().ok().map(Duration::from_secs)
}
