//! reqwest-backed [`ChatTransport`]

use super::error::{map_api_error, map_http_error, TransportError};
use super::{routes, ByteStream, ChatTransport};
use crate::config::{FastGptConfig, SecretString};
use crate::protocol::{
    ChatHistoryRequest, ChatHistoryResponse, ChatResponse, ChatStreamRequest, EmptyResponse,
    UpdateHistoryRequest,
};
use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::header::{CONTENT_TYPE, RETRY_AFTER};
use reqwest::{Client, ClientBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use url::Url;
use uuid::Uuid;

/// Maximum size of a buffered JSON response (10MB)
const MAX_RESPONSE_SIZE: u64 = 10 * 1024 * 1024;

const USER_AGENT: &str = concat!("fastgpt-rs/", env!("CARGO_PKG_VERSION"));

/// Key and app id resolved for one call
struct Credentials<'a> {
    api_key: &'a SecretString,
    app_id: Option<&'a str>,
}

/// HTTP transport with a shared connection pool
#[derive(Clone)]
pub struct HttpTransport {
    client: Arc<Client>,
    config: Arc<FastGptConfig>,
    base_url: Url,
    max_response_size: u64,
}

impl HttpTransport {
    /// Build a transport from a validated configuration
    pub fn new(config: FastGptConfig) -> Result<Self, TransportError> {
        config
            .validate()
            .map_err(|e| TransportError::Configuration {
                message: e.to_string(),
            })?;

        let client = ClientBuilder::new()
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .connect_timeout(Duration::from_millis(config.connection.connect_timeout_ms))
            .timeout(Duration::from_millis(config.connection.request_timeout_ms))
            .user_agent(USER_AGENT)
            .gzip(true)
            .build()
            .map_err(|e| TransportError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Self::with_client(config, client)
    }

    /// Build a transport around an existing reqwest client
    pub fn with_client(config: FastGptConfig, client: Client) -> Result<Self, TransportError> {
        let base_url = config
            .api_base()
            .map_err(|e| TransportError::Configuration {
                message: e.to_string(),
            })?;

        Ok(Self {
            client: Arc::new(client),
            config: Arc::new(config),
            base_url,
            max_response_size: MAX_RESPONSE_SIZE,
        })
    }

    /// Base URL routes are resolved against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Empty `app` selects the global key; a named app must be configured
    fn credentials(&self, app: &str) -> Result<Credentials<'_>, TransportError> {
        if app.is_empty() {
            return self
                .config
                .global_api_key
                .as_ref()
                .map(|api_key| Credentials {
                    api_key,
                    app_id: None,
                })
                .ok_or_else(|| TransportError::UnknownApp {
                    app: "<global>".to_string(),
                });
        }

        self.config
            .apps
            .get(app)
            .map(|creds| Credentials {
                api_key: &creds.api_key,
                app_id: Some(creds.app_id.as_str()),
            })
            .ok_or_else(|| TransportError::UnknownApp {
                app: app.to_string(),
            })
    }

    fn endpoint(&self, route: &str) -> Result<Url, TransportError> {
        self.base_url
            .join(route)
            .map_err(|e| TransportError::Configuration {
                message: format!("Invalid route '{}': {}", route, e),
            })
    }

    /// POST a JSON body and return the response once its status is a success
    async fn post<B>(
        &self,
        app: &str,
        route: &str,
        body: &B,
        request_id: Uuid,
    ) -> Result<Response, TransportError>
    where
        B: Serialize + ?Sized + Sync,
    {
        let credentials = self.credentials(app)?;
        let url = self.endpoint(route)?;
        debug!(
            "POST {} [app: {}, key: {}, request_id: {}]",
            url,
            app,
            credentials.api_key.partial_redact(),
            request_id
        );

        let response = self
            .client
            .post(url)
            .bearer_auth(credentials.api_key.expose_secret())
            .header("X-Request-ID", request_id.to_string())
            .json(body)
            .send()
            .await
            .map_err(|e| map_send_error(e, request_id))?;

        let status = response.status();
        debug!("Response status: {} [request_id: {}]", status, request_id);

        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let body = response.text().await.ok();

            warn!(
                "Request to {} failed with status {} [request_id: {}]",
                route, status, request_id
            );
            return Err(map_http_error(
                status,
                retry_after.as_deref(),
                body,
                request_id,
            ));
        }

        Ok(response)
    }

    /// Read a bounded body as text
    async fn read_text(&self, response: Response, request_id: Uuid) -> Result<String, TransportError> {
        if let Some(size) = response.content_length() {
            if size > self.max_response_size {
                return Err(TransportError::ResponseTooLarge {
                    size,
                    limit: self.max_response_size,
                });
            }
        }

        let text = response.text().await.map_err(|e| TransportError::Network {
            message: format!("Failed to read response body: {} [request_id: {}]", e, request_id),
        })?;

        if text.len() as u64 > self.max_response_size {
            return Err(TransportError::ResponseTooLarge {
                size: text.len() as u64,
                limit: self.max_response_size,
            });
        }
        Ok(text)
    }

    async fn read_json<T: DeserializeOwned>(
        &self,
        response: Response,
        request_id: Uuid,
    ) -> Result<T, TransportError> {
        let text = self.read_text(response, request_id).await?;

        serde_json::from_str(&text).map_err(|e| {
            // FastGPT sometimes answers 200 with a failure envelope instead of the payload
            if looks_like_envelope(&text) {
                return map_api_error(&text, request_id);
            }
            error!("Failed to parse response [request_id: {}]: {}", request_id, e);
            TransportError::InvalidResponse {
                message: format!("Invalid response format: {} [request_id: {}]", e, request_id),
            }
        })
    }

    fn resolve_app_id(&self, app: &str, app_id: &mut String) -> Result<(), TransportError> {
        if let Some(configured) = self.credentials(app)?.app_id {
            *app_id = configured.to_string();
        }
        if app_id.is_empty() {
            return Err(TransportError::InvalidRequest {
                message: "appId is required; configure the app or set it on the request"
                    .to_string(),
            });
        }
        Ok(())
    }
}

fn map_send_error(e: reqwest::Error, request_id: Uuid) -> TransportError {
    if e.is_timeout() {
        warn!("Request timeout [request_id: {}]", request_id);
        TransportError::Timeout
    } else if e.is_connect() {
        error!("Connection error [request_id: {}]: {}", request_id, e);
        TransportError::Network {
            message: format!("Connection failed: {} [request_id: {}]", e, request_id),
        }
    } else {
        error!("Request error [request_id: {}]: {}", request_id, e);
        TransportError::Network {
            message: format!("{} [request_id: {}]", e, request_id),
        }
    }
}

fn looks_like_envelope(text: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(text)
        .map(|v| v.get("code").is_some() && v.get("choices").is_none())
        .unwrap_or(false)
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_ascii_lowercase().contains("application/json"))
        .unwrap_or(false)
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn send(
        &self,
        app: &str,
        request: &ChatStreamRequest,
    ) -> Result<ChatResponse, TransportError> {
        let request_id = Uuid::new_v4();
        info!("Sending chat completion [app: {}, request_id: {}]", app, request_id);

        let response = self
            .post(app, routes::CHAT_COMPLETIONS, &request.body(false), request_id)
            .await?;
        let chat: ChatResponse = self.read_json(response, request_id).await?;

        info!("Chat completion finished [request_id: {}]", request_id);
        Ok(chat)
    }

    async fn send_stream(
        &self,
        app: &str,
        request: &ChatStreamRequest,
    ) -> Result<ByteStream, TransportError> {
        let request_id = Uuid::new_v4();
        info!("Opening chat stream [app: {}, request_id: {}]", app, request_id);

        let response = self
            .post(app, routes::CHAT_COMPLETIONS, &request.body(true), request_id)
            .await?;

        // A JSON body on a streaming call is a failure envelope
        if is_json(&response) {
            let text = self.read_text(response, request_id).await?;
            warn!("Stream request answered with JSON [request_id: {}]", request_id);
            return Err(map_api_error(&text, request_id));
        }

        let bytes = response.bytes_stream().map_err(move |e| {
            if e.is_timeout() {
                TransportError::Timeout
            } else {
                TransportError::Network {
                    message: format!("Stream read failed: {} [request_id: {}]", e, request_id),
                }
            }
        });
        Ok(Box::pin(bytes))
    }

    async fn get_histories(
        &self,
        app: &str,
        mut request: ChatHistoryRequest,
    ) -> Result<ChatHistoryResponse, TransportError> {
        let request_id = Uuid::new_v4();
        self.resolve_app_id(app, &mut request.app_id)?;
        info!(
            "Listing chat histories for app {} [request_id: {}]",
            request.app_id, request_id
        );

        let response = self
            .post(app, routes::GET_HISTORIES, &request, request_id)
            .await?;
        let page: ChatHistoryResponse = self.read_json(response, request_id).await?;
        ensure_success(&page, request_id)?;
        Ok(page)
    }

    async fn update_history(
        &self,
        app: &str,
        mut request: UpdateHistoryRequest,
    ) -> Result<EmptyResponse, TransportError> {
        let request_id = Uuid::new_v4();
        self.resolve_app_id(app, &mut request.app_id)?;
        info!(
            "Updating chat {} title [request_id: {}]",
            request.chat_id, request_id
        );

        let response = self
            .post(app, routes::UPDATE_HISTORY, &request, request_id)
            .await?;
        let result: EmptyResponse = self.read_json(response, request_id).await?;
        ensure_success(&result, request_id)?;
        Ok(result)
    }
}

fn ensure_success<T>(
    response: &crate::protocol::ApiResponse<T>,
    request_id: Uuid,
) -> Result<(), TransportError> {
    if response.is_success() {
        return Ok(());
    }
    let message = response
        .message
        .clone()
        .filter(|m| !m.is_empty())
        .or_else(|| response.status_text.clone())
        .unwrap_or_else(|| "unknown error".to_string());
    Err(TransportError::Api {
        code: response.code,
        message: format!("{} [request_id: {}]", message, request_id),
    })
}
