//! Transport seam between the chat client and the FastGPT service
//!
//! [`ChatTransport`] accepts a request value plus an application selector
//! and returns either a JSON response or the raw SSE byte stream. The
//! selector only drives local credential and app-id lookup; it is never
//! written into a request body. [`HttpTransport`] is the reqwest-backed
//! implementation.

pub mod error;
pub mod http;

pub use error::{map_api_error, map_http_error, parse_retry_after, TransportError};
pub use http::HttpTransport;

use crate::protocol::{
    ChatHistoryRequest, ChatHistoryResponse, ChatResponse, ChatStreamRequest, EmptyResponse,
    UpdateHistoryRequest,
};
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;

/// Raw response body of a streaming call
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

/// Routes relative to `<host>/api/`
pub mod routes {
    pub const CHAT_COMPLETIONS: &str = "v2/chat/completions";
    pub const GET_HISTORIES: &str = "core/chat/getHistories";
    pub const UPDATE_HISTORY: &str = "core/chat/updateHistory";
}

/// Executes FastGPT calls on behalf of [`ChatService`](crate::chat::ChatService)
///
/// An empty `app` selects the global key.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Non-streaming completion; the body carries `stream: false`
    async fn send(
        &self,
        app: &str,
        request: &ChatStreamRequest,
    ) -> Result<ChatResponse, TransportError>;

    /// Streaming completion; the body carries `stream: true`
    async fn send_stream(
        &self,
        app: &str,
        request: &ChatStreamRequest,
    ) -> Result<ByteStream, TransportError>;

    /// List stored chats; `request.app_id` is filled from the app's credentials
    async fn get_histories(
        &self,
        app: &str,
        request: ChatHistoryRequest,
    ) -> Result<ChatHistoryResponse, TransportError>;

    /// Rename a stored chat; `request.app_id` is filled from the app's credentials
    async fn update_history(
        &self,
        app: &str,
        request: UpdateHistoryRequest,
    ) -> Result<EmptyResponse, TransportError>;
}
