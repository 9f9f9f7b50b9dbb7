//! Chat session façade
//!
//! [`ChatService`] builds requests for each kind of turn, hands them to a
//! [`ChatTransport`] and decodes streamed answers into [`ChatEvent`]s.
//! It holds no session state: chat ids are generated by the caller (see
//! [`ChatService::generate_chat_id`]) and passed with every turn.
//!
//! [`ChatEvent`]: crate::sse::ChatEvent

use crate::config::FastGptConfig;
use crate::error::{ChatError, ChatResult};
use crate::interactive::{self, InteractiveAnswer};
use crate::protocol::{
    ChatHistoryItem, ChatHistoryRequest, ChatMessage, ChatResponse, ChatStreamRequest, ContentItem,
    Interactive, PagedList, UpdateHistoryRequest, Variables,
};
use crate::sse::{decode_stream, ChatEventStream, DecodePolicy};
use crate::transport::{ChatTransport, HttpTransport, TransportError};
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Per-turn settings shared by the convenience calls
#[derive(Debug, Clone)]
pub struct TurnOptions {
    pub chat_id: Option<String>,
    /// Request intermediate events; on by default
    pub detail: bool,
    pub variables: Option<Variables>,
    pub response_chat_item_id: Option<String>,
    pub cancel: CancellationToken,
}

impl Default for TurnOptions {
    fn default() -> Self {
        Self {
            chat_id: None,
            detail: true,
            variables: None,
            response_chat_item_id: None,
            cancel: CancellationToken::new(),
        }
    }
}

impl TurnOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chat_id(mut self, chat_id: impl Into<String>) -> Self {
        self.chat_id = Some(chat_id.into());
        self
    }

    pub fn with_detail(mut self, detail: bool) -> Self {
        self.detail = detail;
        self
    }

    pub fn with_variables(mut self, variables: Variables) -> Self {
        self.variables = Some(variables);
        self
    }

    pub fn with_response_chat_item_id(mut self, id: impl Into<String>) -> Self {
        self.response_chat_item_id = Some(id.into());
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    fn request(&self, messages: Vec<ChatMessage>) -> ChatStreamRequest {
        let mut request = ChatStreamRequest::new(messages).with_detail(self.detail);
        request.chat_id = self.chat_id.clone();
        self.apply_extras(request)
    }

    fn apply_extras(&self, mut request: ChatStreamRequest) -> ChatStreamRequest {
        request.variables = self.variables.clone();
        request.response_chat_item_id = self.response_chat_item_id.clone();
        request
    }
}

/// Run `call` unless `cancel` fires first
async fn cancellable<T, F>(cancel: &CancellationToken, call: F) -> ChatResult<T>
where
    F: Future<Output = Result<T, TransportError>>,
{
    let result = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(ChatError::Cancelled),
        result = call => result,
    };
    if let Err(e) = &result {
        if e.is_connection_failure() {
            warn!("FastGPT unreachable: {}", e);
        }
    }
    result.map_err(ChatError::from)
}

/// Client for FastGPT chat applications
///
/// Every call takes an application selector `app`; an empty selector uses
/// the global key.
#[derive(Clone)]
pub struct ChatService {
    transport: Arc<dyn ChatTransport>,
    decode_policy: DecodePolicy,
}

impl ChatService {
    pub fn new(transport: Arc<dyn ChatTransport>) -> Self {
        Self {
            transport,
            decode_policy: DecodePolicy::default(),
        }
    }

    /// Service backed by an [`HttpTransport`] for `config`
    pub fn from_config(config: FastGptConfig) -> Result<Self, TransportError> {
        Ok(Self::new(Arc::new(HttpTransport::new(config)?)))
    }

    pub fn with_decode_policy(mut self, policy: DecodePolicy) -> Self {
        self.decode_policy = policy;
        self
    }

    pub fn decode_policy(&self) -> DecodePolicy {
        self.decode_policy
    }

    /// New time-ordered chat id (UUID v7)
    pub fn generate_chat_id() -> String {
        Uuid::now_v7().to_string()
    }

    // ----- non-streaming -----

    pub async fn chat(
        &self,
        app: &str,
        request: &ChatStreamRequest,
        cancel: &CancellationToken,
    ) -> ChatResult<ChatResponse> {
        info!(
            "Chat turn [app: {}, chat_id: {}]",
            app,
            request.chat_id.as_deref().unwrap_or("-")
        );
        cancellable(cancel, self.transport.send(app, request)).await
    }

    pub async fn chat_text(
        &self,
        app: &str,
        message: impl Into<String>,
        opts: TurnOptions,
    ) -> ChatResult<ChatResponse> {
        let request = opts.request(vec![ChatMessage::user(message)]);
        self.chat(app, &request, &opts.cancel).await
    }

    pub async fn chat_with_image(
        &self,
        app: &str,
        image_url: impl Into<String>,
        opts: TurnOptions,
    ) -> ChatResult<ChatResponse> {
        let request = opts.request(vec![ChatMessage::user_parts(vec![ContentItem::image(
            image_url,
        )])]);
        self.chat(app, &request, &opts.cancel).await
    }

    pub async fn chat_with_file(
        &self,
        app: &str,
        file_name: impl Into<String>,
        file_url: impl Into<String>,
        opts: TurnOptions,
    ) -> ChatResult<ChatResponse> {
        let request = opts.request(vec![ChatMessage::user_parts(vec![ContentItem::file(
            file_name, file_url,
        )])]);
        self.chat(app, &request, &opts.cancel).await
    }

    /// Answer an interactive prompt; `opts.chat_id` is ignored in favour of
    /// `chat_id`
    pub async fn chat_interactive(
        &self,
        app: &str,
        prompt: &Interactive,
        chat_id: &str,
        answer: &InteractiveAnswer,
        opts: TurnOptions,
    ) -> ChatResult<ChatResponse> {
        let request = opts.apply_extras(interactive::build_request(
            prompt,
            answer,
            chat_id,
            opts.detail,
        )?);
        self.chat(app, &request, &opts.cancel).await
    }

    /// Run a plugin app with input variables only
    pub async fn request_plugin(
        &self,
        app: &str,
        variables: Variables,
        cancel: &CancellationToken,
    ) -> ChatResult<ChatResponse> {
        self.chat(app, &ChatStreamRequest::plugin(variables), cancel)
            .await
    }

    // ----- streaming -----

    /// Open a streamed turn
    ///
    /// The returned stream is lazy; `cancel` also covers reads made while
    /// consuming it.
    pub async fn chat_stream(
        &self,
        app: &str,
        request: &ChatStreamRequest,
        cancel: CancellationToken,
    ) -> ChatResult<ChatEventStream> {
        info!(
            "Streaming chat turn [app: {}, chat_id: {}]",
            app,
            request.chat_id.as_deref().unwrap_or("-")
        );
        let bytes = cancellable(&cancel, self.transport.send_stream(app, request)).await?;
        debug!("Event stream opened [policy: {:?}]", self.decode_policy);
        Ok(decode_stream(bytes, self.decode_policy, cancel))
    }

    pub async fn chat_stream_text(
        &self,
        app: &str,
        message: impl Into<String>,
        opts: TurnOptions,
    ) -> ChatResult<ChatEventStream> {
        let request = opts.request(vec![ChatMessage::user(message)]);
        self.chat_stream(app, &request, opts.cancel).await
    }

    pub async fn chat_stream_with_image(
        &self,
        app: &str,
        image_url: impl Into<String>,
        opts: TurnOptions,
    ) -> ChatResult<ChatEventStream> {
        let request = opts.request(vec![ChatMessage::user_parts(vec![ContentItem::image(
            image_url,
        )])]);
        self.chat_stream(app, &request, opts.cancel).await
    }

    pub async fn chat_stream_with_file(
        &self,
        app: &str,
        file_name: impl Into<String>,
        file_url: impl Into<String>,
        opts: TurnOptions,
    ) -> ChatResult<ChatEventStream> {
        let request = opts.request(vec![ChatMessage::user_parts(vec![ContentItem::file(
            file_name, file_url,
        )])]);
        self.chat_stream(app, &request, opts.cancel).await
    }

    pub async fn chat_stream_interactive(
        &self,
        app: &str,
        prompt: &Interactive,
        chat_id: &str,
        answer: &InteractiveAnswer,
        opts: TurnOptions,
    ) -> ChatResult<ChatEventStream> {
        let request = opts.apply_extras(interactive::build_request(
            prompt,
            answer,
            chat_id,
            opts.detail,
        )?);
        self.chat_stream(app, &request, opts.cancel).await
    }

    pub async fn request_plugin_stream(
        &self,
        app: &str,
        variables: Variables,
        cancel: CancellationToken,
    ) -> ChatResult<ChatEventStream> {
        self.chat_stream(app, &ChatStreamRequest::plugin(variables), cancel)
            .await
    }

    // ----- history -----

    /// One page of the app's stored chats
    pub async fn get_histories(
        &self,
        app: &str,
        offset: u32,
        page_size: u32,
        source: Option<&str>,
        cancel: &CancellationToken,
    ) -> ChatResult<PagedList<ChatHistoryItem>> {
        let mut request = ChatHistoryRequest::new(offset, page_size);
        request.source = source.map(str::to_string);

        let response = cancellable(cancel, self.transport.get_histories(app, request)).await?;
        Ok(response.data.unwrap_or_else(|| PagedList {
            list: Vec::new(),
            total: 0,
        }))
    }

    /// Set a custom title on a stored chat
    pub async fn update_history(
        &self,
        app: &str,
        chat_id: impl Into<String>,
        title: impl Into<String>,
        cancel: &CancellationToken,
    ) -> ChatResult<()> {
        let request = UpdateHistoryRequest::new(chat_id, title);
        info!("Renaming chat {} [app: {}]", request.chat_id, app);
        cancellable(cancel, self.transport.update_history(app, request)).await?;
        Ok(())
    }
}
