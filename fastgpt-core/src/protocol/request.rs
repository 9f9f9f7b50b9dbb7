//! Outbound request types for the chat completions endpoint
//!
//! The same [`ChatStreamRequest`] shape is used for streaming and
//! non-streaming calls; the `stream` discriminator is added at serialization
//! time through [`RequestBody`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Default role for messages built by this crate
pub const USER_ROLE: &str = "user";

/// Flow variables / plugin inputs (`variables` field)
pub type Variables = HashMap<String, Value>;

/// A single chat message
///
/// Serialized as `{"role": ..., "content": ...}` where `content` is either a
/// plain string or an array of [`ContentItem`]s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatMessage {
    /// Plain text message
    Text { role: String, content: String },
    /// Multi-part message (images, files, text fragments)
    MultiPart {
        role: String,
        content: Vec<ContentItem>,
    },
}

impl ChatMessage {
    /// Create a plain text message from the user
    pub fn user(content: impl Into<String>) -> Self {
        Self::Text {
            role: USER_ROLE.to_string(),
            content: content.into(),
        }
    }

    /// Create a multi-part message from the user
    pub fn user_parts(content: Vec<ContentItem>) -> Self {
        Self::MultiPart {
            role: USER_ROLE.to_string(),
            content,
        }
    }

    /// Role of the message sender
    pub fn role(&self) -> &str {
        match self {
            Self::Text { role, .. } | Self::MultiPart { role, .. } => role,
        }
    }

    /// Text content if this is a plain text message
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { content, .. } => Some(content),
            Self::MultiPart { .. } => None,
        }
    }

    /// Content items if this is a multi-part message
    pub fn parts(&self) -> Option<&[ContentItem]> {
        match self {
            Self::Text { .. } => None,
            Self::MultiPart { content, .. } => Some(content),
        }
    }
}

/// One element of a multi-part message, discriminated by `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentItem {
    /// `{"type": "text", "text": ...}`
    Text { text: String },
    /// `{"type": "image_url", "image_url": {"url": ...}}`
    ImageUrl { image_url: ImageUrl },
    /// `{"type": "file_url", "name": ..., "url": ...}`
    FileUrl { name: String, url: String },
}

impl ContentItem {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn image(url: impl Into<String>) -> Self {
        Self::ImageUrl {
            image_url: ImageUrl { url: url.into() },
        }
    }

    pub fn file(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self::FileUrl {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Image reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

/// Chat completion request
///
/// When `chat_id` is set the service loads the stored history for that chat
/// and only uses the last entry of `messages` as the new question. Chat ids
/// are chosen by the caller, must be unique and shorter than 250 characters.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatStreamRequest {
    /// Message list; absent for plugin invocations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<ChatMessage>>,

    /// Chat session id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,

    /// Ask for intermediate events (node status, full node responses)
    #[serde(default)]
    pub detail: bool,

    /// Flow variables, replacing `[key]` placeholders in the flow
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<Variables>,

    /// Id to store the response turn under; unique within `chat_id`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_chat_item_id: Option<String>,
}

impl ChatStreamRequest {
    /// Create a request from a message list
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages: Some(messages),
            ..Default::default()
        }
    }

    /// Create a plugin invocation carrying only variables
    pub fn plugin(variables: Variables) -> Self {
        Self {
            variables: Some(variables),
            ..Default::default()
        }
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

    /// Wire body for this request with the given `stream` flag
    pub fn body(&self, stream: bool) -> RequestBody<'_> {
        RequestBody {
            request: self,
            stream,
        }
    }
}

/// Serialized form of a [`ChatStreamRequest`] plus the `stream` discriminator
#[derive(Debug, Serialize)]
pub struct RequestBody<'a> {
    #[serde(flatten)]
    request: &'a ChatStreamRequest,
    stream: bool,
}

/// Request for the chat history listing
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatHistoryRequest {
    /// Application id; filled in by the transport from its credentials
    pub app_id: String,
    pub offset: u32,
    pub page_size: u32,
    /// `"api"` restricts the listing to chats created through the API
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl ChatHistoryRequest {
    pub fn new(offset: u32, page_size: u32) -> Self {
        Self {
            offset,
            page_size,
            ..Default::default()
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Request to rename a chat
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateHistoryRequest {
    /// Application id; filled in by the transport from its credentials
    pub app_id: String,
    pub chat_id: String,
    pub title: String,
}

impl UpdateHistoryRequest {
    pub fn new(chat_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            app_id: String::new(),
            chat_id: chat_id.into(),
            title: title.into(),
        }
    }
}
