//! Payload shapes carried by the streaming chat events
//!
//! One type per event tag. All structs default missing fields so that
//! FastGPT nodes that omit optional data still decode; only type mismatches
//! fail. Numeric fields go through [`crate::protocol::lenient`].

use super::lenient;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Incremental answer chunk (`answer` tag)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnswerDelta {
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub object: String,
    #[serde(deserialize_with = "lenient::number")]
    pub created: i64,
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub choices: Vec<DeltaChoice>,
}

impl AnswerDelta {
    /// Concatenated content of every choice in this chunk
    pub fn content(&self) -> String {
        self.choices
            .iter()
            .map(|c| c.delta.content.as_str())
            .collect()
    }

    /// Finish reason of the first choice that reports one
    pub fn finish_reason(&self) -> Option<&str> {
        self.choices
            .iter()
            .find_map(|c| c.finish_reason.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeltaChoice {
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub delta: MessageDelta,
    #[serde(deserialize_with = "lenient::number")]
    pub index: u32,
    /// `stop` on normal completion
    #[serde(alias = "finish_reason")]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageDelta {
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub role: String,
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub content: String,
}

/// Execution state of a flow node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Running,
    Finished,
    Error,
    /// Missing or unrecognised status
    #[default]
    #[serde(other)]
    Unknown,
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Running => "running",
            Self::Finished => "finished",
            Self::Error => "error",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Node status notification (`flowNodeStatus` tag)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowNodeStatus {
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub status: NodeStatus,
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub name: String,
    pub message: Option<String>,
}

/// Full execution record of one flow node (`flowResponses` tag, and
/// `responseData` of non-streaming responses)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FlowNodeResponse {
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub node_id: String,
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub module_name: String,
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub module_type: String,
    /// Seconds
    #[serde(deserialize_with = "lenient::optional_number")]
    pub running_time: Option<f64>,

    pub query: Option<String>,
    pub text_output: Option<String>,
    pub error: Option<Value>,
    pub error_text: Option<String>,
    pub node_inputs: Option<Value>,
    pub node_outputs: Option<Value>,
    #[serde(deserialize_with = "lenient::optional_number")]
    pub context_total_len: Option<u32>,

    pub model: Option<String>,
    #[serde(deserialize_with = "lenient::optional_number")]
    pub input_tokens: Option<u32>,
    #[serde(deserialize_with = "lenient::optional_number")]
    pub output_tokens: Option<u32>,
    /// Points charged for this node
    #[serde(deserialize_with = "lenient::optional_number")]
    pub total_points: Option<f64>,

    #[serde(flatten)]
    pub chat: ChatNodeDetail,
    #[serde(flatten)]
    pub search: DatasetSearchDetail,
    #[serde(flatten)]
    pub http: HttpNodeDetail,
}

/// Fields reported by AI chat nodes
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChatNodeDetail {
    #[serde(
        deserialize_with = "lenient::optional_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub temperature: Option<f64>,
    #[serde(
        deserialize_with = "lenient::optional_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_token: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote_list: Option<Vec<QuoteItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_preview: Option<Vec<CompleteMessage>>,
    #[serde(alias = "finish_reason", skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// Fields reported by dataset search nodes
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DatasetSearchDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<String>,
    #[serde(
        deserialize_with = "lenient::optional_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub embedding_tokens: Option<u32>,
    #[serde(
        deserialize_with = "lenient::optional_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub similarity: Option<f64>,
    #[serde(
        deserialize_with = "lenient::optional_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rerank_model: Option<String>,
    #[serde(rename = "searchUsingReRank", skip_serializing_if = "Option::is_none")]
    pub search_using_rerank: Option<bool>,
}

/// Fields reported by HTTP request nodes
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HttpNodeDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<HashMap<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_result: Option<HashMap<String, Value>>,
}

/// Knowledge base quote attached to a chat node
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QuoteItem {
    #[serde(alias = "dataset_id")]
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub dataset_id: String,
    #[serde(alias = "_id")]
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub q: String,
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub a: String,
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub source: String,
}

/// Context message as shown in node previews
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompleteMessage {
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub obj: String,
    pub value: Value,
}

/// Wrapper of an interactive prompt (`interactive` tag)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractiveEvent {
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub interactive: Interactive,
}

/// Interactive type asking the user to pick one option
pub const USER_SELECT: &str = "userSelect";
/// Interactive type asking the user to fill a form
pub const USER_INPUT: &str = "userInput";

/// Mid-flow request for structured user input
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Interactive {
    /// `userSelect` uses `params.user_select_options`, `userInput` uses
    /// `params.input_form`
    #[serde(rename = "type", deserialize_with = "lenient::null_as_default")]
    pub kind: String,
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub params: InteractiveParams,
}

impl Interactive {
    /// Build a selection prompt
    pub fn user_select(description: impl Into<String>, options: Vec<UserSelectOption>) -> Self {
        Self {
            kind: USER_SELECT.to_string(),
            params: InteractiveParams {
                description: description.into(),
                user_select_options: Some(options),
                input_form: None,
            },
        }
    }

    /// Build a form prompt
    pub fn user_input(description: impl Into<String>, fields: Vec<InputFormItem>) -> Self {
        Self {
            kind: USER_INPUT.to_string(),
            params: InteractiveParams {
                description: description.into(),
                user_select_options: None,
                input_form: Some(fields),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InteractiveParams {
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_select_options: Option<Vec<UserSelectOption>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_form: Option<Vec<InputFormItem>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSelectOption {
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub key: String,
    /// Text sent back when this option is chosen
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub value: String,
}

impl UserSelectOption {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Form field descriptor
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InputFormItem {
    /// Input widget (`input`, `textarea`, `numberInput`, `select`, ...)
    #[serde(rename = "type", deserialize_with = "lenient::null_as_default")]
    pub input_type: String,
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub key: String,
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub label: String,
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub description: String,
    pub value: Option<Value>,
    pub default_value: Option<Value>,
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub value_type: String,
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list: Option<Vec<ListItem>>,
}

impl InputFormItem {
    pub fn new(key: impl Into<String>, required: bool) -> Self {
        let key = key.into();
        Self {
            label: key.clone(),
            key,
            required,
            ..Default::default()
        }
    }
}

/// Choice of a `select` form field
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ListItem {
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub label: String,
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub value: String,
}

/// A tool started running (`toolCall` tag)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ToolCall {
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub node_id: String,
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub tool_name: String,
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub tool_avatar: String,
}

/// Arguments passed to a tool (`toolParams` tag)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ToolParams {
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub node_id: String,
    /// JSON encoded arguments
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub params: String,
}

/// Output of a tool (`toolResponse` tag)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ToolResponse {
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub node_id: String,
    /// JSON encoded result
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub response: String,
}

/// Error reported by the flow (`Error` tag)
///
/// FastGPT sends either `{"message", "code"}` or the same object nested
/// under `error`; both decode to this type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "ErrorEventWire")]
pub struct ErrorEvent {
    pub message: String,
    pub code: Option<String>,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct ErrorInfo {
    #[serde(deserialize_with = "lenient::null_as_default")]
    message: String,
    #[serde(deserialize_with = "lenient::optional_string")]
    code: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorEventWire {
    Nested { error: ErrorInfo },
    Flat(ErrorInfo),
}

impl From<ErrorEventWire> for ErrorEvent {
    fn from(wire: ErrorEventWire) -> Self {
        let info = match wire {
            ErrorEventWire::Nested { error } => error,
            ErrorEventWire::Flat(info) => info,
        };
        Self {
            message: info.message,
            code: info.code,
        }
    }
}
