//! Follow-up requests for interactive prompts
//!
//! When a flow pauses on an [`Interactive`] prompt, the user's answer is
//! validated against the prompt and encoded as the next chat turn:
//!
//! - `userSelect`: the chosen option value is sent as a plain text message
//! - `userInput`: the form is checked against the field descriptors and sent
//!   as a JSON object serialized into a plain text message
//!
//! Validation happens before anything is sent.

use crate::protocol::{
    ChatMessage, ChatStreamRequest, InputFormItem, Interactive, Variables, USER_INPUT, USER_SELECT,
};
use std::collections::{BTreeSet, HashSet};
use thiserror::Error;

/// The user's answer to an interactive prompt
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractiveAnswer {
    /// Selected option value (`userSelect`)
    pub message: Option<String>,
    /// Submitted form fields (`userInput`)
    pub form: Variables,
}

impl InteractiveAnswer {
    /// Answer a selection prompt with an option value
    pub fn select(value: impl Into<String>) -> Self {
        Self {
            message: Some(value.into()),
            form: Variables::new(),
        }
    }

    /// Answer a form prompt
    pub fn form(form: Variables) -> Self {
        Self {
            message: None,
            form,
        }
    }
}

/// Broad class of an [`InteractiveError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractiveErrorKind {
    /// The caller's answer is not acceptable
    InvalidArgument,
    /// The prompt itself is malformed
    InvalidOperation,
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InteractiveError {
    #[error("invalid argument: missing selection")]
    MissingSelection,

    #[error("invalid argument: out of range ('{selection}' is not one of [{}])", .options.join(", "))]
    OutOfRange {
        selection: String,
        options: Vec<String>,
    },

    #[error("invalid argument: empty form")]
    EmptyForm,

    #[error("invalid operation: userInput prompt carries no form fields")]
    MissingFormDescriptors,

    #[error("invalid argument: unknown field(s): {}", .fields.join(", "))]
    UnknownFields { fields: Vec<String> },

    #[error("invalid argument: missing required field(s): {}", .fields.join(", "))]
    MissingRequiredFields { fields: Vec<String> },

    #[error("unsupported interactive type: {0}")]
    Unsupported(String),

    #[error("failed to serialize form: {0}")]
    Serialization(String),
}

impl InteractiveError {
    pub fn kind(&self) -> InteractiveErrorKind {
        match self {
            InteractiveError::MissingFormDescriptors | InteractiveError::Serialization(_) => {
                InteractiveErrorKind::InvalidOperation
            }
            InteractiveError::Unsupported(_) => InteractiveErrorKind::Unsupported,
            _ => InteractiveErrorKind::InvalidArgument,
        }
    }
}

/// Build the request answering `prompt` within `chat_id`
pub fn build_request(
    prompt: &Interactive,
    answer: &InteractiveAnswer,
    chat_id: &str,
    detail: bool,
) -> Result<ChatStreamRequest, InteractiveError> {
    let content = match prompt.kind.as_str() {
        USER_SELECT => selection_content(prompt, answer.message.as_deref())?,
        USER_INPUT => form_content(prompt, &answer.form)?,
        other => return Err(InteractiveError::Unsupported(other.to_string())),
    };

    Ok(ChatStreamRequest::new(vec![ChatMessage::user(content)])
        .with_chat_id(chat_id)
        .with_detail(detail))
}

fn selection_content(
    prompt: &Interactive,
    message: Option<&str>,
) -> Result<String, InteractiveError> {
    let selection = message
        .filter(|m| !m.is_empty())
        .ok_or(InteractiveError::MissingSelection)?;

    let options = prompt.params.user_select_options.as_deref().unwrap_or_default();
    if options.iter().any(|o| o.value == selection) {
        return Ok(selection.to_string());
    }

    Err(InteractiveError::OutOfRange {
        selection: selection.to_string(),
        options: options.iter().map(|o| o.value.clone()).collect(),
    })
}

fn form_content(prompt: &Interactive, form: &Variables) -> Result<String, InteractiveError> {
    if form.is_empty() {
        return Err(InteractiveError::EmptyForm);
    }

    let descriptors = prompt
        .params
        .input_form
        .as_deref()
        .filter(|d| !d.is_empty())
        .ok_or(InteractiveError::MissingFormDescriptors)?;

    validate_form_fields(form, descriptors)?;

    serde_json::to_string(form).map_err(|e| InteractiveError::Serialization(e.to_string()))
}

/// Reject unknown keys first, then missing required keys; each error lists
/// every offending key in sorted order
fn validate_form_fields(
    form: &Variables,
    descriptors: &[InputFormItem],
) -> Result<(), InteractiveError> {
    let known: HashSet<&str> = descriptors.iter().map(|d| d.key.as_str()).collect();

    let unknown: BTreeSet<&str> = form
        .keys()
        .map(String::as_str)
        .filter(|k| !known.contains(k))
        .collect();
    if !unknown.is_empty() {
        return Err(InteractiveError::UnknownFields {
            fields: unknown.into_iter().map(str::to_string).collect(),
        });
    }

    let missing: BTreeSet<&str> = descriptors
        .iter()
        .filter(|d| d.required && !form.contains_key(&d.key))
        .map(|d| d.key.as_str())
        .collect();
    if !missing.is_empty() {
        return Err(InteractiveError::MissingRequiredFields {
            fields: missing.into_iter().map(str::to_string).collect(),
        });
    }

    Ok(())
}
