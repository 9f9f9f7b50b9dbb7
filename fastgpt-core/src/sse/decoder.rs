//! Typed decoding of SSE records by event tag

use super::envelope::SseRecord;
use crate::protocol::{
    AnswerDelta, ErrorEvent, FlowNodeResponse, FlowNodeStatus, Interactive, InteractiveEvent,
    ToolCall, ToolParams, ToolResponse,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Event tags emitted by FastGPT
pub mod tags {
    pub const ANSWER: &str = "answer";
    pub const FAST_ANSWER: &str = "fastAnswer";
    pub const FLOW_NODE_STATUS: &str = "flowNodeStatus";
    pub const FLOW_RESPONSES: &str = "flowResponses";
    pub const INTERACTIVE: &str = "interactive";
    pub const TOOL_CALL: &str = "toolCall";
    pub const TOOL_PARAMS: &str = "toolParams";
    pub const TOOL_RESPONSE: &str = "toolResponse";
    pub const UPDATE_VARIABLES: &str = "updateVariables";
    pub const ERROR: &str = "Error";
    pub const MESSAGE: &str = "message";
}

/// End-of-answer sentinel
pub const DONE: &str = "[DONE]";

/// Longest payload excerpt kept in a [`DecodeError`]
const MAX_ERROR_DATA: usize = 256;

/// A decoded stream event
#[derive(Debug, Clone, PartialEq)]
pub struct ChatEvent {
    pub tag: String,
    pub payload: EventPayload,
}

/// Payload of a [`ChatEvent`], one variant per known tag
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    Answer(AnswerDelta),
    FlowNodeStatus(FlowNodeStatus),
    FlowResponses(Vec<FlowNodeResponse>),
    Interactive(Interactive),
    ToolCall(ToolCall),
    ToolParams(ToolParams),
    ToolResponse(ToolResponse),
    UpdateVariables(HashMap<String, Value>),
    Error(ErrorEvent),
    /// Unknown tags, `fastAnswer`, untagged records and the `[DONE]` sentinel
    Raw(String),
}

impl ChatEvent {
    pub fn new(tag: impl Into<String>, payload: EventPayload) -> Self {
        Self {
            tag: tag.into(),
            payload,
        }
    }

    /// True for the `[DONE]` sentinel
    pub fn is_done(&self) -> bool {
        matches!(&self.payload, EventPayload::Raw(data) if data.trim() == DONE)
    }

    /// Text carried by an answer delta
    pub fn answer_text(&self) -> Option<String> {
        match &self.payload {
            EventPayload::Answer(delta) => Some(delta.content()),
            _ => None,
        }
    }

    pub fn interactive(&self) -> Option<&Interactive> {
        match &self.payload {
            EventPayload::Interactive(prompt) => Some(prompt),
            _ => None,
        }
    }
}

/// A record whose payload did not match its tag's schema
#[derive(Debug, Error)]
#[error("Failed to decode '{tag}' event as {schema}: {source} (data: {data})")]
pub struct DecodeError {
    pub tag: String,
    /// Name of the expected payload shape
    pub schema: &'static str,
    /// Payload excerpt
    pub data: String,
    #[source]
    pub source: serde_json::Error,
}

fn truncate(data: &str) -> String {
    if data.len() <= MAX_ERROR_DATA {
        return data.to_string();
    }
    let mut end = MAX_ERROR_DATA;
    while !data.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &data[..end])
}

fn parse<T: DeserializeOwned>(
    record: &SseRecord,
    schema: &'static str,
    wrap: fn(T) -> EventPayload,
) -> Result<EventPayload, DecodeError> {
    serde_json::from_str::<T>(&record.data)
        .map(wrap)
        .map_err(|source| DecodeError {
            tag: record.event.clone(),
            schema,
            data: truncate(&record.data),
            source,
        })
}

fn interactive(event: InteractiveEvent) -> EventPayload {
    EventPayload::Interactive(event.interactive)
}

/// Decode one record by exact tag match
pub fn decode(record: SseRecord) -> Result<ChatEvent, DecodeError> {
    if record.data.trim() == DONE {
        return Ok(ChatEvent::new(record.event, EventPayload::Raw(record.data)));
    }

    let payload = match record.event.as_str() {
        tags::ANSWER => parse(&record, "answer-delta", EventPayload::Answer)?,
        tags::FLOW_NODE_STATUS => {
            parse(&record, "flow-node-status", EventPayload::FlowNodeStatus)?
        }
        tags::FLOW_RESPONSES => parse(&record, "flow-node-detail[]", EventPayload::FlowResponses)?,
        tags::INTERACTIVE => parse(&record, "interactive", interactive)?,
        tags::TOOL_CALL => parse(&record, "tool-call", EventPayload::ToolCall)?,
        tags::TOOL_PARAMS => parse(&record, "tool-params", EventPayload::ToolParams)?,
        tags::TOOL_RESPONSE => parse(&record, "tool-response", EventPayload::ToolResponse)?,
        tags::UPDATE_VARIABLES => {
            parse(&record, "variable-update", EventPayload::UpdateVariables)?
        }
        tags::ERROR => parse(&record, "error", EventPayload::Error)?,
        _ => {
            return Ok(ChatEvent::new(record.event, EventPayload::Raw(record.data)));
        }
    };

    Ok(ChatEvent::new(record.event, payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::NodeStatus;
    use test_case::test_case;

    fn decode_ok(tag: &str, data: &str) -> ChatEvent {
        decode(SseRecord::new(tag, data)).unwrap()
    }

    #[test]
    fn test_answer_delta() {
        let event = decode_ok(
            tags::ANSWER,
            r#"{"id":"","object":"","created":0,"choices":[{"delta":{"role":"assistant","content":"Hel"},"index":0,"finish_reason":null}]}"#,
        );
        assert_eq!(event.tag, "answer");
        assert_eq!(event.answer_text().as_deref(), Some("Hel"));
        assert!(!event.is_done());
    }

    #[test]
    fn test_null_valued_fields_decode() {
        let event = decode_ok(
            tags::ANSWER,
            r#"{"id":"","object":"","created":0,"choices":[{"delta":{"role":"assistant","content":null},"index":0,"finish_reason":"stop"}]}"#,
        );
        assert_eq!(event.answer_text().as_deref(), Some(""));

        let event = decode_ok(
            tags::TOOL_CALL,
            r#"{"nodeId":"n","toolName":"search","toolAvatar":null}"#,
        );
        assert!(matches!(event.payload, EventPayload::ToolCall(ref c) if c.tool_avatar.is_empty()));

        let event = decode_ok(
            tags::INTERACTIVE,
            r#"{"interactive":{"type":"userSelect","params":{"description":null,"userSelectOptions":[{"key":"a","value":"Yes"}]}}}"#,
        );
        assert_eq!(event.interactive().map(|i| i.params.description.as_str()), Some(""));
    }

    #[test]
    fn test_done_sentinel_is_raw() {
        let event = decode_ok(tags::ANSWER, "[DONE]");
        assert_eq!(event.payload, EventPayload::Raw("[DONE]".to_string()));
        assert!(event.is_done());
    }

    #[test]
    fn test_flow_node_status_without_message() {
        let event = decode_ok(tags::FLOW_NODE_STATUS, r#"{"status":"running","name":"n1"}"#);
        match event.payload {
            EventPayload::FlowNodeStatus(status) => {
                assert_eq!(status.status, NodeStatus::Running);
                assert_eq!(status.name, "n1");
                assert!(status.message.is_none());
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn test_flow_responses_with_numeric_strings() {
        let event = decode_ok(
            tags::FLOW_RESPONSES,
            r#"[{"nodeId":"n1","moduleName":"AI 对话","inputTokens":"12","totalPoints":"0.5"}]"#,
        );
        match event.payload {
            EventPayload::FlowResponses(nodes) => {
                assert_eq!(nodes.len(), 1);
                assert_eq!(nodes[0].input_tokens, Some(12));
                assert_eq!(nodes[0].total_points, Some(0.5));
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn test_interactive_is_unwrapped() {
        let event = decode_ok(
            tags::INTERACTIVE,
            r#"{"interactive":{"type":"userSelect","params":{"description":"pick","userSelectOptions":[{"key":"a","value":"option1"}]}}}"#,
        );
        let prompt = event.interactive().unwrap();
        assert_eq!(prompt.kind, "userSelect");
        assert_eq!(prompt.params.user_select_options.as_ref().unwrap()[0].value, "option1");
    }

    #[test]
    fn test_update_variables() {
        let event = decode_ok(tags::UPDATE_VARIABLES, r#"{"city":"Paris","count":2}"#);
        match event.payload {
            EventPayload::UpdateVariables(vars) => {
                assert_eq!(vars["city"], "Paris");
                assert_eq!(vars["count"], 2);
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test_case("message", r#"{"choices":[]}"# ; "untagged record")]
    #[test_case("fastAnswer", "quick reply" ; "fast answer")]
    #[test_case("someFutureTag", "{not json" ; "unknown tag")]
    fn test_raw_passthrough(tag: &str, data: &str) {
        let event = decode_ok(tag, data);
        assert_eq!(event.tag, tag);
        assert_eq!(event.payload, EventPayload::Raw(data.to_string()));
    }

    #[test_case(tags::ANSWER, "answer-delta" ; "answer")]
    #[test_case(tags::FLOW_NODE_STATUS, "flow-node-status" ; "flow node status")]
    #[test_case(tags::FLOW_RESPONSES, "flow-node-detail[]" ; "flow responses")]
    #[test_case(tags::TOOL_CALL, "tool-call" ; "tool call")]
    #[test_case(tags::ERROR, "error" ; "error")]
    fn test_malformed_payload(tag: &str, schema: &str) {
        let err = decode(SseRecord::new(tag, "{broken")).unwrap_err();
        assert_eq!(err.tag, tag);
        assert_eq!(err.schema, schema);
        assert_eq!(err.data, "{broken");
    }

    #[test]
    fn test_error_data_is_truncated() {
        let data = format!("[{}", "é".repeat(400));
        let err = decode(SseRecord::new(tags::FLOW_RESPONSES, data)).unwrap_err();
        assert!(err.data.ends_with("..."));
        assert!(err.data.len() <= MAX_ERROR_DATA + 3);
    }

    #[test]
    fn test_error_event_shapes() {
        let flat = decode_ok(tags::ERROR, r#"{"message":"quota exceeded","code":"402"}"#);
        let nested = decode_ok(tags::ERROR, r#"{"error":{"message":"quota exceeded","code":402}}"#);
        assert_eq!(flat.payload, nested.payload);
    }
}
