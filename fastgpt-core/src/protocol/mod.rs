//! Wire data model for the FastGPT chat API
//!
//! This module defines the request, response and streaming payload types.
//! They are:
//! - Plain serde values with no behaviour beyond small accessors
//! - Camel-cased on the wire, tolerant of snake_case variants FastGPT emits
//! - Lenient about numbers sent as strings

pub mod events;
pub mod lenient;
pub mod request;
pub mod response;

pub use events::{
    AnswerDelta, ChatNodeDetail, CompleteMessage, DatasetSearchDetail, DeltaChoice, ErrorEvent,
    FlowNodeResponse, FlowNodeStatus, HttpNodeDetail, InputFormItem, Interactive,
    InteractiveEvent, InteractiveParams, ListItem, MessageDelta, NodeStatus, QuoteItem, ToolCall,
    ToolParams, ToolResponse, UserSelectOption, USER_INPUT, USER_SELECT,
};
pub use request::{
    ChatHistoryRequest, ChatMessage, ChatStreamRequest, ContentItem, ImageUrl, RequestBody,
    UpdateHistoryRequest, Variables, USER_ROLE,
};
pub use response::{
    ApiResponse, ChatHistoryItem, ChatHistoryResponse, ChatResponse, EmptyResponse, PagedList,
    ResponseChoice, ResponseMessage, Usage,
};
