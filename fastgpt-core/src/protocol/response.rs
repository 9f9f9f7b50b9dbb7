//! Response types for non-streaming calls and the chat history endpoints

use super::events::FlowNodeResponse;
use super::lenient;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Non-streaming chat completion response
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChatResponse {
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub model: String,
    pub usage: Option<Usage>,
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub choices: Vec<ResponseChoice>,
    /// Per-node execution records; only populated when `detail` was requested
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub response_data: Vec<FlowNodeResponse>,
}

impl ChatResponse {
    /// Text of the first choice, if it carries plain text content
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.as_ref())
            .and_then(|m| m.content.as_str())
    }
}

/// Token accounting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Usage {
    #[serde(alias = "prompt_tokens", deserialize_with = "lenient::number")]
    pub prompt_tokens: u32,
    #[serde(alias = "completion_tokens", deserialize_with = "lenient::number")]
    pub completion_tokens: u32,
    #[serde(alias = "total_tokens", deserialize_with = "lenient::number")]
    pub total_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResponseChoice {
    pub message: Option<ResponseMessage>,
    #[serde(alias = "finish_reason")]
    pub finish_reason: Option<String>,
    #[serde(deserialize_with = "lenient::number")]
    pub index: u32,
}

/// Assistant message of a non-streaming response
///
/// `content` is usually a string; interactive nodes answer with an array of
/// structured values, so it is kept as raw JSON.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseMessage {
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub role: String,
    pub content: Value,
}

/// Standard FastGPT envelope for management endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    #[serde(default, deserialize_with = "lenient::number")]
    pub code: i64,
    #[serde(default)]
    pub status_text: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// FastGPT reports success as code 200
    pub fn is_success(&self) -> bool {
        self.code == 200
    }
}

/// One page of a listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagedList<T> {
    #[serde(default = "Vec::new")]
    pub list: Vec<T>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub total: u64,
}

/// Summary of a stored chat
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChatHistoryItem {
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub chat_id: String,
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub app_id: String,
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub title: String,
    pub custom_title: Option<String>,
    /// RFC 3339 timestamp as sent by the service
    pub update_time: Option<String>,
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub top: bool,
}

impl ChatHistoryItem {
    /// Custom title when set, generated title otherwise
    pub fn display_title(&self) -> &str {
        self.custom_title
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(&self.title)
    }
}

/// Response of the history listing
pub type ChatHistoryResponse = ApiResponse<PagedList<ChatHistoryItem>>;

/// Response of management calls without a meaningful payload
pub type EmptyResponse = ApiResponse<Value>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_response_decodes_both_usage_spellings() {
        let camel = r#"{"id":"c1","model":"m","usage":{"promptTokens":1,"completionTokens":2,"totalTokens":3},
            "choices":[{"message":{"role":"assistant","content":"hi"},"finishReason":"stop","index":0}]}"#;
        let snake = r#"{"id":"c1","model":"m","usage":{"prompt_tokens":1,"completion_tokens":2,"total_tokens":3},
            "choices":[{"message":{"role":"assistant","content":"hi"},"finish_reason":"stop","index":0}]}"#;
        let a: ChatResponse = serde_json::from_str(camel).unwrap();
        let b: ChatResponse = serde_json::from_str(snake).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.usage.map(|u| u.total_tokens), Some(3));
        assert_eq!(a.text(), Some("hi"));
    }

    #[test]
    fn test_chat_response_with_detail_records() {
        let data = r#"{"id":"c1","model":"m","choices":[],
            "responseData":[{"nodeId":"n1","moduleName":"AI","runningTime":0.3,"totalPoints":"1.5"}]}"#;
        let response: ChatResponse = serde_json::from_str(data).unwrap();
        assert_eq!(response.response_data.len(), 1);
        assert_eq!(response.response_data[0].total_points, Some(1.5));
        assert_eq!(response.text(), None);
    }

    #[test]
    fn test_history_response() {
        let data = r#"{"code":200,"statusText":"","message":"","data":{"list":[
            {"chatId":"c1","appId":"a1","title":"Hello","customTitle":"Pinned","updateTime":"2024-05-01T10:00:00.000Z","top":true},
            {"chatId":"c2","appId":"a1","title":"Second","top":false}],"total":2}}"#;
        let response: ChatHistoryResponse = serde_json::from_str(data).unwrap();
        assert!(response.is_success());
        let page = response.data.unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.list[0].display_title(), "Pinned");
        assert_eq!(page.list[1].display_title(), "Second");
        assert!(page.list[1].update_time.is_none());
    }
}
