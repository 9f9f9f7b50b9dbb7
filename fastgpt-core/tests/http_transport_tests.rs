//! HttpTransport tests against a mocked FastGPT server

use fastgpt_core::protocol::{ChatHistoryRequest, ChatMessage, ChatStreamRequest, UpdateHistoryRequest};
use fastgpt_core::sse::{decode_stream, DecodePolicy, EventPayload};
use fastgpt_core::{CancellationToken, ChatTransport, FastGptConfig, HttpTransport, TransportError};
use futures::StreamExt;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SSE_BODY: &str = "event: flowNodeStatus\ndata: {\"status\":\"running\",\"name\":\"AI 对话\"}\n\n\
event: answer\ndata: {\"id\":\"\",\"object\":\"\",\"created\":0,\"choices\":[{\"delta\":{\"role\":\"assistant\",\"content\":\"Hello\"},\"index\":0,\"finish_reason\":null}]}\n\n\
event: answer\ndata: [DONE]\n\n";

/// Transport pointed at the mock server with one configured app
fn transport(server: &MockServer) -> HttpTransport {
    let config = FastGptConfig::new(server.uri(), "fastgpt-global").with_app(
        "support",
        "app-1",
        "fastgpt-support",
    );
    HttpTransport::new(config).expect("valid config")
}

fn text_request() -> ChatStreamRequest {
    ChatStreamRequest::new(vec![ChatMessage::user("hi")])
        .with_chat_id("c1")
        .with_detail(true)
}

#[tokio::test]
async fn test_send_uses_app_key_and_stream_false() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v2/chat/completions"))
        .and(header("authorization", "Bearer fastgpt-support"))
        .and(header_exists("x-request-id"))
        .and(body_partial_json(json!({
            "chatId": "c1",
            "detail": true,
            "stream": false,
            "messages": [{"role": "user", "content": "hi"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "c1",
            "model": "",
            "usage": {"prompt_tokens": 1, "completion_tokens": 1, "total_tokens": 2},
            "choices": [{"message": {"role": "assistant", "content": "Hello"}, "finish_reason": "stop", "index": 0}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = transport(&server)
        .send("support", &text_request())
        .await
        .unwrap();
    assert_eq!(response.text(), Some("Hello"));
    assert_eq!(response.usage.map(|u| u.total_tokens), Some(2));
}

#[tokio::test]
async fn test_empty_app_uses_global_key() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v2/chat/completions"))
        .and(header("authorization", "Bearer fastgpt-global"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "x", "choices": []})))
        .expect(1)
        .mount(&server)
        .await;

    let response = transport(&server).send("", &text_request()).await.unwrap();
    assert_eq!(response.id, "x");
}

#[tokio::test]
async fn test_unknown_app_fails_before_sending() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = transport(&server)
        .send("billing", &text_request())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        TransportError::UnknownApp {
            app: "billing".to_string()
        }
    );
}

#[tokio::test]
async fn test_send_stream_yields_sse_bytes() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v2/chat/completions"))
        .and(body_partial_json(json!({"stream": true})))
        .respond_with(ResponseTemplate::new(200).set_body_raw(SSE_BODY, "text/event-stream"))
        .mount(&server)
        .await;

    let bytes = transport(&server)
        .send_stream("support", &text_request())
        .await
        .unwrap();
    let events: Vec<_> = decode_stream(bytes, DecodePolicy::Surface, CancellationToken::new())
        .collect()
        .await;

    assert_eq!(events.len(), 3);
    let events: Vec<_> = events.into_iter().map(|e| e.unwrap()).collect();
    assert!(matches!(events[0].payload, EventPayload::FlowNodeStatus(_)));
    assert_eq!(events[1].answer_text().as_deref(), Some("Hello"));
    assert!(events[2].is_done());
}

#[tokio::test]
async fn test_stream_answered_with_json_envelope() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 403,
            "statusText": "unAuthApiKey",
            "message": "API key is invalid"
        })))
        .mount(&server)
        .await;

    match transport(&server).send_stream("support", &text_request()).await {
        Err(TransportError::Api { code, message }) => {
            assert_eq!(code, 403);
            assert!(message.starts_with("API key is invalid"));
        }
        Err(other) => panic!("unexpected error {:?}", other),
        Ok(_) => panic!("expected an error"),
    }
}

#[tokio::test]
async fn test_status_errors_are_mapped() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header("authorization", "Bearer fastgpt-global"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "code": 401,
            "statusText": "unAuthorization",
            "message": "Invalid token"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(header("authorization", "Bearer fastgpt-support"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let transport = transport(&server);

    match transport.send("", &text_request()).await {
        Err(TransportError::Authentication { message }) => {
            assert!(message.starts_with("Invalid token"));
            assert!(message.contains("request_id"));
        }
        other => panic!("unexpected result {:?}", other),
    }

    match transport.send("support", &text_request()).await {
        Err(TransportError::ServerError {
            status_code,
            message,
        }) => {
            assert_eq!(status_code, 500);
            assert!(message.starts_with("upstream exploded"));
        }
        other => panic!("unexpected result {:?}", other),
    }
}

#[tokio::test]
async fn test_get_histories_fills_app_id() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/core/chat/getHistories"))
        .and(body_partial_json(json!({
            "appId": "app-1",
            "offset": 0,
            "pageSize": 20,
            "source": "api"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 200,
            "statusText": "",
            "message": "",
            "data": {
                "list": [{"chatId": "c1", "appId": "app-1", "title": "Hello", "top": false}],
                "total": 1
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = transport(&server)
        .get_histories("support", ChatHistoryRequest::new(0, 20).with_source("api"))
        .await
        .unwrap();
    let page = response.data.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.list[0].chat_id, "c1");
}

#[tokio::test]
async fn test_update_history_failure_envelope() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/core/chat/updateHistory"))
        .and(body_partial_json(json!({"appId": "app-1", "chatId": "c1", "title": "Renamed"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 500,
            "statusText": "",
            "message": "chat not found",
            "data": null
        })))
        .mount(&server)
        .await;

    let err = transport(&server)
        .update_history("support", UpdateHistoryRequest::new("c1", "Renamed"))
        .await
        .unwrap_err();
    match err {
        TransportError::Api { code, message } => {
            assert_eq!(code, 500);
            assert!(message.starts_with("chat not found"));
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn test_history_without_app_id_is_rejected() {
    let server = MockServer::start().await;

    let err = transport(&server)
        .get_histories("", ChatHistoryRequest::new(0, 10))
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::InvalidRequest { .. }));
}
