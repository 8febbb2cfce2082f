//! HTTP tests for the retrieval and judge clients.
//!
//! Uses wiremock to stand in for the OpenAI-compatible chat-completions API.

use std::time::Duration;

use appcheck_core::{
    ChatClient, JudgeRequest, JudgeService, LlmJudgeClient, RagClient, RetrievalService,
    ServiceError,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [
            {"index": 0, "message": {"role": "assistant", "content": content}, "finish_reason": "stop"}
        ]
    })
}

fn chat(server: &MockServer, model: Option<&str>) -> ChatClient {
    ChatClient::new(
        &server.uri(),
        model.map(str::to_string),
        Duration::from_secs(5),
    )
    .expect("failed to create client")
}

fn request<'a>() -> JudgeRequest<'a> {
    JudgeRequest {
        question: "Capital of France?",
        candidate_answer: "Paris",
        golden_answer: "Paris",
    }
}

#[tokio::test]
async fn rag_client_returns_first_choice() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({
            "model": "granite",
            "messages": [{"role": "user", "content": "Capital of France?"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("  Paris\n")))
        .expect(1)
        .mount(&server)
        .await;

    let client = RagClient::new(chat(&server, Some("granite")));
    let answer = client.ask("Capital of France?").await.expect("answer");
    assert_eq!(answer, "Paris");
}

#[tokio::test]
async fn rag_client_maps_http_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("model loading"))
        .mount(&server)
        .await;

    let err = RagClient::new(chat(&server, None))
        .ask("q")
        .await
        .unwrap_err();
    match err {
        ServiceError::Status { status, body, .. } => {
            assert_eq!(status, 503);
            assert_eq!(body, "model loading");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn rag_client_rejects_empty_answer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("   ")))
        .mount(&server)
        .await;

    let err = RagClient::new(chat(&server, None)).ask("q").await.unwrap_err();
    assert!(matches!(err, ServiceError::Decode { .. }));
}

#[tokio::test]
async fn rag_client_rejects_response_without_choices() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let err = RagClient::new(chat(&server, None)).ask("q").await.unwrap_err();
    assert!(matches!(err, ServiceError::Decode { .. }));
}

#[tokio::test]
async fn unreachable_service_is_transport_error() {
    let client = ChatClient::new("http://127.0.0.1:1", None, Duration::from_secs(2))
        .expect("failed to create client");
    let err = RagClient::new(client).ask("q").await.unwrap_err();
    assert!(matches!(err, ServiceError::Transport { .. }));
}

#[tokio::test]
async fn judge_client_sends_system_prompt_and_parses_verdict() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({"temperature": 0.0})))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            "Decision: {\"verdict\": \"YES\", \"reason\": \"same city\"}",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let client = LlmJudgeClient::new(chat(&server, None).with_temperature(0.0));
    let raw = client.judge(&request()).await.expect("judgement");
    assert_eq!(raw.verdict, "YES");
    assert_eq!(raw.reason, "same city");

    let received = server.received_requests().await.expect("recording enabled");
    let body: serde_json::Value = received[0].body_json().expect("json body");
    assert_eq!(body["messages"][0]["role"], "system");
    assert!(body["messages"][1]["content"]
        .as_str()
        .expect("content")
        .contains("Capital of France?"));
}

#[tokio::test]
async fn judge_client_reports_malformed_output() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("YES")))
        .mount(&server)
        .await;

    let client = LlmJudgeClient::new(chat(&server, None));
    let err = client.judge(&request()).await.unwrap_err();
    assert!(matches!(err, ServiceError::MalformedOutput(_)));
}

#[tokio::test]
async fn judge_client_passes_through_invalid_verdict_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion(r#"{"verdict": "MAYBE", "reason": "unclear"}"#)),
        )
        .mount(&server)
        .await;

    let client = LlmJudgeClient::new(chat(&server, None));
    let raw = client.judge(&request()).await.expect("raw judgement");
    assert_eq!(raw.verdict, "MAYBE");
}
