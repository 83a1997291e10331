//! Chat clients against an in-process mock: retry policy and the Anthropic
//! request shape.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use resume_tailor::config::LlmConfig;
use resume_tailor::llm::{AnthropicChat, ChatModel, LlmError, OpenAiChat};

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn config(base: &str, max_retries: u32) -> LlmConfig {
    LlmConfig {
        url: Some(base.to_string()),
        max_retries,
        timeout_secs: 10,
        ..Default::default()
    }
}

fn completion(text: &str) -> Value {
    json!({
        "choices": [{"message": {"role": "assistant", "content": text}}],
        "usage": {"prompt_tokens": 3, "completion_tokens": 2}
    })
}

/// Replies with the given statuses in order, then succeeds.
async fn start_flaky(statuses: Vec<u16>) -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let statuses = Arc::new(statuses);
    let app = Router::new()
        .route(
            "/v1/chat/completions",
            post(
                |State((hits, statuses)): State<(Arc<AtomicUsize>, Arc<Vec<u16>>)>| async move {
                    let n = hits.fetch_add(1, Ordering::SeqCst);
                    match statuses.get(n) {
                        Some(&code) => (
                            StatusCode::from_u16(code).unwrap(),
                            Json(json!({"error": {"message": format!("status {}", code)}})),
                        ),
                        None => (StatusCode::OK, Json(completion("hello"))),
                    }
                },
            ),
        )
        .with_state((hits.clone(), statuses));
    (serve(app).await, hits)
}

#[tokio::test]
async fn rate_limits_and_server_errors_are_retried() {
    let (base, hits) = start_flaky(vec![429, 503]).await;
    let chat = OpenAiChat::new(&config(&base, 2), "key".into()).unwrap();

    let reply = chat.complete(None, "hi").await.unwrap();

    assert_eq!(reply, "hello");
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn client_errors_fail_without_retry() {
    for code in [400u16, 401] {
        let (base, hits) = start_flaky(vec![code; 4]).await;
        let chat = OpenAiChat::new(&config(&base, 3), "key".into()).unwrap();

        match chat.complete(None, "hi").await {
            Err(LlmError::Api { status, message }) => {
                assert_eq!(status, code);
                assert_eq!(message, format!("status {}", code));
            }
            other => panic!("expected an API error, got {:?}", other.map(|_| ())),
        }
        assert_eq!(hits.load(Ordering::SeqCst), 1, "status {}", code);
    }
}

#[tokio::test]
async fn persistent_server_errors_exhaust_retries() {
    let (base, hits) = start_flaky(vec![503; 10]).await;
    let chat = OpenAiChat::new(&config(&base, 1), "key".into()).unwrap();

    match chat.complete(None, "hi").await {
        Err(LlmError::RetriesExhausted { retries, last }) => {
            assert_eq!(retries, 1);
            assert!(matches!(*last, LlmError::Api { status: 503, .. }));
        }
        other => panic!("expected exhausted retries, got {:?}", other.map(|_| ())),
    }
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn without_retries_the_error_is_returned_as_is() {
    let (base, hits) = start_flaky(vec![500]).await;
    let chat = OpenAiChat::new(&config(&base, 0), "key".into()).unwrap();

    let err = chat.complete(None, "hi").await.unwrap_err();

    assert!(matches!(err, LlmError::Api { status: 500, .. }));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

type Captured = Arc<Mutex<Option<(HeaderMap, Value)>>>;

#[tokio::test]
async fn anthropic_sends_key_version_and_system() {
    let captured: Captured = Arc::new(Mutex::new(None));
    let app = Router::new()
        .route(
            "/v1/messages",
            post(
                |State(captured): State<Captured>, headers: HeaderMap, Json(body): Json<Value>| async move {
                    *captured.lock().unwrap() = Some((headers, body));
                    Json(json!({
                        "content": [
                            {"type": "thinking", "thinking": "..."},
                            {"type": "text", "text": "{\"ok\": true}"}
                        ],
                        "usage": {"input_tokens": 5, "output_tokens": 4}
                    }))
                },
            ),
        )
        .with_state(captured.clone());
    let base = serve(app).await;

    let mut cfg = config(&base, 0);
    cfg.provider = "anthropic".into();
    cfg.model = Some("claude-test".into());
    let chat = AnthropicChat::new(&cfg, "secret".into()).unwrap();

    let reply = chat.complete(Some("be terse"), "hello").await.unwrap();
    assert_eq!(reply, "{\"ok\": true}");

    let (headers, body) = captured.lock().unwrap().take().unwrap();
    assert_eq!(headers["x-api-key"], "secret");
    assert_eq!(headers["anthropic-version"], "2023-06-01");
    assert_eq!(body["model"], "claude-test");
    assert_eq!(body["system"], "be terse");
    assert_eq!(body["messages"][0]["role"], "user");
    assert_eq!(body["messages"][0]["content"], "hello");
    assert!(body["max_tokens"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn anthropic_reply_without_text_is_empty_content() {
    let app = Router::new().route(
        "/v1/messages",
        post(|| async { Json(json!({"content": [{"type": "tool_use", "id": "x"}]})) }),
    );
    let base = serve(app).await;
    let chat = AnthropicChat::new(&config(&base, 0), "secret".into()).unwrap();

    let err = chat.complete(None, "hello").await.unwrap_err();
    assert!(matches!(err, LlmError::EmptyContent));
}
