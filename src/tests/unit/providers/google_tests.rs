//! Google Provider Unit Tests (API Key-based)
//!
//! Tests for the Google provider against a mock Generative Language API:
//! - API request formatting
//! - Response parsing
//! - Error mapping

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::core::generation::{ExecutorConfig, FlowExecutor, FlowRegistry, GenerationError};
use crate::core::llm::providers::GoogleProvider;
use crate::core::llm::{ModelProvider, ModelRequest, ProviderError};

const KEY: &str = "AIzaTestApiKey";

fn provider(server: &MockServer) -> GoogleProvider {
    GoogleProvider::new(KEY.to_string(), "gemini-2.0-flash".to_string())
        .with_image_model("gemini-image".to_string())
        .with_base_url(server.uri())
}

fn text_candidate(text: &str) -> serde_json::Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
}

// =============================================================================
// Provider Identity Tests
// =============================================================================

#[test]
fn test_provider_id() {
    let provider = GoogleProvider::new(KEY.to_string(), "gemini-2.0-flash".to_string());
    assert_eq!(provider.id(), "google");
    assert_eq!(provider.model(), "gemini-2.0-flash");
}

// =============================================================================
// Request Formatting and Response Parsing
// =============================================================================

#[tokio::test]
async fn test_text_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
        .and(header("x-goog-api-key", KEY))
        .and(body_partial_json(json!({
            "contents": [{ "role": "user", "parts": [{ "text": "Write a prophecy" }] }],
            "generationConfig": { "responseMimeType": "application/json" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_candidate("{\"prophecy\": \"...\"}")))
        .expect(1)
        .mount(&server)
        .await;

    let reply = provider(&server)
        .invoke(ModelRequest::text("Write a prophecy"))
        .await
        .unwrap();

    assert_eq!(reply.content, "{\"prophecy\": \"...\"}");
    assert_eq!(reply.media_url, None);
    assert_eq!(reply.provider, "google");
    assert_eq!(reply.model, "gemini-2.0-flash");
}

#[tokio::test]
async fn test_image_request_uses_image_model() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-image:generateContent"))
        .and(body_partial_json(json!({
            "generationConfig": { "responseModalities": ["TEXT", "IMAGE"] }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": {
                    "parts": [
                        { "text": "Here is your map." },
                        { "inlineData": { "mimeType": "image/png", "data": "iVBORw0KGgo" } }
                    ]
                }
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let reply = provider(&server)
        .invoke(ModelRequest::image("a harbor town"))
        .await
        .unwrap();

    assert_eq!(reply.media_url.as_deref(), Some("data:image/png;base64,iVBORw0KGgo"));
    assert_eq!(reply.model, "gemini-image");
}

// =============================================================================
// Error Handling
// =============================================================================

#[tokio::test]
async fn test_rate_limit_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "30"))
        .mount(&server)
        .await;

    let err = provider(&server)
        .invoke(ModelRequest::text("x"))
        .await
        .unwrap_err();
    assert_eq!(err, ProviderError::RateLimited { retry_after_secs: 30 });
}

#[tokio::test]
async fn test_invalid_api_key_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_string("API key not valid"))
        .mount(&server)
        .await;

    let err = provider(&server)
        .invoke(ModelRequest::text("x"))
        .await
        .unwrap_err();
    assert_eq!(err, ProviderError::Auth("API key not valid".to_string()));
}

#[tokio::test]
async fn test_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let err = provider(&server)
        .invoke(ModelRequest::text("x"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ProviderError::Api {
            status: 503,
            message: "overloaded".to_string()
        }
    );
}

#[tokio::test]
async fn test_blocked_prompt_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        })))
        .mount(&server)
        .await;

    let err = provider(&server)
        .invoke(ModelRequest::text("x"))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::InvalidResponse(_)));
}

// =============================================================================
// Through the executor
// =============================================================================

#[tokio::test]
async fn test_executor_timeout_against_slow_server() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(text_candidate("{}"))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let executor = FlowExecutor::new(FlowRegistry::builtin(), Arc::new(provider(&server)))
        .with_config(ExecutorConfig {
            provider_timeout: Duration::from_millis(100),
            ..Default::default()
        });

    let err = executor
        .execute("book-passage", &json!({"bookTitle": "The Ashen Codex"}))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        GenerationError::Timeout {
            flow: "book-passage".to_string()
        }
    );
}

#[tokio::test]
async fn test_executor_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_candidate(
            "{\"passage\": \"Salt crusted the final page.\"}",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let executor = FlowExecutor::new(FlowRegistry::builtin(), Arc::new(provider(&server)));
    let outcome = executor
        .execute("book-passage", &json!({"bookTitle": "The Ashen Codex"}))
        .await
        .unwrap();

    assert_eq!(outcome.provider, "google");
    assert_eq!(outcome.raw, json!({"passage": "Salt crusted the final page."}));
}
