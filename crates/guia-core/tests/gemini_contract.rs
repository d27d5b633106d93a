//! Gemini provider contract tests.
//!
//! Verify the generateContent request shape, response parsing and error
//! classification against a mock server, then the full query path on top.

use std::sync::Arc;

use guia_core::query::{build_prompt, SYSTEM_INSTRUCTION};
use guia_core::{GeminiClient, GenerateError, Generator, QueryService, ServiceError};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GENERATE_PATH: &str = "/v1beta/models/gemini-2.5-flash:generateContent";

fn client(server: &MockServer) -> GeminiClient {
    GeminiClient::new("test-key").with_base_url(&server.uri())
}

fn grounded_body() -> serde_json::Value {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": "Consulte o Regimento Interno."}]},
            "groundingMetadata": {
                "groundingChunks": [
                    {"web": {"uri": "https://ffm.br/regimento.pdf", "title": "Regimento Interno"}},
                    {"web": {"uri": "https://example.com/blog", "title": "Blog"}},
                    {"web": {"uri": "https://ffm.br/regimento.pdf", "title": "Regimento Interno"}},
                    {"web": {"uri": "https://ffm.br/faq"}}
                ]
            }
        }]
    })
}

#[tokio::test]
async fn test_request_carries_instruction_prompt_and_search_tool() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(json!({
            "systemInstruction": {"parts": [{"text": "sys"}]},
            "contents": [{"role": "user", "parts": [{"text": "prompt"}]}],
            "tools": [{"googleSearch": {}}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(grounded_body()))
        .expect(1)
        .mount(&server)
        .await;

    let generation = client(&server).generate("sys", "prompt").await.unwrap();

    assert_eq!(generation.text, "Consulte o Regimento Interno.");
    assert_eq!(generation.citations.len(), 4);
}

#[tokio::test]
async fn test_custom_model_in_path() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-pro:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(grounded_body()))
        .expect(1)
        .mount(&server)
        .await;

    let result = client(&server)
        .with_model("gemini-2.5-pro")
        .generate("sys", "prompt")
        .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_invalid_key_is_classified() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "code": 400,
                "message": "API key not valid. Please pass a valid API key.",
                "status": "INVALID_ARGUMENT",
                "details": [{
                    "@type": "type.googleapis.com/google.rpc.ErrorInfo",
                    "reason": "API_KEY_INVALID",
                    "domain": "googleapis.com"
                }]
            }
        })))
        .mount(&server)
        .await;

    let err = client(&server).generate("sys", "prompt").await.unwrap_err();
    assert!(matches!(err, GenerateError::InvalidCredential(_)));
}

#[tokio::test]
async fn test_quota_and_malformed_are_request_errors() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": {"code": 429, "message": "Resource has been exhausted", "status": "RESOURCE_EXHAUSTED"}
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let gemini = client(&server);
    assert!(matches!(
        gemini.generate("sys", "prompt").await,
        Err(GenerateError::Request(_))
    ));
    assert!(matches!(
        gemini.generate("sys", "prompt").await,
        Err(GenerateError::Request(_))
    ));
}

#[tokio::test]
async fn test_unreachable_server_is_request_error() {
    let gemini = GeminiClient::new("test-key").with_base_url("http://127.0.0.1:9");
    assert!(matches!(
        gemini.generate("sys", "prompt").await,
        Err(GenerateError::Request(_))
    ));
}

#[tokio::test]
async fn test_query_service_over_gemini() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(body_partial_json(json!({
            "systemInstruction": {"parts": [{"text": SYSTEM_INSTRUCTION}]},
            "contents": [{"role": "user", "parts": [{"text": build_prompt("Onde está o regimento?")}]}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(grounded_body()))
        .expect(1)
        .mount(&server)
        .await;

    let service = QueryService::new(Arc::new(client(&server)));
    let answer = service.run_query("Onde está o regimento?").await.unwrap();

    assert_eq!(answer.text, "Consulte o Regimento Interno.");
    let uris: Vec<&str> = answer.sources.iter().map(|s| s.uri.as_str()).collect();
    assert_eq!(uris, ["https://ffm.br/regimento.pdf", "https://ffm.br/faq"]);
    assert_eq!(answer.sources[0].title, "Regimento Interno");
    assert_eq!(answer.sources[1].title, "Fonte desconhecida");
}

#[tokio::test]
async fn test_query_service_surfaces_invalid_key() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"code": 400, "message": "API key not valid. Please pass a valid API key."}
        })))
        .mount(&server)
        .await;

    let service = QueryService::new(Arc::new(client(&server)));
    assert_eq!(
        service.run_query("x").await,
        Err(ServiceError::InvalidCredential)
    );
}
