use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Citation, Generation, Generator};
use crate::config::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::error::GenerateError;

#[derive(Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Serialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Default)]
struct GoogleSearch {}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTool {
    google_search: GoogleSearch,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    system_instruction: GeminiContent,
    contents: Vec<GeminiContent>,
    tools: Vec<GeminiTool>,
}

#[derive(Deserialize, Default)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize, Default)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct WebChunk {
    uri: Option<String>,
    title: Option<String>,
}

#[derive(Deserialize)]
struct GroundingChunk {
    web: Option<WebChunk>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: ResponseContent,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    reason: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    details: Vec<ErrorDetail>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl Generator for GeminiClient {
    async fn generate(
        &self,
        system_instruction: &str,
        prompt: &str,
    ) -> Result<Generation, GenerateError> {
        let request = GeminiRequest {
            system_instruction: GeminiContent {
                role: None,
                parts: vec![GeminiPart { text: system_instruction.to_string() }],
            },
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart { text: prompt.to_string() }],
            }],
            tools: vec![GeminiTool { google_search: GoogleSearch::default() }],
        };

        debug!(model = %self.model, "sending generateContent request");

        let response = self.client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| GenerateError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, &text));
        }

        let gemini_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| GenerateError::Request(format!("malformed response: {}", e)))?;

        into_generation(gemini_response)
    }
}

fn into_generation(response: GeminiResponse) -> Result<Generation, GenerateError> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| GenerateError::Request("response has no candidates".to_string()))?;

    let text: String = candidate
        .content
        .parts
        .into_iter()
        .filter_map(|part| part.text)
        .collect();

    let citations = candidate
        .grounding_metadata
        .map(|metadata| metadata.grounding_chunks)
        .unwrap_or_default()
        .into_iter()
        .map(|chunk| match chunk.web {
            Some(web) => Citation { uri: web.uri, title: web.title },
            None => Citation::default(),
        })
        .collect();

    Ok(Generation { text, citations })
}

/// Map an error status to a credential rejection or a generic failure
fn classify_failure(status: StatusCode, body: &str) -> GenerateError {
    let envelope = serde_json::from_str::<ErrorEnvelope>(body).ok();

    let key_rejected = status == StatusCode::UNAUTHORIZED
        || envelope.as_ref().is_some_and(|e| {
            e.error.message.contains("API key not valid")
                || e.error
                    .details
                    .iter()
                    .any(|d| d.reason.as_deref() == Some("API_KEY_INVALID"))
        });

    let message = envelope
        .map(|e| e.error.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.to_string());

    if key_rejected {
        GenerateError::InvalidCredential(message)
    } else {
        GenerateError::Request(format!("Gemini API error {}: {}", status, message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let request = GeminiRequest {
            system_instruction: GeminiContent {
                role: None,
                parts: vec![GeminiPart { text: "sys".into() }],
            },
            contents: vec![GeminiContent {
                role: Some("user".into()),
                parts: vec![GeminiPart { text: "hi".into() }],
            }],
            tools: vec![GeminiTool { google_search: GoogleSearch::default() }],
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "systemInstruction": {"parts": [{"text": "sys"}]},
                "contents": [{"role": "user", "parts": [{"text": "hi"}]}],
                "tools": [{"googleSearch": {}}]
            })
        );
    }

    #[test]
    fn test_generation_joins_parts_and_reads_chunks() {
        let response: GeminiResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{
                "content": {"parts": [{"text": "Olá, "}, {"text": "mundo"}]},
                "groundingMetadata": {
                    "groundingChunks": [
                        {"web": {"uri": "https://ffm.br/a", "title": "A"}},
                        {"web": {"uri": "https://ffm.br/b"}},
                        {}
                    ]
                }
            }]
        }))
        .unwrap();

        let generation = into_generation(response).unwrap();
        assert_eq!(generation.text, "Olá, mundo");
        assert_eq!(generation.citations.len(), 3);
        assert_eq!(generation.citations[0].title.as_deref(), Some("A"));
        assert_eq!(generation.citations[1].title, None);
        assert_eq!(generation.citations[2], Citation::default());
    }

    #[test]
    fn test_missing_grounding_metadata_is_empty() {
        let response: GeminiResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": "sem fontes"}]}}]
        }))
        .unwrap();

        let generation = into_generation(response).unwrap();
        assert!(generation.citations.is_empty());
    }

    #[test]
    fn test_no_candidates_is_request_error() {
        let response: GeminiResponse = serde_json::from_str("{}").unwrap();
        assert!(matches!(into_generation(response), Err(GenerateError::Request(_))));
    }

    #[test]
    fn test_classify_invalid_key_by_message() {
        let body = r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT"}}"#;
        assert!(matches!(
            classify_failure(StatusCode::BAD_REQUEST, body),
            GenerateError::InvalidCredential(_)
        ));
    }

    #[test]
    fn test_classify_invalid_key_by_reason() {
        let body = r#"{"error":{"code":400,"message":"bad","details":[{"reason":"API_KEY_INVALID"}]}}"#;
        assert!(matches!(
            classify_failure(StatusCode::BAD_REQUEST, body),
            GenerateError::InvalidCredential(_)
        ));
    }

    #[test]
    fn test_classify_other_failures() {
        let body = r#"{"error":{"code":429,"message":"Resource has been exhausted","status":"RESOURCE_EXHAUSTED"}}"#;
        assert!(matches!(
            classify_failure(StatusCode::TOO_MANY_REQUESTS, body),
            GenerateError::Request(_)
        ));
        assert!(matches!(
            classify_failure(StatusCode::BAD_GATEWAY, "<html>oops</html>"),
            GenerateError::Request(_)
        ));
    }
}
