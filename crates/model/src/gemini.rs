use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ModelConfig;
use crate::credential::{CredentialResolver, CredentialSource};
use crate::error::{ModelError, ModelResult};
use crate::provider::GenerativeModel;
use crate::types::{Content, GenerateRequest, GenerationConfig, ModelResponse, Tool, WebSource};

#[derive(Clone)]
pub struct GeminiClient {
    config: ModelConfig,
    credentials: CredentialResolver,
    client: reqwest::Client,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: &'a [Content],
    generation_config: &'a GenerationConfig,
    #[serde(skip_serializing_if = "no_tools")]
    tools: &'a [Tool],
}

fn no_tools(tools: &&[Tool]) -> bool {
    tools.is_empty()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Deserialize)]
struct GroundingChunk {
    web: Option<WebSource>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

impl GeminiClient {
    pub fn new(config: ModelConfig, credentials: CredentialResolver) -> Self {
        Self {
            config,
            credentials,
            client: reqwest::Client::new(),
        }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    fn into_response(payload: GeminiResponse) -> ModelResult<ModelResponse> {
        let Some(candidate) = payload.candidates.into_iter().next() else {
            let reason = payload
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "no candidates returned".to_string());
            return Err(ModelError::malformed(format!("empty response: {}", reason)));
        };

        let grounding_sources = candidate
            .grounding_metadata
            .map(|m| m.grounding_chunks.into_iter().filter_map(|c| c.web).collect())
            .unwrap_or_default();

        Ok(ModelResponse {
            content: candidate.content.unwrap_or_else(|| Content::model(Vec::new())),
            finish_reason: candidate.finish_reason,
            grounding_sources,
        })
    }
}

/// Pull the provider's message out of an error body, falling back to raw text.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => match envelope.error.status {
            Some(status) => format!("{} ({})", envelope.error.message, status),
            None => envelope.error.message,
        },
        Err(_) => body.to_string(),
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    fn name(&self) -> &str {
        &self.config.model
    }

    async fn generate_content(&self, request: GenerateRequest) -> ModelResult<ModelResponse> {
        let (credential, source) = self.credentials.resolve_with_source()?;
        let credential_source = match source {
            CredentialSource::Settings => "settings",
            CredentialSource::Environment => "environment",
        };
        debug!(
            model = %self.config.model,
            credential_source,
            turns = request.contents.len(),
            tools = request.tools.len(),
            "Sending generateContent request"
        );

        let body = GeminiRequest {
            contents: &request.contents,
            generation_config: &request.config,
            tools: &request.tools,
        };

        let response = self
            .client
            .post(self.config.generate_url())
            .header("x-goog-api-key", credential.expose())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let message = format!("[{}] {}", status.as_u16(), error_message(&text));
            warn!(status = status.as_u16(), error = %message, "Gemini request failed");
            return Err(ModelError::service(Some(status.as_u16()), message));
        }

        let payload: GeminiResponse = response
            .json()
            .await
            .map_err(|e| ModelError::malformed(format!("Failed to parse Gemini response: {}", e)))?;

        Self::into_response(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::{API_KEY_SETTING, MemorySettingsStore, SettingsStore};
    use crate::error::ServiceErrorKind;
    use crate::types::Part;
    use std::sync::Arc;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const GENERATE_PATH: &str = "/v1beta/models/gemini-2.5-flash:generateContent";

    fn client_for(server: &MockServer, key: Option<&str>) -> GeminiClient {
        let store = Arc::new(MemorySettingsStore::new());
        if let Some(key) = key {
            store.set(API_KEY_SETTING, key).unwrap();
        }
        GeminiClient::new(
            ModelConfig::new(server.uri(), "gemini-2.5-flash"),
            CredentialResolver::new(store, None),
        )
    }

    #[tokio::test]
    async fn test_generate_content_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .and(header("x-goog-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": "Hello"}, {"text": " world"}]},
                    "finishReason": "STOP",
                    "groundingMetadata": {
                        "groundingChunks": [{"web": {"uri": "https://example.com", "title": "Example"}}]
                    }
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, Some("test-key"));
        let response = client
            .generate_content(GenerateRequest::new(vec![Part::text("hi")]))
            .await
            .unwrap();

        assert_eq!(response.text(), "Hello world");
        assert_eq!(response.grounding_sources.len(), 1);
        assert_eq!(response.grounding_sources[0].uri, "https://example.com");
    }

    #[tokio::test]
    async fn test_missing_credential_makes_no_request() {
        let server = MockServer::start().await;
        let client = client_for(&server, None);

        let result = client
            .generate_content(GenerateRequest::new(vec![Part::text("hi")]))
            .await;

        assert!(matches!(result, Err(ModelError::MissingCredential)));
        let received = server.received_requests().await.unwrap_or_default();
        assert!(received.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_key_is_classified() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {
                    "code": 400,
                    "message": "API key not valid. Please pass a valid API key.",
                    "status": "INVALID_ARGUMENT"
                }
            })))
            .mount(&server)
            .await;

        let client = client_for(&server, Some("bad-key"));
        let err = client
            .generate_content(GenerateRequest::new(vec![Part::text("hi")]))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), Some(ServiceErrorKind::InvalidCredential));
    }

    #[tokio::test]
    async fn test_quota_is_classified() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(429).set_body_string("Resource has been exhausted"))
            .mount(&server)
            .await;

        let client = client_for(&server, Some("key"));
        let err = client
            .generate_content(GenerateRequest::new(vec![Part::text("hi")]))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), Some(ServiceErrorKind::QuotaExceeded));
    }

    #[tokio::test]
    async fn test_blocked_prompt_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "promptFeedback": {"blockReason": "SAFETY"}
            })))
            .mount(&server)
            .await;

        let client = client_for(&server, Some("key"));
        let err = client
            .generate_content(GenerateRequest::new(vec![Part::text("hi")]))
            .await
            .unwrap_err();

        assert!(matches!(err, ModelError::MalformedResponse(ref m) if m.contains("SAFETY")));
    }

    #[test]
    fn test_error_message_extraction() {
        let body = r#"{"error":{"code":403,"message":"Permission denied","status":"PERMISSION_DENIED"}}"#;
        assert_eq!(error_message(body), "Permission denied (PERMISSION_DENIED)");
        assert_eq!(error_message("plain text"), "plain text");
    }
}
