use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;

use crate::routes::{AnalyzeAccepted, ChatRequest, MemoResponse};
use orchestrator::SessionSnapshot;
use synthesis::ChatTurn;

pub const DEFAULT_API_URL: &str = "http://localhost:3000/api";
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Server returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// REST client for the deal-flow API with a fixed request timeout.
#[derive(Clone)]
pub struct DealflowClient {
    client: reqwest::Client,
    base_url: String,
}

impl DealflowClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Upload a deck; analysis continues server-side.
    pub async fn analyze_pitch_deck(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<AnalyzeAccepted, ClientError> {
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(ingest::PDF_MIME_TYPE)?;
        let form = Form::new().part("file", part);

        let request = self.client.post(self.url("/analyze")).multipart(form);
        self.send(request).await
    }

    pub async fn latest_analysis(&self) -> Result<SessionSnapshot, ClientError> {
        self.send(self.client.get(self.url("/analysis/latest"))).await
    }

    pub async fn generate_memo(&self) -> Result<MemoResponse, ClientError> {
        self.send(self.client.post(self.url("/memo"))).await
    }

    pub async fn chat(&self, message: &str) -> Result<ChatTurn, ClientError> {
        let body = ChatRequest {
            message: message.to_string(),
        };
        self.send(self.client.post(self.url("/chat")).json(&body)).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = request.send().await.map_err(|e| {
            tracing::error!(error = %e, "API request failed");
            ClientError::Transport(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!(status = status.as_u16(), body = %body, "API returned an error");
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}

impl Default for DealflowClient {
    fn default() -> Self {
        // Builder only fails when TLS cannot initialise; fall back to a plain client
        Self::new(DEFAULT_API_URL).unwrap_or_else(|_| Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_API_URL.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_analyze_uploads_multipart() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/analyze"))
            .and(header_exists("content-type"))
            .respond_with(ResponseTemplate::new(202).set_body_json(json!({
                "epoch": 4,
                "docId": "abc",
                "fileName": "acme.pdf"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = DealflowClient::new(format!("{}/api", server.uri())).unwrap();
        let accepted = client
            .analyze_pitch_deck("acme.pdf", b"%PDF-1.4".to_vec())
            .await
            .unwrap();
        assert_eq!(accepted.epoch, 4);

        let requests = server.received_requests().await.unwrap();
        let content_type = requests[0].headers.get("content-type").unwrap();
        assert!(content_type.to_str().unwrap().starts_with("multipart/form-data"));
    }

    #[tokio::test]
    async fn test_error_status_propagates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(
                ResponseTemplate::new(409).set_body_json(json!({"error": "No analysis is ready"})),
            )
            .mount(&server)
            .await;

        let client = DealflowClient::new(format!("{}/api/", server.uri())).unwrap();
        let err = client.chat("hello").await.unwrap_err();
        match err {
            ClientError::Status { status, body } => {
                assert_eq!(status, 409);
                assert!(body.contains("No analysis is ready"));
            }
            other => panic!("Expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_latest_analysis_parses_snapshot() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/analysis/latest"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "epoch": 1,
                "phase": "ready",
                "analysis": {
                    "companyName": "Acme",
                    "sector": "FinTech",
                    "investmentScore": 82,
                    "recommendation": "Buy"
                },
                "competitorsLoading": false,
                "redFlagsLoading": false,
                "memoInFlight": false,
                "chat": [],
                "chatTurnsInFlight": 0
            })))
            .mount(&server)
            .await;

        let client = DealflowClient::new(format!("{}/api", server.uri())).unwrap();
        let snapshot = client.latest_analysis().await.unwrap();
        assert_eq!(snapshot.epoch, 1);
        assert_eq!(snapshot.analysis.unwrap().company_name, "Acme");
    }

    #[test]
    fn test_default_base_url() {
        assert_eq!(DealflowClient::default().base_url(), DEFAULT_API_URL);
    }
}
