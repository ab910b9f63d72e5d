//! Gemini provider using the `generateContent` API.
//!
//! The API key travels in the `x-goog-api-key` header, never in the URL, and
//! the schema goes in `generationConfig.responseSchema` using upper-case type
//! tokens.

use super::provider::{send_checked, trim_endpoint, GenerationRequest, ProtocolProvider};
use crate::error::ProviderError;
use crate::schema::translate;
use crate::types::{ProviderConfig, ProviderId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

/// Gemini provider.
pub struct GeminiProvider {
    client: reqwest::Client,
    endpoint: String,
}

impl GeminiProvider {
    pub fn new(client: reqwest::Client, endpoint: &str) -> Self {
        Self {
            client,
            endpoint: trim_endpoint(endpoint),
        }
    }
}

// --- Request types ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    response_mime_type: String,
    response_schema: Value,
}

// --- Response types ---

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[async_trait]
impl ProtocolProvider for GeminiProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Gemini
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
        config: &ProviderConfig,
    ) -> Result<String, ProviderError> {
        let body = GenerateContentRequest {
            system_instruction: Content {
                parts: vec![Part::Text {
                    text: request.system_instruction.clone(),
                }],
            },
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: request.prompt.clone(),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: request.image.media_type.clone(),
                            data: request.image.data.clone(),
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig {
                temperature: request.temperature,
                response_mime_type: "application/json".to_string(),
                response_schema: translate(&request.schema, ProviderId::Gemini)?,
            },
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint, config.model
        );
        tracing::debug!("Gemini request: model={}", config.model);

        let (status, text) = send_checked(
            ProviderId::Gemini,
            self.client
                .post(&url)
                .header("x-goog-api-key", &config.api_key)
                .json(&body),
        )
        .await?;

        let malformed = |reason: String, body: &str| ProviderError::MalformedResponse {
            provider: ProviderId::Gemini,
            status,
            reason,
            body: body.to_string(),
        };

        let parsed: GenerateContentResponse =
            serde_json::from_str(&text).map_err(|e| malformed(e.to_string(), &text))?;

        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .ok_or_else(|| malformed("no text in first candidate's first part".into(), &text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::test_support::{provider_config, sample_request};
    use mockito::Matcher;
    use serde_json::json;

    const KEY: &str = "AIza-test-key-123";

    #[tokio::test]
    async fn test_gemini_request_shape_and_extraction() {
        let mut server = mockito::Server::new_async().await;
        let payload = r#"{"camera_override_protocol":"lower the camera"}"#;
        let mock = server
            .mock("POST", "/v1beta/models/gemini-test:generateContent")
            .match_header("x-goog-api-key", KEY)
            .match_body(Matcher::PartialJson(json!({
                "systemInstruction": {"parts": [{"text": "SYSTEM"}]},
                "contents": [{"parts": [
                    {"text": "PROMPT"},
                    {"inlineData": {"mimeType": "image/png", "data": "AQID"}}
                ]}],
                "generationConfig": {
                    "responseMimeType": "application/json",
                    "responseSchema": {"type": "OBJECT"}
                }
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({"candidates": [{"content": {"parts": [{"text": payload}]}}]}).to_string(),
            )
            .create_async()
            .await;

        let provider = GeminiProvider::new(reqwest::Client::new(), &server.url());
        let result = provider
            .generate(
                &sample_request(),
                &provider_config(ProviderId::Gemini, "gemini-test", KEY),
            )
            .await
            .unwrap();

        assert_eq!(result, payload);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_gemini_http_error_carries_status_and_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", Matcher::Any)
            .with_status(500)
            .with_body("backend overloaded")
            .create_async()
            .await;

        let provider = GeminiProvider::new(reqwest::Client::new(), &server.url());
        let err = provider
            .generate(
                &sample_request(),
                &provider_config(ProviderId::Gemini, "gemini-test", KEY),
            )
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), Some(500));
        assert_eq!(err.body(), Some("backend overloaded"));
    }

    #[tokio::test]
    async fn test_gemini_empty_candidates_fail_closed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", Matcher::Any)
            .with_status(200)
            .with_body(json!({"candidates": []}).to_string())
            .create_async()
            .await;

        let provider = GeminiProvider::new(reqwest::Client::new(), &server.url());
        let err = provider
            .generate(
                &sample_request(),
                &provider_config(ProviderId::Gemini, "gemini-test", KEY),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ProviderError::MalformedResponse { status: 200, .. }
        ));
    }

    #[tokio::test]
    async fn test_gemini_transport_error_does_not_leak_key() {
        let secret = "AIzaSECRET-0123456789";
        let provider = GeminiProvider::new(reqwest::Client::new(), "http://127.0.0.1:1");
        let err = provider
            .generate(
                &sample_request(),
                &provider_config(ProviderId::Gemini, "gemini-test", secret),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::Transport { .. }));
        assert!(!err.to_string().contains(secret));
        assert!(!format!("{err:?}").contains(secret));
    }
}
