//! OpenAI provider using the Chat Completions API with strict JSON schema output.
//!
//! Sends the image via data URL in the user message content array.

use super::provider::{send_checked, trim_endpoint, GenerationRequest, ProtocolProvider};
use crate::error::ProviderError;
use crate::schema::{translate, JsonSchemaFormat};
use crate::types::{ProviderConfig, ProviderId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com";

/// OpenAI provider using Chat Completions API.
pub struct OpenAiProvider {
    client: reqwest::Client,
    endpoint: String,
}

impl OpenAiProvider {
    pub fn new(client: reqwest::Client, endpoint: &str) -> Self {
        Self {
            client,
            endpoint: trim_endpoint(endpoint),
        }
    }
}

// --- Request types ---

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    temperature: f32,
    response_format: ResponseFormat,
    messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
    json_schema: JsonSchemaFormat,
}

#[derive(Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
enum ChatMessage {
    System { content: String },
    User { content: Vec<ChatContent> },
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum ChatContent {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

// --- Response types ---

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[async_trait]
impl ProtocolProvider for OpenAiProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenAi
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
        config: &ProviderConfig,
    ) -> Result<String, ProviderError> {
        let schema = translate(&request.schema, ProviderId::OpenAi)?;

        let body = ChatRequest {
            model: config.model.clone(),
            temperature: request.temperature,
            response_format: ResponseFormat {
                format_type: "json_schema".to_string(),
                json_schema: JsonSchemaFormat::protocol(schema),
            },
            messages: vec![
                ChatMessage::System {
                    content: request.system_instruction.clone(),
                },
                ChatMessage::User {
                    content: vec![
                        ChatContent::Text {
                            text: request.prompt.clone(),
                        },
                        ChatContent::ImageUrl {
                            image_url: ImageUrl {
                                url: request.image.data_url(),
                            },
                        },
                    ],
                },
            ],
        };

        tracing::debug!("OpenAI request: model={}", config.model);

        let (status, text) = send_checked(
            ProviderId::OpenAi,
            self.client
                .post(format!("{}/v1/chat/completions", self.endpoint))
                .bearer_auth(&config.api_key)
                .json(&body),
        )
        .await?;

        let malformed = |reason: String, body: &str| ProviderError::MalformedResponse {
            provider: ProviderId::OpenAi,
            status,
            reason,
            body: body.to_string(),
        };

        let parsed: ChatResponse =
            serde_json::from_str(&text).map_err(|e| malformed(e.to_string(), &text))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .ok_or_else(|| malformed("no message content in first choice".into(), &text))
    }
}
