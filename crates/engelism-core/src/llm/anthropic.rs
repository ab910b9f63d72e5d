//! Anthropic provider using the Messages API with a forced tool call.
//!
//! The structured output arrives as the `input` of a `tool_use` content block.

use super::provider::{send_checked, trim_endpoint, GenerationRequest, ProtocolProvider};
use crate::error::ProviderError;
use crate::schema::{translate, ToolChoice, ToolDefinition};
use crate::types::{ProviderConfig, ProviderId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_ENDPOINT: &str = "https://api.anthropic.com";

const API_VERSION: &str = "2023-06-01";

/// Anthropic provider using the Messages API.
pub struct AnthropicProvider {
    client: reqwest::Client,
    endpoint: String,
    max_tokens: u32,
}

impl AnthropicProvider {
    pub fn new(client: reqwest::Client, endpoint: &str, max_tokens: u32) -> Self {
        Self {
            client,
            endpoint: trim_endpoint(endpoint),
            max_tokens,
        }
    }
}

// --- Request types ---

#[derive(Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    system: String,
    tools: Vec<ToolDefinition>,
    tool_choice: ToolChoice,
    messages: Vec<Message>,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: Vec<ContentBlock>,
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image")]
    Image { source: ImageSource },
}

#[derive(Serialize)]
struct ImageSource {
    #[serde(rename = "type")]
    source_type: String,
    media_type: String,
    data: String,
}

// --- Response types ---

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ResponseBlock>,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum ResponseBlock {
    #[serde(rename = "tool_use")]
    ToolUse {
        #[serde(default)]
        input: Option<Value>,
    },
    #[serde(other)]
    Other,
}

#[async_trait]
impl ProtocolProvider for AnthropicProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Anthropic
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
        config: &ProviderConfig,
    ) -> Result<String, ProviderError> {
        let tool = ToolDefinition::protocol(translate(&request.schema, ProviderId::Anthropic)?);

        let body = MessagesRequest {
            model: config.model.clone(),
            max_tokens: self.max_tokens,
            temperature: request.temperature,
            system: request.system_instruction.clone(),
            tool_choice: tool.forced_choice(),
            tools: vec![tool],
            messages: vec![Message {
                role: "user".to_string(),
                content: vec![
                    ContentBlock::Text {
                        text: request.prompt.clone(),
                    },
                    ContentBlock::Image {
                        source: ImageSource {
                            source_type: "base64".to_string(),
                            media_type: request.image.media_type.clone(),
                            data: request.image.data.clone(),
                        },
                    },
                ],
            }],
        };

        tracing::debug!("Anthropic request: model={}", config.model);

        let (status, text) = send_checked(
            ProviderId::Anthropic,
            self.client
                .post(format!("{}/v1/messages", self.endpoint))
                .header("x-api-key", &config.api_key)
                .header("anthropic-version", API_VERSION)
                .json(&body),
        )
        .await?;

        let malformed = |reason: String, body: &str| ProviderError::MalformedResponse {
            provider: ProviderId::Anthropic,
            status,
            reason,
            body: body.to_string(),
        };

        let parsed: MessagesResponse =
            serde_json::from_str(&text).map_err(|e| malformed(e.to_string(), &text))?;

        let input = parsed
            .content
            .into_iter()
            .find_map(|block| match block {
                ResponseBlock::ToolUse { input } => input,
                ResponseBlock::Other => None,
            })
            .ok_or_else(|| malformed("no tool_use block with input".into(), &text))?;

        serde_json::to_string_pretty(&input).map_err(|e| malformed(e.to_string(), &text))
    }
}
