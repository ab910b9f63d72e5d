//! Provider trait, request types, and the provider table.
//!
//! Every backend hides its own envelope behind [`ProtocolProvider::generate`],
//! which performs exactly one HTTP call and returns the raw structured-output
//! text.

use crate::config::LlmConfig;
use crate::error::{ConfigError, ProviderError};
use crate::schema::CanonicalSchema;
use crate::types::{ProviderConfig, ProviderId};
use async_trait::async_trait;
use base64::Engine;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Base64-encoded image ready to send to a provider API.
#[derive(Debug, Clone)]
pub struct ImageInput {
    /// Base64-encoded image bytes
    pub data: String,
    /// MIME type (e.g., "image/jpeg", "image/png")
    pub media_type: String,
}

impl ImageInput {
    /// Encode raw bytes with an already known MIME type.
    pub fn from_bytes(bytes: &[u8], media_type: &str) -> Self {
        Self {
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
            media_type: media_type.to_string(),
        }
    }

    /// Read an image from disk, deriving the MIME type from its extension.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        Ok(Self::from_bytes(&bytes, media_type_for_path(path)))
    }

    /// Return a data URL suitable for OpenAI-style APIs.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }
}

/// MIME type for an image path, by extension.
pub fn media_type_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        other => {
            tracing::warn!("Unknown image extension '{other}', defaulting to image/jpeg");
            "image/jpeg"
        }
    }
}

/// One structured-output generation call.
///
/// The image and schema are shared, so a batch encodes its reference image once.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub system_instruction: String,
    pub prompt: String,
    pub image: Arc<ImageInput>,
    pub schema: Arc<CanonicalSchema>,
    pub temperature: f32,
}

/// Trait that all provider clients implement.
///
/// Uses `async_trait` because native async fn in trait is not object-safe
/// (we need `Arc<dyn ProtocolProvider>` in the provider table).
#[async_trait]
pub trait ProtocolProvider: Send + Sync {
    /// Which dialect this client speaks.
    fn id(&self) -> ProviderId;

    /// Display name for logs and banners.
    fn name(&self) -> String {
        self.id().to_string()
    }

    /// Perform one call and return the structured payload as raw JSON text.
    async fn generate(
        &self,
        request: &GenerationRequest,
        config: &ProviderConfig,
    ) -> Result<String, ProviderError>;
}

/// Fixed mapping from provider identifier to client.
#[derive(Clone)]
pub struct ProviderTable {
    gemini: Arc<dyn ProtocolProvider>,
    openai: Arc<dyn ProtocolProvider>,
    anthropic: Arc<dyn ProtocolProvider>,
}

impl ProviderTable {
    /// Build the three HTTP clients from LLM settings.
    ///
    /// All clients share one connection pool and the configured per-call timeout.
    pub fn new(config: &LlmConfig) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| ConfigError::ValidationError(format!("HTTP client setup failed: {e}")))?;

        Ok(Self::from_parts(
            Arc::new(super::gemini::GeminiProvider::new(
                client.clone(),
                &config.gemini_endpoint,
            )),
            Arc::new(super::openai::OpenAiProvider::new(
                client.clone(),
                &config.openai_endpoint,
            )),
            Arc::new(super::anthropic::AnthropicProvider::new(
                client,
                &config.anthropic_endpoint,
                config.max_tokens,
            )),
        ))
    }

    /// Assemble a table from explicit clients (tests, embedding applications).
    pub fn from_parts(
        gemini: Arc<dyn ProtocolProvider>,
        openai: Arc<dyn ProtocolProvider>,
        anthropic: Arc<dyn ProtocolProvider>,
    ) -> Self {
        Self {
            gemini,
            openai,
            anthropic,
        }
    }

    /// Client for the given provider.
    pub fn get(&self, id: ProviderId) -> Arc<dyn ProtocolProvider> {
        match id {
            ProviderId::Gemini => self.gemini.clone(),
            ProviderId::OpenAi => self.openai.clone(),
            ProviderId::Anthropic => self.anthropic.clone(),
        }
    }
}

/// Send a prepared request and return `(status, body)` for a success status.
///
/// Transport failures and non-success statuses become [`ProviderError`]s with
/// the response body attached. Transport messages never include the request
/// URL.
pub(crate) async fn send_checked(
    provider: ProviderId,
    request: reqwest::RequestBuilder,
) -> Result<(u16, String), ProviderError> {
    let resp = request
        .send()
        .await
        .map_err(|e| ProviderError::Transport {
            provider,
            message: e.without_url().to_string(),
        })?;

    let status = resp.status();
    let body = resp.text().await.map_err(|e| ProviderError::Transport {
        provider,
        message: format!("failed to read response body: {}", e.without_url()),
    })?;

    if !status.is_success() {
        return Err(ProviderError::Http {
            provider,
            status: status.as_u16(),
            body,
        });
    }

    Ok((status.as_u16(), body))
}

/// Strip a trailing slash so endpoint joins stay predictable.
pub(crate) fn trim_endpoint(endpoint: &str) -> String {
    endpoint.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_input_from_bytes() {
        let input = ImageInput::from_bytes(&[0xFF, 0xD8, 0xFF], "image/jpeg");
        assert_eq!(input.media_type, "image/jpeg");
        assert_eq!(input.data, "/9j/");
    }

    #[test]
    fn test_image_input_data_url() {
        let input = ImageInput::from_bytes(&[1, 2, 3], "image/png");
        assert_eq!(input.data_url(), "data:image/png;base64,AQID");
    }

    #[test]
    fn test_media_type_for_path() {
        assert_eq!(media_type_for_path(Path::new("a.JPG")), "image/jpeg");
        assert_eq!(media_type_for_path(Path::new("a.jpeg")), "image/jpeg");
        assert_eq!(media_type_for_path(Path::new("a.png")), "image/png");
        assert_eq!(media_type_for_path(Path::new("a.webp")), "image/webp");
        assert_eq!(media_type_for_path(Path::new("a.tiff")), "image/jpeg");
        assert_eq!(media_type_for_path(Path::new("noext")), "image/jpeg");
    }

    #[tokio::test]
    async fn test_image_input_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ref.png");
        std::fs::write(&path, [1u8, 2, 3]).unwrap();

        let input = ImageInput::from_path(&path).await.unwrap();
        assert_eq!(input.media_type, "image/png");
        assert_eq!(input.data, "AQID");
    }

    #[test]
    fn test_provider_table_routes_by_id() {
        let table = ProviderTable::new(&LlmConfig::default()).unwrap();
        for id in ProviderId::ALL {
            assert_eq!(table.get(id).id(), id);
        }
    }

    #[test]
    fn test_trim_endpoint() {
        assert_eq!(trim_endpoint("http://x/"), "http://x");
        assert_eq!(trim_endpoint("http://x"), "http://x");
    }
}
