//! The generation engine: resolved provider, its client, and the fixed schema.
//!
//! An [`Engine`] is built once per run. Construction resolves credentials and
//! checks that the protocol schema translates for the chosen dialect, so
//! configuration problems surface before any network call.

use crate::batch::{FabricateOptions, Fabricator};
use crate::config::Config;
use crate::error::{ConfigError, ProviderError, Result};
use crate::library::{FabricationConfig, Library};
use crate::llm::resolve::{load_env_file, overlay_process_env};
use crate::llm::{resolve, EnvMap, GenerationRequest, ImageInput, ProtocolProvider, ProviderTable};
use crate::prompt::SYSTEM_INSTRUCTION;
use crate::schema::{protocol_schema, translate, CanonicalSchema};
use crate::types::ProviderConfig;
use std::sync::Arc;

/// Resolved provider plus everything needed to issue protocol requests.
pub struct Engine {
    table: ProviderTable,
    provider_config: ProviderConfig,
    schema: Arc<CanonicalSchema>,
    temperature: f32,
}

impl Engine {
    /// Resolve the provider from `env` and build the HTTP clients.
    pub fn new(config: &Config, env: &EnvMap) -> Result<Self> {
        let provider_config = resolve(env)?;
        let table = ProviderTable::new(&config.llm)?;
        Self::with_table(table, provider_config, config.llm.temperature)
    }

    /// Build an engine around an existing provider table.
    pub fn with_table(
        table: ProviderTable,
        provider_config: ProviderConfig,
        temperature: f32,
    ) -> Result<Self> {
        let schema = protocol_schema();
        translate(&schema, provider_config.provider_id)?;

        tracing::info!(
            "Using {} with model {}",
            provider_config.provider_id,
            provider_config.model
        );

        Ok(Self {
            table,
            provider_config,
            schema: Arc::new(schema),
            temperature,
        })
    }

    /// Credential map for a run: the configured `.env` file, overlaid by the
    /// process environment.
    pub fn load_env(config: &Config) -> std::result::Result<EnvMap, ConfigError> {
        let file = load_env_file(&config.env_file())?;
        Ok(overlay_process_env(file))
    }

    pub fn provider_config(&self) -> &ProviderConfig {
        &self.provider_config
    }

    /// Client for the resolved provider.
    pub fn provider(&self) -> Arc<dyn ProtocolProvider> {
        self.table.get(self.provider_config.provider_id)
    }

    /// Generate one protocol for a prompt and reference image.
    ///
    /// Provider failures are returned to the caller; re-invoking is the retry.
    pub async fn generate_protocol(
        &self,
        prompt: String,
        image: Arc<ImageInput>,
    ) -> std::result::Result<String, ProviderError> {
        let request = GenerationRequest {
            system_instruction: SYSTEM_INSTRUCTION.to_string(),
            prompt,
            image,
            schema: self.schema.clone(),
            temperature: self.temperature,
        };
        self.provider()
            .generate(&request, &self.provider_config)
            .await
    }

    /// Batch driver bound to this engine's provider and schema.
    pub fn fabricator(
        &self,
        library: Library,
        fabrication: FabricationConfig,
        image: Arc<ImageInput>,
        mut options: FabricateOptions,
    ) -> Fabricator {
        options.temperature = self.temperature;
        Fabricator::new(
            self.provider(),
            self.provider_config.clone(),
            library,
            fabrication,
            self.schema.clone(),
            image,
            options,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngelError;
    use crate::types::ProviderId;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RecordingProvider {
        id: ProviderId,
        seen: Mutex<Vec<(String, String, f32)>>,
    }

    #[async_trait]
    impl ProtocolProvider for RecordingProvider {
        fn id(&self) -> ProviderId {
            self.id
        }

        async fn generate(
            &self,
            request: &GenerationRequest,
            config: &ProviderConfig,
        ) -> std::result::Result<String, ProviderError> {
            self.seen.lock().unwrap().push((
                request.system_instruction.clone(),
                config.model.clone(),
                request.temperature,
            ));
            Ok(format!("{{\"from\":\"{}\"}}", self.id.as_str()))
        }
    }

    fn recording(id: ProviderId) -> Arc<RecordingProvider> {
        Arc::new(RecordingProvider {
            id,
            seen: Mutex::new(Vec::new()),
        })
    }

    fn env(pairs: &[(&str, &str)]) -> EnvMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_new_resolves_provider_from_env() {
        let engine = Engine::new(
            &Config::default(),
            &env(&[("VITE_ANTHROPIC_API_KEY", "sk-ant-0123456789")]),
        )
        .unwrap();
        assert_eq!(engine.provider_config().provider_id, ProviderId::Anthropic);
        assert_eq!(engine.provider().id(), ProviderId::Anthropic);
    }

    #[test]
    fn test_explicit_provider_without_key_fails_before_any_call() {
        let result = Engine::new(
            &Config::default(),
            &env(&[
                ("VITE_PROVIDER", "anthropic"),
                ("VITE_GOOGLE_API_KEY", "AIza0123456789"),
            ]),
        );
        assert!(matches!(
            result,
            Err(EngelError::Config(ConfigError::InvalidKey { .. }))
        ));
    }

    #[tokio::test]
    async fn test_generate_protocol_routes_to_resolved_provider() {
        let (gemini, openai, anthropic) = (
            recording(ProviderId::Gemini),
            recording(ProviderId::OpenAi),
            recording(ProviderId::Anthropic),
        );
        let table = ProviderTable::from_parts(gemini.clone(), openai.clone(), anthropic.clone());
        let provider_config = ProviderConfig {
            provider_id: ProviderId::OpenAi,
            model: "gpt-4o".to_string(),
            api_key: "sk-test-1234567890".to_string(),
        };
        let engine = Engine::with_table(table, provider_config, 0.3).unwrap();

        let image = Arc::new(ImageInput::from_bytes(&[1, 2, 3], "image/png"));
        let out = engine
            .generate_protocol("PROMPT".to_string(), image)
            .await
            .unwrap();

        assert_eq!(out, r#"{"from":"openai"}"#);
        let seen = openai.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, SYSTEM_INSTRUCTION);
        assert_eq!(seen[0].1, "gpt-4o");
        assert_eq!(seen[0].2, 0.3);
        assert!(gemini.seen.lock().unwrap().is_empty());
        assert!(anthropic.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_load_env_reads_configured_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "VITE_MODEL=gpt-4o-mini\n").unwrap();

        let mut config = Config::default();
        config.general.env_file = path;
        let map = Engine::load_env(&config).unwrap();
        assert!(map.contains_key("VITE_MODEL"));
    }
}
