//! Provider resolution from a flat credential map.
//!
//! The map is usually the `.env` file shared with the web UI, overlaid by the
//! process environment. Resolution itself is pure: it never reads the
//! environment on its own.

use crate::error::ConfigError;
use crate::types::{ProviderConfig, ProviderId};
use std::collections::HashMap;
use std::path::Path;

/// Key that forces a specific provider.
pub const PROVIDER_KEY: &str = "VITE_PROVIDER";

/// Key that overrides the provider's default model.
pub const MODEL_KEY: &str = "VITE_MODEL";

/// Minimum length of a credential that is not obviously a placeholder.
const MIN_KEY_LEN: usize = 10;

const PLACEHOLDER_FRAGMENTS: [&str; 2] = ["your_key", "your-key"];

/// Flat key/value credential map.
pub type EnvMap = HashMap<String, String>;

/// Whether `key` looks like a real credential rather than a template placeholder.
pub fn is_usable_key(key: &str) -> bool {
    if key.is_empty() || key.chars().count() < MIN_KEY_LEN {
        return false;
    }
    let lowered = key.to_lowercase();
    if lowered == "xxx" {
        return false;
    }
    !PLACEHOLDER_FRAGMENTS
        .iter()
        .any(|fragment| lowered.contains(fragment))
}

/// Resolve which provider, model, and key to use.
///
/// An explicit `VITE_PROVIDER` must name a known provider with a usable key.
/// Otherwise providers are tried in priority order (Gemini, OpenAI, Anthropic)
/// and the first with a usable key wins.
pub fn resolve(env: &EnvMap) -> Result<ProviderConfig, ConfigError> {
    let model_override = non_empty(env, MODEL_KEY);

    if let Some(explicit) = non_empty(env, PROVIDER_KEY) {
        let provider_id: ProviderId = explicit
            .parse()
            .map_err(|_| ConfigError::UnknownProvider(explicit.to_string()))?;
        let api_key = usable_key(env, provider_id).ok_or(ConfigError::InvalidKey {
            provider: provider_id,
            env_var: provider_id.key_env_var(),
        })?;
        return Ok(build(provider_id, api_key, model_override));
    }

    ProviderId::ALL
        .into_iter()
        .find_map(|id| usable_key(env, id).map(|key| build(id, key, model_override)))
        .ok_or(ConfigError::NoCredential)
}

fn non_empty<'a>(env: &'a EnvMap, key: &str) -> Option<&'a str> {
    env.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn usable_key(env: &EnvMap, provider_id: ProviderId) -> Option<&str> {
    env.get(provider_id.key_env_var())
        .map(String::as_str)
        .filter(|key| is_usable_key(key))
}

fn build(provider_id: ProviderId, api_key: &str, model_override: Option<&str>) -> ProviderConfig {
    ProviderConfig {
        provider_id,
        model: model_override
            .unwrap_or_else(|| provider_id.default_model())
            .to_string(),
        api_key: api_key.to_string(),
    }
}

/// Load a `.env` file into a map without touching the process environment.
///
/// A missing file yields an empty map.
pub fn load_env_file(path: &Path) -> Result<EnvMap, ConfigError> {
    if !path.exists() {
        tracing::debug!("No env file at {:?}", path);
        return Ok(EnvMap::new());
    }

    let env_error = |message: String| ConfigError::EnvFile {
        path: path.to_path_buf(),
        message,
    };

    let mut map = EnvMap::new();
    for item in dotenvy::from_path_iter(path).map_err(|e| env_error(e.to_string()))? {
        let (key, value) = item.map_err(|e| env_error(e.to_string()))?;
        map.insert(key, value);
    }
    Ok(map)
}

/// Overlay process environment values for the keys the resolver reads.
pub fn overlay_process_env(mut map: EnvMap) -> EnvMap {
    let keys = ProviderId::ALL
        .iter()
        .map(|id| id.key_env_var())
        .chain([PROVIDER_KEY, MODEL_KEY]);
    for key in keys {
        if let Ok(value) = std::env::var(key) {
            map.insert(key.to_string(), value);
        }
    }
    map
}
