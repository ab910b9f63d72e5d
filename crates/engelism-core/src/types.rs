//! Core data types shared across the engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The three supported generation backends.
///
/// Declaration order is the auto-detection priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Gemini,
    #[serde(rename = "openai")]
    OpenAi,
    Anthropic,
}

impl ProviderId {
    /// All providers in auto-detection priority order.
    pub const ALL: [ProviderId; 3] = [
        ProviderId::Gemini,
        ProviderId::OpenAi,
        ProviderId::Anthropic,
    ];

    /// Identifier used in `VITE_PROVIDER` and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Gemini => "gemini",
            ProviderId::OpenAi => "openai",
            ProviderId::Anthropic => "anthropic",
        }
    }

    /// Credential key consulted by the resolver.
    pub fn key_env_var(&self) -> &'static str {
        match self {
            ProviderId::Gemini => "VITE_GOOGLE_API_KEY",
            ProviderId::OpenAi => "VITE_OPENAI_API_KEY",
            ProviderId::Anthropic => "VITE_ANTHROPIC_API_KEY",
        }
    }

    /// Model used when no override is configured.
    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderId::Gemini => "gemini-3-flash-preview",
            ProviderId::OpenAi => "gpt-4o",
            ProviderId::Anthropic => "claude-sonnet-4-5-20250929",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderId::Gemini => write!(f, "Gemini"),
            ProviderId::OpenAi => write!(f, "OpenAI"),
            ProviderId::Anthropic => write!(f, "Anthropic"),
        }
    }
}

impl FromStr for ProviderId {
    type Err = String;

    /// Parse a provider identifier (exact, lower-case match).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProviderId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// Resolved backend selection: which provider, which model, which key.
///
/// Built once per run and handed to every client call.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub provider_id: ProviderId,
    pub model: String,
    pub api_key: String,
}

// Keep the key out of logs.
impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider_id", &self.provider_id)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .finish()
    }
}
