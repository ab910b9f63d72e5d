//! Sub-configuration structs with their defaults.

use crate::llm::{anthropic, gemini, openai};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// General settings: where inputs live and where artifacts go.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Camera/lens catalog (JSON)
    pub library_path: PathBuf,

    /// `.env` file holding provider credentials
    pub env_file: PathBuf,

    /// Batch configuration saved by the web UI
    pub batch_config: PathBuf,

    /// Directory receiving one protocol file per task
    pub output_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            library_path: PathBuf::from("data/library.json"),
            env_file: PathBuf::from(".env"),
            batch_config: PathBuf::from("engelism-config.json"),
            output_dir: PathBuf::from("Protocols"),
        }
    }
}

/// Batch fabrication settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Number of in-flight provider calls (1..=10)
    pub concurrency: usize,

    /// Abort before any network call if two tasks share a label.
    /// When false, later artifacts overwrite earlier ones.
    pub fail_on_duplicate_labels: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: 3,
            fail_on_duplicate_labels: true,
        }
    }
}

/// Provider call settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Per-call HTTP timeout in milliseconds
    pub timeout_ms: u64,

    /// Sampling temperature sent with every request
    pub temperature: f32,

    /// Output token cap (required by the Anthropic API)
    pub max_tokens: u32,

    /// Base URL of the Gemini API
    pub gemini_endpoint: String,

    /// Base URL of the OpenAI API
    pub openai_endpoint: String,

    /// Base URL of the Anthropic API
    pub anthropic_endpoint: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 120_000,
            temperature: crate::prompt::DEFAULT_TEMPERATURE,
            max_tokens: 4096,
            gemini_endpoint: gemini::DEFAULT_ENDPOINT.to_string(),
            openai_endpoint: openai::DEFAULT_ENDPOINT.to_string(),
            anthropic_endpoint: anthropic::DEFAULT_ENDPOINT.to_string(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
