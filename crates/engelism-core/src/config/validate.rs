//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

/// Upper bound on concurrent provider calls.
pub const MAX_CONCURRENCY: usize = 10;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_CONCURRENCY).contains(&self.batch.concurrency) {
            return Err(ConfigError::ValidationError(format!(
                "batch.concurrency must be between 1 and {MAX_CONCURRENCY}"
            )));
        }
        if self.llm.timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "llm.timeout_ms must be > 0".into(),
            ));
        }
        if self.llm.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "llm.max_tokens must be > 0".into(),
            ));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::ValidationError(
                "llm.temperature must be between 0.0 and 2.0".into(),
            ));
        }
        for (name, endpoint) in [
            ("llm.gemini_endpoint", &self.llm.gemini_endpoint),
            ("llm.openai_endpoint", &self.llm.openai_endpoint),
            ("llm.anthropic_endpoint", &self.llm.anthropic_endpoint),
        ] {
            if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must be an http(s) URL"
                )));
            }
        }
        Ok(())
    }
}
