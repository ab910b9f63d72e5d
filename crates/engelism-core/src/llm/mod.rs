//! Provider integration for structured protocol generation.
//!
//! Provides credential resolution, a provider abstraction over the Gemini,
//! OpenAI, and Anthropic APIs, and the fixed table mapping each provider to
//! its client.

pub(crate) mod anthropic;
pub(crate) mod gemini;
pub(crate) mod openai;
pub(crate) mod provider;
pub mod resolve;

pub use anthropic::AnthropicProvider;
pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;
pub use provider::{
    media_type_for_path, GenerationRequest, ImageInput, ProtocolProvider, ProviderTable,
};
pub use resolve::{is_usable_key, resolve, EnvMap};
