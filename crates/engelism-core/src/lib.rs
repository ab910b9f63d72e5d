//! Engelism Core - multi-provider camera override protocol generation.
//!
//! Engelism asks a vision-capable language model to produce a structured
//! "camera override protocol" for an architectural reference photo: how to
//! re-shoot the same building from a new angle, scale, and lens.
//!
//! # Architecture
//!
//! ```text
//! .env → Resolver → ProviderConfig ─┐
//!                                   ├→ Engine → Provider client → JSON protocol
//! CanonicalSchema → Translator ─────┘      └→ Batch pool → <label>.json artifacts
//! ```
//!
//! One canonical output schema is translated into the Gemini, OpenAI, or
//! Anthropic wire dialect inside each client. Batch runs cross-multiply the
//! catalog's camera angles and shot scales and fan the tasks out over a
//! bounded work-pulling pool.
//!
//! # Usage
//!
//! ```rust,ignore
//! use engelism_core::{Config, Engine, ImageInput};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> engelism_core::Result<()> {
//!     let config = Config::load()?;
//!     let env = Engine::load_env(&config)?;
//!     let engine = Engine::new(&config, &env)?;
//!
//!     let image = Arc::new(ImageInput::from_path("facade.jpg".as_ref()).await?);
//!     let protocol = engine.generate_protocol("...".to_string(), image).await?;
//!     println!("{protocol}");
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod batch;
pub mod config;
pub mod engine;
pub mod error;
pub mod library;
pub mod llm;
pub mod prompt;
pub mod schema;
pub mod types;

// Re-exports for convenient access
pub use batch::{BatchOutcome, BatchReport, FabricateOptions, Fabricator, Progress, Task, TaskOutcome};
pub use config::Config;
pub use engine::Engine;
pub use error::{
    BatchError, ConfigError, EngelError, ProviderError, Result, SchemaTranslationError, TaskError,
};
pub use library::{FabricationConfig, Library};
pub use llm::{media_type_for_path, ImageInput};
pub use prompt::{build_prompt, ShotSelection};
pub use types::{ProviderConfig, ProviderId};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
