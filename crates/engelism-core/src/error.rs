//! Error types for the Engelism generation engine.
//!
//! Errors are split by concern so callers can tell a fatal setup problem
//! (credentials, schema) apart from a single failed provider call.

use crate::types::ProviderId;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for Engelism operations.
#[derive(Error, Debug)]
pub enum EngelError {
    /// Configuration or credential errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Canonical schema could not be expressed in a provider dialect
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaTranslationError),

    /// A provider call failed
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Batch planning or artifact errors
    #[error("Batch error: {0}")]
    Batch(#[from] BatchError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration and credential errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    /// The `.env` credential file could not be parsed
    #[error("Failed to load env file {path}: {message}")]
    EnvFile { path: PathBuf, message: String },

    /// Explicit provider selection names an unrecognized provider
    #[error("unknown provider: \"{0}\"")]
    UnknownProvider(String),

    /// Explicitly selected provider has no usable credential
    #[error("missing/invalid key for {provider}: set {env_var}")]
    InvalidKey {
        provider: ProviderId,
        env_var: &'static str,
    },

    /// No provider had a usable credential
    #[error(
        "no credential found. Set VITE_GOOGLE_API_KEY, VITE_OPENAI_API_KEY, \
         or VITE_ANTHROPIC_API_KEY in .env"
    )]
    NoCredential,
}

/// The canonical schema contains a node a dialect cannot represent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot translate schema node at {path} for {dialect}: {reason}")]
pub struct SchemaTranslationError {
    /// Dialect that rejected the node
    pub dialect: ProviderId,
    /// JSON-pointer-like path to the node (`$` is the root)
    pub path: String,
    /// What is wrong with the node
    pub reason: String,
}

/// Failure of a single provider call.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The request never produced an HTTP response (DNS, connect, timeout)
    #[error("{provider} request failed: {message}")]
    Transport {
        provider: ProviderId,
        message: String,
    },

    /// Non-success HTTP status; body is kept verbatim for diagnostics
    #[error("{provider} API error ({status}): {body}")]
    Http {
        provider: ProviderId,
        status: u16,
        body: String,
    },

    /// Success status but the structured payload was not where it should be
    #[error("{provider} response malformed ({reason}): {body}")]
    MalformedResponse {
        provider: ProviderId,
        status: u16,
        reason: String,
        body: String,
    },

    /// The request schema could not be expressed in this provider's dialect
    #[error(transparent)]
    Schema(#[from] SchemaTranslationError),
}

impl ProviderError {
    /// HTTP status code, if the call got far enough to receive one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ProviderError::Http { status, .. } | ProviderError::MalformedResponse { status, .. } => {
                Some(*status)
            }
            ProviderError::Transport { .. } | ProviderError::Schema(_) => None,
        }
    }

    /// Raw response body, if any.
    pub fn body(&self) -> Option<&str> {
        match self {
            ProviderError::Http { body, .. } | ProviderError::MalformedResponse { body, .. } => {
                Some(body)
            }
            ProviderError::Transport { .. } | ProviderError::Schema(_) => None,
        }
    }
}

/// Batch planning and artifact errors.
#[derive(Error, Debug)]
pub enum BatchError {
    /// Two tasks would write the same artifact
    #[error("duplicate task label \"{label}\" (tasks {first} and {second})")]
    DuplicateLabel {
        label: String,
        first: usize,
        second: usize,
    },

    /// The batch configuration references a catalog entry that does not exist
    #[error("unknown {table} entry: \"{key}\"")]
    UnknownEntry { table: &'static str, key: String },

    /// Batch configuration file is unreadable or malformed
    #[error("invalid batch config {path}: {message}")]
    InvalidConfig { path: PathBuf, message: String },

    /// Camera/lens catalog is unreadable or malformed
    #[error("invalid library {path}: {message}")]
    InvalidLibrary { path: PathBuf, message: String },

    /// Reference image or output directory I/O failure
    #[error("IO error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure recorded for one task inside the batch pool.
///
/// Any error raised by a task is downgraded to this at the task boundary.
/// The HTTP status survives when the failure came from a provider response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct TaskError {
    pub message: String,
    pub status: Option<u16>,
}

impl TaskError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
        }
    }
}

impl From<String> for TaskError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for TaskError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<ProviderError> for TaskError {
    fn from(err: ProviderError) -> Self {
        Self {
            status: err.status_code(),
            message: err.to_string(),
        }
    }
}

impl From<EngelError> for TaskError {
    fn from(err: EngelError) -> Self {
        match err {
            EngelError::Provider(provider) => provider.into(),
            other => Self::new(other.to_string()),
        }
    }
}

/// Convenience type alias for Engelism results.
pub type Result<T> = std::result::Result<T, EngelError>;
