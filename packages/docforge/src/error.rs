//! Typed errors for the docforge library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling. Every kind carries a
//! human-readable message distinct enough to drive differentiated
//! caller messaging; callers branch on the variant, never on message
//! substrings.

use thiserror::Error;
use uuid::Uuid;

use crate::types::provider::ProviderKind;

/// Top-level errors for docforge operations.
#[derive(Debug, Error)]
pub enum DocforgeError {
    /// A provider-facing operation failed
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    /// A pipeline run failed
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// A file registry operation failed
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Text extraction failed
    #[error("extraction error: {0}")]
    Extract(#[from] ExtractError),

    /// Settings persistence failed
    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

/// Errors raised by provider capabilities and the orchestrator.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Keyed-provider validation rejected the supplied secret
    #[error("credential rejected: {message}")]
    InvalidCredential { message: String },

    /// Account-provider client failed to initialize within its bound
    #[error("provider client not available after {timeout_ms}ms")]
    Unavailable { timeout_ms: u64 },

    /// Account-provider health probe reported not-healthy
    #[error("provider unhealthy: {message}")]
    Unhealthy { message: String },

    /// Interactive sign-in did not complete or could not be verified
    #[error("sign-in failed: {message}")]
    SignInFailed { message: String },

    /// Post-signin connectivity check failed
    #[error("connection test failed")]
    ConnectionTestFailed,

    /// A generation-family call was attempted while the provider is not ready
    #[error("{provider} provider is not ready")]
    NotReady { provider: ProviderKind },

    /// The provider's generation call itself failed
    #[error("generation failed: {message}")]
    Generation { message: String },

    /// The provider's file-compilation call failed
    #[error("compilation failed: {message}")]
    Compilation { message: String },

    /// The provider's condensation call failed
    #[error("condensation failed: {message}")]
    Condensation { message: String },

    /// Model catalog fetch failed
    #[error("catalog fetch failed: {message}")]
    CatalogFetch { message: String },

    /// A provider call exceeded the configured bound
    #[error("{operation} timed out")]
    Timeout { operation: String },

    /// Transport-level failure inside a concrete provider implementation
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors raised by pipeline runs.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A step's core operation failed; terminates the run
    #[error("step '{step}' failed: {message}")]
    StepFailed { step: String, message: String },
}

/// Errors raised by the file registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Adding would exceed the configured maximum file count
    #[error("file limit of {limit} reached")]
    CapacityExceeded { limit: usize },

    /// No file with the given id
    #[error("unknown file: {id}")]
    UnknownFile { id: Uuid },
}

/// Errors raised by text extraction.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The extractor cannot handle this file kind
    #[error("unsupported file kind: {kind}")]
    Unsupported { kind: String },

    /// The content could not be decoded as text
    #[error("decode failed: {message}")]
    Decode { message: String },

    /// The file has no extractable content
    #[error("file is empty")]
    EmptyContent,
}

/// Errors raised by the settings store.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Record could not be serialized or deserialized
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backing store failed
    #[error("settings backend error: {message}")]
    Backend { message: String },
}

/// Result type alias for docforge operations.
pub type Result<T> = std::result::Result<T, DocforgeError>;

/// Result type alias for provider operations.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Result type alias for extraction operations.
pub type ExtractResult<T> = std::result::Result<T, ExtractError>;

/// Result type alias for registry operations.
pub type RegistryResult<T> = std::result::Result<T, RegistryError>;

/// Result type alias for settings operations.
pub type SettingsResult<T> = std::result::Result<T, SettingsError>;
