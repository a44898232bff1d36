//! Provider-Agnostic Document Compilation Library
//!
//! Coordinates a session's ingested files, two interchangeable AI
//! providers, and a multi-stage processing pipeline that compiles those
//! files into a single document. There is no intelligence here: all model
//! work is delegated to an external provider behind a capability trait,
//! and this crate owns the coordination: readiness state machines,
//! progress, cancellation, error isolation, and persisted configuration.
//!
//! # Design
//!
//! - One generation contract over two structurally different providers
//!   (credential-based and session-based); readiness is a per-provider
//!   boolean gate in front of every call.
//! - Fail-soft per file, fail-fast per step: one bad file never fails an
//!   extraction pass, but one failed step ends the run.
//! - Cooperative cancellation: a cancelled run turns terminal immediately,
//!   and in-flight provider calls are left to resolve and be discarded.
//!
//! # Usage
//!
//! ```rust,ignore
//! use docforge::{
//!     FileRegistry, MemorySettings, Pipeline, PipelineConfig, ProviderOrchestrator,
//!     CombineOptions, MarkdownExtractor,
//! };
//! use docforge::testing::{MockKeyedProvider, MockSessionProvider};
//!
//! let registry = FileRegistry::new();
//! registry.add("notes.md", "# Notes\n...")?;
//!
//! let orchestrator = ProviderOrchestrator::new(
//!     MockKeyedProvider::new(),
//!     MockSessionProvider::new(),
//!     MemorySettings::new(),
//! ).await;
//! orchestrator.set_credential("sk-...").await?;
//!
//! let config = PipelineConfig::new("Handbook")
//!     .with_extract()
//!     .with_combine(CombineOptions::default());
//! let pipeline = Pipeline::from_registry(config, &registry);
//! pipeline.execute(&orchestrator, &MarkdownExtractor::new(), &registry).await?;
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Core trait abstractions (providers, extraction, settings)
//! - [`types`] - Files, configuration, selection, and result types
//! - [`orchestrator`] - Provider readiness, selection, and call gating
//! - [`pipeline`] - The extract/analyze/combine pipeline
//! - [`registry`] - The session file registry
//! - [`providers`] - Provider implementations and wrappers
//! - [`stores`] - Settings store implementations
//! - [`testing`] - Mock implementations for testing

pub mod chat;
pub mod error;
pub mod extractors;
pub mod orchestrator;
pub mod pipeline;
pub mod providers;
pub mod registry;
pub mod security;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{
    DocforgeError, ExtractError, PipelineError, ProviderError, RegistryError, SettingsError,
};
pub use traits::{
    extractor::TextExtractor,
    provider::{
        AiProvider, AuthStatus, ConnectionQuality, HealthReport, KeyedProvider, ModelInfo,
        SessionProvider,
    },
    settings::SettingsStore,
};
pub use types::{
    combination::{CombinationMeta, CombinationResult, FileRelationship, RelationKind},
    config::{
        AnalyzeOptions, CombineOptions, ConfigPatch, ConfigRecord, MergeStrategy, OutputFormat,
    },
    file::{
        AnalysisReport, FileKind, FilePatch, FileStructure, ProcessingState, SourceDoc, StagedFile,
    },
    provider::{ProviderKind, ProviderSelection},
};

// Re-export the orchestrator
pub use orchestrator::{OrchestratorConfig, ProviderOrchestrator};

// Re-export pipeline components
pub use pipeline::{
    analyze_relationships, combine_files, Pipeline, PipelineConfig, PipelineRun, PipelineStep,
    RunState, RunStatus, StepStatus,
};

// Re-export the registry
pub use registry::FileRegistry;

// Re-export stores and reference implementations
pub use extractors::MarkdownExtractor;
pub use providers::{ProviderExt, RateLimitedProvider};
pub use stores::MemorySettings;

#[cfg(feature = "openai")]
pub use providers::OpenAiProvider;

// Re-export the chat controller
pub use chat::{ChatRole, ChatSession, ChatTurn};

// Re-export the credential wrapper
pub use security::ApiCredential;
