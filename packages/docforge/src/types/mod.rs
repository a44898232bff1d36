//! Data types for files, configuration, providers, and results.

pub mod combination;
pub mod config;
pub mod file;
pub mod provider;

pub use combination::{CombinationMeta, CombinationResult, FileRelationship, RelationKind};
pub use config::{
    AnalyzeOptions, CombineOptions, ConfigPatch, ConfigRecord, MergeStrategy, OutputFormat,
};
pub use file::{
    AnalysisReport, FileKind, FilePatch, FileStructure, ProcessingState, SourceDoc, StagedFile,
};
pub use provider::{ProviderKind, ProviderSelection};
