//! Combination results and derived relationship artifacts.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata computed alongside a combined document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CombinationMeta {
    /// Number of files that contributed content
    pub files_processed: usize,

    /// Word count of the final document
    pub total_words: usize,

    /// Character count of the final document
    pub total_chars: usize,

    /// Files elided because their content duplicated an earlier file
    pub duplicates_removed: usize,

    /// Sections created in the final document
    pub sections_created: usize,

    /// Wall-clock processing time
    pub processing_time_ms: u64,
}

/// The final document produced by a combine step. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombinationResult {
    /// Final document text
    pub content: String,

    /// Computed metadata
    pub meta: CombinationMeta,

    /// Human-readable caveats (duplicates skipped, empty files, ...)
    pub warnings: Vec<String>,

    /// Human-readable follow-ups
    pub suggestions: Vec<String>,
}

/// How two files relate to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    Similar,
    Complementary,
    Duplicate,
    Reference,
}

/// A derived, recomputable relationship between two files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRelationship {
    pub source_id: Uuid,
    pub target_id: Uuid,
    pub kind: RelationKind,

    /// Strength score, clamped into [0, 1]
    pub strength: f32,

    pub description: String,
}

impl FileRelationship {
    pub fn new(source_id: Uuid, target_id: Uuid, kind: RelationKind, strength: f32) -> Self {
        Self {
            source_id,
            target_id,
            kind,
            strength: strength.clamp(0.0, 1.0),
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}
