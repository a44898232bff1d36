//! Text extraction trait.

use async_trait::async_trait;

use crate::error::ExtractResult;
use crate::types::file::{FileStructure, StagedFile};

/// Produces plain text and structural metadata from a file's raw content.
///
/// Stateless; may fail per file. Per-file failures are isolated by the
/// pipeline (fail-soft) and never abort the extract step.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extract plain text from the file's raw content.
    async fn extract_text(&self, file: &StagedFile) -> ExtractResult<String>;

    /// Extract structural metadata (headings, code blocks, lists, links).
    async fn extract_metadata(&self, file: &StagedFile) -> ExtractResult<FileStructure>;
}
