//! File records and their derived artifacts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum characters kept in a file preview.
pub const PREVIEW_CHARS: usize = 280;

/// Declared type of an ingested file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Markdown,
    Text,
    Code,
    Html,
    Document,
    Unknown,
}

impl FileKind {
    /// Infer the kind from a file name's extension.
    pub fn from_name(name: &str) -> Self {
        let ext = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "md" | "markdown" | "mdown" => FileKind::Markdown,
            "txt" | "log" | "csv" => FileKind::Text,
            "rs" | "py" | "js" | "ts" | "jsx" | "tsx" | "java" | "c" | "cpp" | "h" | "go"
            | "rb" | "sh" | "json" | "yaml" | "yml" | "toml" | "sql" | "css" => FileKind::Code,
            "html" | "htm" | "xhtml" => FileKind::Html,
            "doc" | "docx" | "pdf" | "rtf" | "odt" => FileKind::Document,
            _ => FileKind::Unknown,
        }
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FileKind::Markdown => "markdown",
            FileKind::Text => "text",
            FileKind::Code => "code",
            FileKind::Html => "html",
            FileKind::Document => "document",
            FileKind::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Per-file processing state.
///
/// A file that fails extraction keeps its raw content but is durably marked
/// `Error`; the failure is also surfaced on the extract step's warning list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingState {
    #[default]
    Pending,
    Extracting,
    Analyzing,
    Ready,
    Error,
}

/// Structural metadata produced by text extraction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileStructure {
    /// Headings as (level, text) pairs
    pub headings: Vec<(u8, String)>,

    /// Number of fenced code blocks
    pub code_blocks: usize,

    /// Languages declared on fenced code blocks
    pub code_languages: Vec<String>,

    /// Number of list items
    pub list_items: usize,

    /// Number of links
    pub links: usize,

    /// Word count of the extracted text
    pub word_count: usize,
}

/// Per-file AI analysis result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Free-text summary of the file
    pub summary: String,

    /// Main topics identified in the file
    pub topics: Vec<String>,

    /// Model that produced the analysis
    pub model: String,

    /// When the analysis ran
    pub analyzed_at: DateTime<Utc>,
}

/// A file ingested for the current session.
///
/// Created on upload, paste, or scrape; mutated in place by extraction and
/// analysis; removed by explicit user action or bulk clear. Never persisted
/// beyond the session boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagedFile {
    /// Opaque id, unique within the session
    pub id: Uuid,

    /// Original file name
    pub name: String,

    /// Raw text content
    pub content: String,

    /// Declared or inferred type
    pub kind: FileKind,

    /// Byte length of `content` at creation
    pub size: usize,

    /// Last-modified timestamp
    pub last_modified: DateTime<Utc>,

    /// Truncated content for display
    pub preview: Option<String>,

    /// Plain text produced by extraction
    pub extracted_text: Option<String>,

    /// Structural metadata produced by extraction
    pub structure: Option<FileStructure>,

    /// AI analysis result
    pub analysis: Option<AnalysisReport>,

    /// Processing state
    pub state: ProcessingState,
}

impl StagedFile {
    /// Create a new staged file; size and preview are computed from content.
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        let name = name.into();
        let content = content.into();
        let kind = FileKind::from_name(&name);
        Self::with_kind(name, content, kind)
    }

    /// Create with an explicitly declared kind.
    pub fn with_kind(name: impl Into<String>, content: impl Into<String>, kind: FileKind) -> Self {
        let name = name.into();
        let content = content.into();
        let size = content.len();
        let preview = make_preview(&content);

        Self {
            id: Uuid::new_v4(),
            name,
            content,
            kind,
            size,
            last_modified: Utc::now(),
            preview,
            extracted_text: None,
            structure: None,
            analysis: None,
            state: ProcessingState::Pending,
        }
    }

    /// Set the last-modified timestamp.
    pub fn with_last_modified(mut self, at: DateTime<Utc>) -> Self {
        self.last_modified = at;
        self
    }

    /// Text to feed downstream consumers: extracted text when present,
    /// raw content otherwise.
    pub fn effective_text(&self) -> &str {
        self.extracted_text.as_deref().unwrap_or(&self.content)
    }
}

/// Partial patch applied to a staged file.
#[derive(Debug, Clone, Default)]
pub struct FilePatch {
    pub name: Option<String>,
    pub extracted_text: Option<String>,
    pub structure: Option<FileStructure>,
    pub analysis: Option<AnalysisReport>,
    pub state: Option<ProcessingState>,
}

impl FilePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn extracted_text(mut self, text: impl Into<String>) -> Self {
        self.extracted_text = Some(text.into());
        self
    }

    pub fn structure(mut self, structure: FileStructure) -> Self {
        self.structure = Some(structure);
        self
    }

    pub fn analysis(mut self, analysis: AnalysisReport) -> Self {
        self.analysis = Some(analysis);
        self
    }

    pub fn state(mut self, state: ProcessingState) -> Self {
        self.state = Some(state);
        self
    }

    /// Apply this patch to a file record.
    pub fn apply_to(self, file: &mut StagedFile) {
        if let Some(name) = self.name {
            file.name = name;
        }
        if let Some(text) = self.extracted_text {
            file.extracted_text = Some(text);
        }
        if let Some(structure) = self.structure {
            file.structure = Some(structure);
        }
        if let Some(analysis) = self.analysis {
            file.analysis = Some(analysis);
        }
        if let Some(state) = self.state {
            file.state = state;
        }
    }
}

/// Read-only `{name, content}` projection used as pipeline/provider input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDoc {
    pub name: String,
    pub content: String,
}

impl SourceDoc {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

fn make_preview(content: &str) -> Option<String> {
    if content.is_empty() {
        return None;
    }
    if content.chars().count() <= PREVIEW_CHARS {
        return Some(content.to_string());
    }
    let truncated: String = content.chars().take(PREVIEW_CHARS).collect();
    Some(format!("{truncated}…"))
}
