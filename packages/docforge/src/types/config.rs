//! Configuration records persisted across sessions.

use serde::{Deserialize, Serialize};

use crate::traits::provider::ModelInfo;
use crate::types::provider::ProviderKind;

/// How the combine stage assembles the final document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    /// Raw contents joined in order
    Concatenate,

    /// One titled section per file
    Sections,

    /// Delegated to the provider's file-compilation capability
    AiCompiled,
}

impl Default for MergeStrategy {
    fn default() -> Self {
        Self::Sections
    }
}

/// Output format of the combined document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Markdown,
    PlainText,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Markdown
    }
}

/// Options for the combine stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombineOptions {
    /// Assembly strategy
    pub strategy: MergeStrategy,

    /// Prepend a table of contents
    pub table_of_contents: bool,

    /// Separator inserted between sections
    pub separator: String,

    /// Keep original heading levels; when false, file headings are demoted
    /// one level under each section heading
    pub preserve_structure: bool,

    /// Collapse runs of blank lines
    pub remove_blank_lines: bool,

    /// Output format
    pub format: OutputFormat,

    /// Document title
    pub title: Option<String>,

    /// Document description placed under the title
    pub description: Option<String>,
}

impl Default for CombineOptions {
    fn default() -> Self {
        Self {
            strategy: MergeStrategy::default(),
            table_of_contents: false,
            separator: "\n\n---\n\n".to_string(),
            preserve_structure: true,
            remove_blank_lines: false,
            format: OutputFormat::default(),
            title: None,
            description: None,
        }
    }
}

impl CombineOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strategy(mut self, strategy: MergeStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_table_of_contents(mut self) -> Self {
        self.table_of_contents = true;
        self
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn flatten_structure(mut self) -> Self {
        self.preserve_structure = false;
        self
    }

    pub fn remove_blank_lines(mut self) -> Self {
        self.remove_blank_lines = true;
        self
    }
}

/// Provider+model pair for the analyze stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeOptions {
    pub provider: ProviderKind,
    pub model: String,
}

impl AnalyzeOptions {
    pub fn new(provider: ProviderKind, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }
}

/// The flat configuration record the orchestrator persists.
///
/// Stored write-through: every mutation that should survive a reload is
/// flushed immediately. Persistence failures are logged, never propagated.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ConfigRecord {
    /// Keyed-provider credential, as last supplied (valid or not)
    pub api_key: Option<String>,

    /// Whether the last credential validation succeeded
    pub api_key_valid: bool,

    /// Whether the account provider completed its connection flow
    pub account_connected: bool,

    /// Active provider tag
    pub active_provider: ProviderKind,

    /// Active model identifier
    pub active_model: String,

    /// Cached keyed-provider catalog
    pub keyed_catalog: Vec<ModelInfo>,

    /// Cached account-provider catalog
    pub account_catalog: Vec<ModelInfo>,

    /// Combine-stage preferences
    pub combine_options: CombineOptions,
}

// The credential never appears in debug output.
impl std::fmt::Debug for ConfigRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigRecord")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_key_valid", &self.api_key_valid)
            .field("account_connected", &self.account_connected)
            .field("active_provider", &self.active_provider)
            .field("active_model", &self.active_model)
            .field("keyed_catalog", &self.keyed_catalog.len())
            .field("account_catalog", &self.account_catalog.len())
            .field("combine_options", &self.combine_options)
            .finish()
    }
}

/// Merge-set companion to [`ConfigRecord`]: only set fields are applied.
///
/// `api_key` is doubly optional so a credential can be cleared
/// (`Some(None)`) as well as replaced (`Some(Some(..))`).
#[derive(Debug, Clone, Default)]
pub struct ConfigPatch {
    pub api_key: Option<Option<String>>,
    pub api_key_valid: Option<bool>,
    pub account_connected: Option<bool>,
    pub active_provider: Option<ProviderKind>,
    pub active_model: Option<String>,
    pub keyed_catalog: Option<Vec<ModelInfo>>,
    pub account_catalog: Option<Vec<ModelInfo>>,
    pub combine_options: Option<CombineOptions>,
}

impl ConfigPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn api_key(mut self, key: Option<String>) -> Self {
        self.api_key = Some(key);
        self
    }

    pub fn api_key_valid(mut self, valid: bool) -> Self {
        self.api_key_valid = Some(valid);
        self
    }

    pub fn account_connected(mut self, connected: bool) -> Self {
        self.account_connected = Some(connected);
        self
    }

    pub fn active_provider(mut self, provider: ProviderKind) -> Self {
        self.active_provider = Some(provider);
        self
    }

    pub fn active_model(mut self, model: impl Into<String>) -> Self {
        self.active_model = Some(model.into());
        self
    }

    pub fn catalog(mut self, provider: ProviderKind, catalog: Vec<ModelInfo>) -> Self {
        match provider {
            ProviderKind::Keyed => self.keyed_catalog = Some(catalog),
            ProviderKind::Account => self.account_catalog = Some(catalog),
        }
        self
    }

    pub fn combine_options(mut self, options: CombineOptions) -> Self {
        self.combine_options = Some(options);
        self
    }

    /// Apply this patch to a record.
    pub fn apply_to(self, record: &mut ConfigRecord) {
        if let Some(key) = self.api_key {
            record.api_key = key;
        }
        if let Some(valid) = self.api_key_valid {
            record.api_key_valid = valid;
        }
        if let Some(connected) = self.account_connected {
            record.account_connected = connected;
        }
        if let Some(provider) = self.active_provider {
            record.active_provider = provider;
        }
        if let Some(model) = self.active_model {
            record.active_model = model;
        }
        if let Some(catalog) = self.keyed_catalog {
            record.keyed_catalog = catalog;
        }
        if let Some(catalog) = self.account_catalog {
            record.account_catalog = catalog;
        }
        if let Some(options) = self.combine_options {
            record.combine_options = options;
        }
    }
}
