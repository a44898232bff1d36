//! The session file registry.
//!
//! Holds the authoritative, mutable list of ingested files and enforces two
//! invariants: total file count never exceeds the configured maximum, and
//! every add assigns a fresh unique id with size computed from content
//! length. All checks are local and synchronous.

use indexmap::IndexMap;
use std::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::error::{RegistryError, RegistryResult};
use crate::types::file::{FileKind, FilePatch, SourceDoc, StagedFile};

/// Default maximum number of files held at once.
pub const DEFAULT_MAX_FILES: usize = 20;

/// Insertion-ordered, capacity-bounded collection of session files.
pub struct FileRegistry {
    max_files: usize,
    files: RwLock<IndexMap<Uuid, StagedFile>>,
}

impl Default for FileRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FileRegistry {
    /// Create a registry with the default capacity.
    pub fn new() -> Self {
        Self::with_max_files(DEFAULT_MAX_FILES)
    }

    /// Create a registry with an explicit capacity.
    pub fn with_max_files(max_files: usize) -> Self {
        Self {
            max_files,
            files: RwLock::new(IndexMap::new()),
        }
    }

    /// The configured maximum file count.
    pub fn max_files(&self) -> usize {
        self.max_files
    }

    /// Add a file built from name and content; kind inferred from the name.
    pub fn add(&self, name: impl Into<String>, content: impl Into<String>) -> RegistryResult<Uuid> {
        self.add_file(StagedFile::new(name, content))
    }

    /// Add a file with an explicitly declared kind.
    pub fn add_with_kind(
        &self,
        name: impl Into<String>,
        content: impl Into<String>,
        kind: FileKind,
    ) -> RegistryResult<Uuid> {
        self.add_file(StagedFile::with_kind(name, content, kind))
    }

    /// Add a pre-built file record.
    pub fn add_file(&self, file: StagedFile) -> RegistryResult<Uuid> {
        let mut files = self.files.write().unwrap();
        if files.len() >= self.max_files {
            return Err(RegistryError::CapacityExceeded {
                limit: self.max_files,
            });
        }

        let id = file.id;
        debug!(file = %file.name, size = file.size, "Registered file");
        files.insert(id, file);
        Ok(id)
    }

    /// Add several files at once. All-or-nothing: a batch that would exceed
    /// capacity fails without adding any file.
    pub fn add_batch(
        &self,
        entries: impl IntoIterator<Item = StagedFile>,
    ) -> RegistryResult<Vec<Uuid>> {
        let entries: Vec<StagedFile> = entries.into_iter().collect();

        let mut files = self.files.write().unwrap();
        if files.len() + entries.len() > self.max_files {
            return Err(RegistryError::CapacityExceeded {
                limit: self.max_files,
            });
        }

        let mut ids = Vec::with_capacity(entries.len());
        for file in entries {
            ids.push(file.id);
            files.insert(file.id, file);
        }
        Ok(ids)
    }

    /// Remove a file by id.
    pub fn remove(&self, id: Uuid) -> RegistryResult<()> {
        self.files
            .write()
            .unwrap()
            .shift_remove(&id)
            .map(|_| ())
            .ok_or(RegistryError::UnknownFile { id })
    }

    /// Apply a partial patch to a file.
    pub fn update(&self, id: Uuid, patch: FilePatch) -> RegistryResult<()> {
        let mut files = self.files.write().unwrap();
        let file = files
            .get_mut(&id)
            .ok_or(RegistryError::UnknownFile { id })?;
        patch.apply_to(file);
        Ok(())
    }

    /// Get a file by id.
    pub fn get(&self, id: Uuid) -> Option<StagedFile> {
        self.files.read().unwrap().get(&id).cloned()
    }

    /// All files, in insertion order.
    pub fn list(&self) -> Vec<StagedFile> {
        self.files.read().unwrap().values().cloned().collect()
    }

    /// Number of files held.
    pub fn len(&self) -> usize {
        self.files.read().unwrap().len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.files.read().unwrap().is_empty()
    }

    /// Remove all files.
    pub fn clear(&self) {
        self.files.write().unwrap().clear();
    }

    /// Read-only `{name, content}` projection used as pipeline and provider
    /// input. Prefers extracted text over raw content.
    pub fn sources(&self) -> Vec<SourceDoc> {
        self.files
            .read()
            .unwrap()
            .values()
            .map(|f| SourceDoc::new(&f.name, f.effective_text()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::file::ProcessingState;

    #[test]
    fn test_add_assigns_fresh_ids_and_sizes() {
        let registry = FileRegistry::new();
        let a = registry.add("a.md", "# A").unwrap();
        let b = registry.add("b.md", "# B and more").unwrap();

        assert_ne!(a, b);
        assert_eq!(registry.get(a).unwrap().size, 3);
        assert_eq!(registry.get(b).unwrap().size, 12);
    }

    #[test]
    fn test_capacity_limit_leaves_registry_unchanged() {
        let registry = FileRegistry::with_max_files(2);
        let a = registry.add("a.txt", "0123456789").unwrap();
        let b = registry.add("b.txt", "01234567890123456789").unwrap();

        let err = registry.add("c.txt", "x").unwrap_err();
        assert!(matches!(err, RegistryError::CapacityExceeded { limit: 2 }));

        let names: Vec<String> = registry.list().into_iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
        assert!(registry.get(a).is_some());
        assert!(registry.get(b).is_some());
    }

    #[test]
    fn test_batch_add_is_all_or_nothing() {
        let registry = FileRegistry::with_max_files(2);
        registry.add("a.txt", "a").unwrap();

        let batch = vec![
            StagedFile::new("b.txt", "b"),
            StagedFile::new("c.txt", "c"),
        ];
        let err = registry.add_batch(batch).unwrap_err();
        assert!(matches!(err, RegistryError::CapacityExceeded { .. }));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_unknown_file_errors() {
        let registry = FileRegistry::new();
        let err = registry.remove(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, RegistryError::UnknownFile { .. }));
    }

    #[test]
    fn test_update_patches_in_place() {
        let registry = FileRegistry::new();
        let id = registry.add("a.html", "<p>hi</p>").unwrap();

        registry
            .update(
                id,
                FilePatch::new()
                    .extracted_text("hi")
                    .state(ProcessingState::Ready),
            )
            .unwrap();

        let file = registry.get(id).unwrap();
        assert_eq!(file.extracted_text.as_deref(), Some("hi"));
        assert_eq!(file.state, ProcessingState::Ready);
    }

    #[test]
    fn test_sources_prefers_extracted_text() {
        let registry = FileRegistry::new();
        let id = registry.add("a.html", "<p>hi</p>").unwrap();
        registry.add("b.txt", "raw only").unwrap();

        registry
            .update(id, FilePatch::new().extracted_text("hi"))
            .unwrap();

        let sources = registry.sources();
        assert_eq!(sources[0].content, "hi");
        assert_eq!(sources[1].content, "raw only");
    }

    #[test]
    fn test_clear_empties_registry() {
        let registry = FileRegistry::new();
        registry.add("a.txt", "a").unwrap();
        registry.add("b.txt", "b").unwrap();

        registry.clear();
        assert!(registry.is_empty());
    }
}
