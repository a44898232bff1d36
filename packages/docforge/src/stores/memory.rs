//! In-memory settings store for testing and development.

use async_trait::async_trait;
use std::sync::RwLock;

use crate::error::SettingsResult;
use crate::traits::settings::SettingsStore;
use crate::types::config::{ConfigPatch, ConfigRecord};

/// In-memory [`SettingsStore`].
///
/// Useful for testing and development; data is lost when the process exits.
pub struct MemorySettings {
    record: RwLock<ConfigRecord>,
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySettings {
    /// Create a store holding the default record.
    pub fn new() -> Self {
        Self {
            record: RwLock::new(ConfigRecord::default()),
        }
    }

    /// Create a store pre-seeded with a record.
    pub fn with_record(record: ConfigRecord) -> Self {
        Self {
            record: RwLock::new(record),
        }
    }

    /// Snapshot of the current record (for assertions).
    pub fn record(&self) -> ConfigRecord {
        self.record.read().unwrap().clone()
    }
}

#[async_trait]
impl SettingsStore for MemorySettings {
    async fn load(&self) -> SettingsResult<ConfigRecord> {
        Ok(self.record.read().unwrap().clone())
    }

    async fn merge(&self, patch: ConfigPatch) -> SettingsResult<()> {
        patch.apply_to(&mut self.record.write().unwrap());
        Ok(())
    }
}
