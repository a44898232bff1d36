//! Settings persistence trait.

use async_trait::async_trait;

use crate::error::SettingsResult;
use crate::types::config::{ConfigPatch, ConfigRecord};

/// Persists the flat configuration record across reloads.
///
/// Pure key-value semantics: `load` the whole record, `merge` a partial
/// patch. The orchestrator treats persistence as write-through and
/// fire-and-forget; merge failures are logged by the caller, never
/// propagated as operation failures.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Load the full record. Missing state yields the default record.
    async fn load(&self) -> SettingsResult<ConfigRecord>;

    /// Merge the set fields of `patch` into the stored record.
    async fn merge(&self, patch: ConfigPatch) -> SettingsResult<()>;
}

// A shared store is a store; lets one backing record outlive an
// orchestrator (reload scenarios).
#[async_trait]
impl<S: SettingsStore + ?Sized> SettingsStore for std::sync::Arc<S> {
    async fn load(&self) -> SettingsResult<ConfigRecord> {
        (**self).load().await
    }

    async fn merge(&self, patch: ConfigPatch) -> SettingsResult<()> {
        (**self).merge(patch).await
    }
}
