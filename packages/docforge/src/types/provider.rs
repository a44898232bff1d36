//! Provider selection types.

use serde::{Deserialize, Serialize};

use crate::traits::provider::ModelInfo;

/// Tag identifying one of the two interchangeable AI providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Credential-based provider (explicit API key)
    Keyed,

    /// Session-based provider (interactive sign-in)
    Account,
}

impl ProviderKind {
    /// The model used for this provider before its catalog is first fetched.
    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::Keyed => "gpt-4o-mini",
            ProviderKind::Account => "default",
        }
    }

}

impl Default for ProviderKind {
    fn default() -> Self {
        Self::Keyed
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::Keyed => f.write_str("keyed"),
            ProviderKind::Account => f.write_str("account"),
        }
    }
}

/// The active provider/model choice plus per-provider readiness and catalogs.
///
/// Exactly one provider is active at a time. The active model belongs to the
/// active provider's catalog once that catalog is non-empty; until the first
/// fetch, the provider default is used.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSelection {
    /// The currently active provider
    pub active: ProviderKind,

    /// Active model identifier (provider-namespaced)
    pub model: String,

    /// Keyed-provider readiness gate
    pub keyed_ready: bool,

    /// Account-provider readiness gate
    pub account_ready: bool,

    /// Cached model catalog for the keyed provider
    pub keyed_catalog: Vec<ModelInfo>,

    /// Cached model catalog for the account provider
    pub account_catalog: Vec<ModelInfo>,
}

impl Default for ProviderSelection {
    fn default() -> Self {
        let active = ProviderKind::default();
        Self {
            active,
            model: active.default_model().to_string(),
            keyed_ready: false,
            account_ready: false,
            keyed_catalog: Vec::new(),
            account_catalog: Vec::new(),
        }
    }
}

impl ProviderSelection {
    /// Readiness of the given provider.
    pub fn ready(&self, kind: ProviderKind) -> bool {
        match kind {
            ProviderKind::Keyed => self.keyed_ready,
            ProviderKind::Account => self.account_ready,
        }
    }

    /// Set readiness of the given provider.
    pub fn set_ready(&mut self, kind: ProviderKind, ready: bool) {
        match kind {
            ProviderKind::Keyed => self.keyed_ready = ready,
            ProviderKind::Account => self.account_ready = ready,
        }
    }

    /// Cached catalog for the given provider.
    pub fn catalog(&self, kind: ProviderKind) -> &[ModelInfo] {
        match kind {
            ProviderKind::Keyed => &self.keyed_catalog,
            ProviderKind::Account => &self.account_catalog,
        }
    }

    /// Replace the cached catalog for the given provider.
    pub fn set_catalog(&mut self, kind: ProviderKind, catalog: Vec<ModelInfo>) {
        match kind {
            ProviderKind::Keyed => self.keyed_catalog = catalog,
            ProviderKind::Account => self.account_catalog = catalog,
        }
    }
}
