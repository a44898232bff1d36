//! Provider capability traits.
//!
//! Two structurally different AI providers sit behind one generation
//! contract:
//! - [`KeyedProvider`]: requires an explicit API credential.
//! - [`SessionProvider`]: requires an interactive session (client runtime,
//!   health probe, sign-in, connectivity test).
//!
//! The orchestrator depends only on these traits, never on a concrete
//! implementation. The shared surface is [`AiProvider`]; the genuinely
//! asymmetric operations (session management, provider-side message
//! handling) live on the variant-specific traits rather than being forced
//! into a false symmetry.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ProviderResult;
use crate::security::ApiCredential;
use crate::types::file::SourceDoc;

/// One entry in a provider's model catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Provider-namespaced model identifier
    pub id: String,

    /// Display name
    pub name: String,

    /// Short description
    pub description: String,
}

impl ModelInfo {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            description: String::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Result of a session provider's health probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub healthy: bool,
    pub message: String,
}

impl HealthReport {
    pub fn healthy() -> Self {
        Self {
            healthy: true,
            message: "ok".to_string(),
        }
    }

    pub fn unhealthy(message: impl Into<String>) -> Self {
        Self {
            healthy: false,
            message: message.into(),
        }
    }
}

/// Connection quality reported by a session provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionQuality {
    Good,
    Degraded,
    Offline,
}

/// Snapshot of a session provider's authentication state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthStatus {
    pub signed_in: bool,
    pub username: Option<String>,
    pub connection_quality: ConnectionQuality,
    pub last_connected: Option<DateTime<Utc>>,
}

impl AuthStatus {
    pub fn signed_out() -> Self {
        Self {
            signed_in: false,
            username: None,
            connection_quality: ConnectionQuality::Offline,
            last_connected: None,
        }
    }
}

/// The generation contract shared by both providers.
///
/// Implementations wrap a concrete vendor SDK/API; callers never see the
/// vendor's request or response shapes. All operations may suspend on
/// network I/O and may fail; the orchestrator wraps failures into the
/// stable error taxonomy.
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Fetch the provider's current model catalog.
    async fn list_models(&self) -> ProviderResult<Vec<ModelInfo>>;

    /// Plain text generation with the given model.
    async fn generate(&self, prompt: &str, model: &str) -> ProviderResult<String>;

    /// Compile multiple files into a single document.
    async fn process_files(
        &self,
        files: &[SourceDoc],
        document_name: &str,
        model: &str,
    ) -> ProviderResult<String>;

    /// Condense content into a shorter rendition.
    async fn condense(&self, content: &str, model: &str) -> ProviderResult<String> {
        // Default goes through the plain generation path.
        let prompt = format!(
            "Condense the following document, preserving headings and key facts:\n\n{content}"
        );
        self.generate(&prompt, model).await
    }
}

/// A provider gated by an explicit API credential.
#[async_trait]
pub trait KeyedProvider: AiProvider {
    /// Install (or replace) the credential used for subsequent calls.
    fn install_credential(&self, credential: ApiCredential);

    /// Remove any installed credential.
    fn clear_credential(&self);

    /// Lightweight validation call for the installed credential.
    ///
    /// `Ok(false)` means the provider rejected the credential; `Err` means
    /// the validation call itself failed.
    async fn validate(&self) -> ProviderResult<bool>;
}

/// A provider gated by an interactive session.
#[async_trait]
pub trait SessionProvider: AiProvider {
    /// Whether the provider's client runtime is present at all.
    fn is_available(&self) -> bool;

    /// Wait for the client runtime to finish loading, up to `timeout`.
    ///
    /// Returns `Ok(false)` when the bound elapsed before the client was
    /// ready; implementations must not hang past the bound.
    async fn wait_for_ready(&self, timeout: Duration) -> ProviderResult<bool>;

    /// Probe the provider's health.
    async fn health_check(&self) -> ProviderResult<HealthReport>;

    /// Whether a session currently exists.
    async fn is_signed_in(&self) -> ProviderResult<bool>;

    /// Initiate interactive sign-in (may open a user-facing prompt).
    async fn sign_in(&self) -> ProviderResult<()>;

    /// Terminate the session.
    async fn sign_out(&self) -> ProviderResult<()>;

    /// Connectivity test, distinct from the health probe.
    async fn test_connection(&self) -> ProviderResult<bool>;

    /// Snapshot of the authentication state.
    async fn auth_status(&self) -> ProviderResult<AuthStatus>;

    /// Provider-side message handling with provider-assembled context.
    ///
    /// The keyed provider has no equivalent; the orchestrator concatenates
    /// context and message into its plain generation path instead.
    async fn respond(&self, message: &str, context: &str, model: &str) -> ProviderResult<String>;
}

// A shared provider is a provider; lets a caller keep a handle on the
// instance it hands to the orchestrator.
#[async_trait]
impl<P: AiProvider + ?Sized> AiProvider for std::sync::Arc<P> {
    async fn list_models(&self) -> ProviderResult<Vec<ModelInfo>> {
        (**self).list_models().await
    }

    async fn generate(&self, prompt: &str, model: &str) -> ProviderResult<String> {
        (**self).generate(prompt, model).await
    }

    async fn process_files(
        &self,
        files: &[SourceDoc],
        document_name: &str,
        model: &str,
    ) -> ProviderResult<String> {
        (**self).process_files(files, document_name, model).await
    }

    async fn condense(&self, content: &str, model: &str) -> ProviderResult<String> {
        (**self).condense(content, model).await
    }
}

#[async_trait]
impl<P: KeyedProvider + ?Sized> KeyedProvider for std::sync::Arc<P> {
    fn install_credential(&self, credential: ApiCredential) {
        (**self).install_credential(credential)
    }

    fn clear_credential(&self) {
        (**self).clear_credential()
    }

    async fn validate(&self) -> ProviderResult<bool> {
        (**self).validate().await
    }
}

#[async_trait]
impl<P: SessionProvider + ?Sized> SessionProvider for std::sync::Arc<P> {
    fn is_available(&self) -> bool {
        (**self).is_available()
    }

    async fn wait_for_ready(&self, timeout: Duration) -> ProviderResult<bool> {
        (**self).wait_for_ready(timeout).await
    }

    async fn health_check(&self) -> ProviderResult<HealthReport> {
        (**self).health_check().await
    }

    async fn is_signed_in(&self) -> ProviderResult<bool> {
        (**self).is_signed_in().await
    }

    async fn sign_in(&self) -> ProviderResult<()> {
        (**self).sign_in().await
    }

    async fn sign_out(&self) -> ProviderResult<()> {
        (**self).sign_out().await
    }

    async fn test_connection(&self) -> ProviderResult<bool> {
        (**self).test_connection().await
    }

    async fn auth_status(&self) -> ProviderResult<AuthStatus> {
        (**self).auth_status().await
    }

    async fn respond(&self, message: &str, context: &str, model: &str) -> ProviderResult<String> {
        (**self).respond(message, context, model).await
    }
}
