//! The provider orchestrator.
//!
//! Presents one generation/analysis contract regardless of which of the two
//! underlying AI capabilities is active, tracks each capability's readiness
//! independently, and persists the user's provider/model choice.
//!
//! Readiness is a boolean gate in front of every generation call: the state
//! machine per provider is `Uninitialized → Ready` (credential validated,
//! or interactive session confirmed healthy) and back (validation failure
//! or explicit sign-out). There is no partial-ready state, so the caller
//! always knows in O(1) whether a call will attempt a network round-trip or
//! fail fast. Each provider is volatile on its own schedule (rate limits,
//! auth expiry, transient failures) and must not take down the other.

use std::sync::RwLock;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{ProviderError, Result};
use crate::security::ApiCredential;
use crate::traits::provider::{
    AiProvider, AuthStatus, KeyedProvider, ModelInfo, SessionProvider,
};
use crate::traits::settings::SettingsStore;
use crate::types::config::{ConfigPatch, ConfigRecord};
use crate::types::file::SourceDoc;
use crate::types::provider::{ProviderKind, ProviderSelection};

/// Timeouts applied around suspending provider calls.
///
/// External providers are untrusted and high-latency; every call that can
/// suspend on the network is bounded.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Bound on every generation/validation/catalog call
    pub call_timeout: Duration,

    /// Bound on the account provider's client-runtime load wait
    pub client_load_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(60),
            client_load_timeout: Duration::from_secs(15),
        }
    }
}

impl OrchestratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn with_client_load_timeout(mut self, timeout: Duration) -> Self {
        self.client_load_timeout = timeout;
        self
    }
}

/// Unifies the keyed and account providers behind one contract.
pub struct ProviderOrchestrator<K, A, S> {
    keyed: K,
    account: A,
    settings: S,
    state: RwLock<ProviderSelection>,
    config: OrchestratorConfig,
}

impl<K, A, S> ProviderOrchestrator<K, A, S>
where
    K: KeyedProvider,
    A: SessionProvider,
    S: SettingsStore,
{
    /// Create an orchestrator, restoring selection and readiness from the
    /// settings store.
    pub async fn new(keyed: K, account: A, settings: S) -> Self {
        Self::with_config(keyed, account, settings, OrchestratorConfig::default()).await
    }

    /// Create with explicit timeout configuration.
    pub async fn with_config(
        keyed: K,
        account: A,
        settings: S,
        config: OrchestratorConfig,
    ) -> Self {
        let record = match settings.load().await {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "Failed to load settings; starting from defaults");
                ConfigRecord::default()
            }
        };

        let mut selection = ProviderSelection {
            active: record.active_provider,
            model: if record.active_model.is_empty() {
                record.active_provider.default_model().to_string()
            } else {
                record.active_model.clone()
            },
            // The persisted flags record the last validation/connection
            // outcome; every call stays gated and error-wrapped regardless.
            keyed_ready: record.api_key_valid && record.api_key.is_some(),
            account_ready: record.account_connected,
            keyed_catalog: record.keyed_catalog.clone(),
            account_catalog: record.account_catalog.clone(),
        };

        if let Some(key) = &record.api_key {
            keyed.install_credential(ApiCredential::new(key.clone()));
        } else {
            selection.keyed_ready = false;
        }

        Self {
            keyed,
            account,
            settings,
            state: RwLock::new(selection),
            config,
        }
    }

    /// The timeout configuration.
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Snapshot of the current selection.
    pub fn selection(&self) -> ProviderSelection {
        self.state.read().unwrap().clone()
    }

    /// Readiness of the given provider.
    pub fn ready(&self, kind: ProviderKind) -> bool {
        self.state.read().unwrap().ready(kind)
    }

    /// The active provider.
    pub fn active_provider(&self) -> ProviderKind {
        self.state.read().unwrap().active
    }

    /// The active model identifier.
    pub fn active_model(&self) -> String {
        self.state.read().unwrap().model.clone()
    }

    // =========================================================================
    // Credential / connection management
    // =========================================================================

    /// Install and validate a credential for the keyed provider.
    ///
    /// On success the provider becomes ready, the secret and validity flag
    /// are persisted, and the model catalog is refreshed (a catalog failure
    /// does not revert readiness). On failure the attempted secret is still
    /// persisted, with the validity flag false, so callers can show what
    /// was tried.
    pub async fn set_credential(&self, secret: &str) -> Result<()> {
        self.keyed.install_credential(ApiCredential::new(secret));

        let validated = self
            .bounded("credential validation", self.keyed.validate())
            .await;

        match validated {
            Ok(true) => {
                self.state
                    .write()
                    .unwrap()
                    .set_ready(ProviderKind::Keyed, true);
                self.persist(
                    ConfigPatch::new()
                        .api_key(Some(secret.to_string()))
                        .api_key_valid(true),
                )
                .await;
                info!("Keyed provider credential validated");

                if let Err(e) = self.refresh_catalog_for(ProviderKind::Keyed).await {
                    // Catalog can be retried later; readiness stands.
                    warn!(error = %e, "Catalog fetch after validation failed");
                }
                Ok(())
            }
            Ok(false) | Err(_) => {
                self.state
                    .write()
                    .unwrap()
                    .set_ready(ProviderKind::Keyed, false);
                self.persist(
                    ConfigPatch::new()
                        .api_key(Some(secret.to_string()))
                        .api_key_valid(false),
                )
                .await;

                let message = match validated {
                    Ok(false) => "provider rejected the supplied credential".to_string(),
                    Err(e) => e.to_string(),
                    Ok(true) => unreachable!(),
                };
                Err(ProviderError::InvalidCredential { message }.into())
            }
        }
    }

    /// Remove the keyed provider's credential and readiness.
    pub async fn clear_credential(&self) {
        self.keyed.clear_credential();
        self.state
            .write()
            .unwrap()
            .set_ready(ProviderKind::Keyed, false);
        self.persist(ConfigPatch::new().api_key(None).api_key_valid(false))
            .await;
        info!("Keyed provider credential cleared");
    }

    /// Run the account provider's connection flow.
    ///
    /// Four stages, each failing with its own error kind so callers can act
    /// on the exact stage that broke: client load → `Unavailable`, health
    /// probe → `Unhealthy`, session/sign-in → `SignInFailed`, connectivity
    /// test → `ConnectionTestFailed` (which also persists not-connected).
    pub async fn connect_interactive(&self) -> Result<()> {
        // (a) client runtime load, bounded
        let timeout = self.config.client_load_timeout;
        let loaded = self.account.wait_for_ready(timeout).await;
        match loaded {
            Ok(true) => {}
            Ok(false) | Err(_) => {
                return Err(ProviderError::Unavailable {
                    timeout_ms: timeout.as_millis() as u64,
                }
                .into());
            }
        }

        // (b) health probe
        let health = match self
            .bounded("health probe", self.account.health_check())
            .await
        {
            Ok(health) => health,
            Err(e @ ProviderError::Timeout { .. }) => return Err(e.into()),
            Err(e) => {
                return Err(ProviderError::Unhealthy {
                    message: e.to_string(),
                }
                .into())
            }
        };
        if !health.healthy {
            return Err(ProviderError::Unhealthy {
                message: health.message,
            }
            .into());
        }

        // (c) session check, then interactive sign-in if absent
        let signed_in = match self
            .bounded("session check", self.account.is_signed_in())
            .await
        {
            Ok(signed_in) => signed_in,
            Err(e) => {
                return Err(ProviderError::SignInFailed {
                    message: format!("session check failed: {e}"),
                }
                .into())
            }
        };
        if !signed_in {
            if let Err(e) = self.account.sign_in().await {
                return Err(ProviderError::SignInFailed {
                    message: e.to_string(),
                }
                .into());
            }
            let verified = self
                .bounded("session verification", self.account.is_signed_in())
                .await
                .unwrap_or(false);
            if !verified {
                return Err(ProviderError::SignInFailed {
                    message: "sign-in did not complete".to_string(),
                }
                .into());
            }
        }

        // (d) connectivity test, distinct from the health probe
        let connected = self
            .bounded("connection test", self.account.test_connection())
            .await
            .unwrap_or(false);
        if !connected {
            self.state
                .write()
                .unwrap()
                .set_ready(ProviderKind::Account, false);
            self.persist(ConfigPatch::new().account_connected(false))
                .await;
            return Err(ProviderError::ConnectionTestFailed.into());
        }

        self.state
            .write()
            .unwrap()
            .set_ready(ProviderKind::Account, true);
        self.persist(ConfigPatch::new().account_connected(true))
            .await;
        info!("Account provider connected");

        if let Err(e) = self.refresh_catalog_for(ProviderKind::Account).await {
            warn!(error = %e, "Catalog fetch after connection failed");
        }
        Ok(())
    }

    /// Sign out of the account provider.
    pub async fn disconnect(&self) {
        if let Err(e) = self.bounded("sign-out", self.account.sign_out()).await {
            // Best effort: local readiness is dropped regardless.
            warn!(error = %e, "Account sign-out reported an error");
        }
        self.state
            .write()
            .unwrap()
            .set_ready(ProviderKind::Account, false);
        self.persist(ConfigPatch::new().account_connected(false))
            .await;
        info!("Account provider disconnected");
    }

    /// Authentication snapshot from the account provider.
    pub async fn auth_status(&self) -> Result<AuthStatus> {
        Ok(self
            .bounded("auth status", self.account.auth_status())
            .await?)
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Make the given provider active, resetting the model to its default.
    ///
    /// Pure state mutation: readiness is not validated here. Provider and
    /// model are persisted together so a reload never sees a mismatched
    /// pair.
    pub async fn switch_provider(&self, kind: ProviderKind) {
        let model = kind.default_model().to_string();
        {
            let mut state = self.state.write().unwrap();
            state.active = kind;
            state.model = model.clone();
        }
        self.persist(
            ConfigPatch::new()
                .active_provider(kind)
                .active_model(model.clone()),
        )
        .await;
        info!(provider = %kind, model = %model, "Switched provider");
    }

    /// Set the active model for the active provider.
    ///
    /// The id is trusted even when the catalog is empty (not yet fetched).
    pub async fn switch_model(&self, model: impl Into<String>) {
        let model = model.into();
        self.state.write().unwrap().model = model.clone();
        self.persist(ConfigPatch::new().active_model(model.clone()))
            .await;
        debug!(model = %model, "Switched model");
    }

    /// Re-fetch the active provider's model catalog.
    ///
    /// A no-op (not an error) when the active provider is not ready.
    pub async fn refresh_catalog(&self) -> Result<()> {
        let kind = self.active_provider();
        if !self.ready(kind) {
            debug!(provider = %kind, "Catalog refresh skipped; provider not ready");
            return Ok(());
        }
        self.refresh_catalog_for(kind)
            .await
            .map_err(|e| match e {
                e @ ProviderError::Timeout { .. } => e,
                e => ProviderError::CatalogFetch {
                    message: e.to_string(),
                },
            })?;
        Ok(())
    }

    async fn refresh_catalog_for(
        &self,
        kind: ProviderKind,
    ) -> std::result::Result<Vec<ModelInfo>, ProviderError> {
        let models = self
            .bounded("catalog fetch", self.provider(kind).list_models())
            .await?;

        {
            let mut state = self.state.write().unwrap();
            state.set_catalog(kind, models.clone());
            if state.active == kind
                && !models.is_empty()
                && !models.iter().any(|m| m.id == state.model)
            {
                warn!(model = %state.model, "Active model is not in the refreshed catalog");
            }
        }
        self.persist(ConfigPatch::new().catalog(kind, models.clone()))
            .await;
        info!(provider = %kind, models = models.len(), "Model catalog refreshed");
        Ok(models)
    }

    // =========================================================================
    // Generation family
    // =========================================================================

    /// Generate text with the active provider and model.
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let (kind, model) = self.active_pair();
        self.generate_as(kind, &model, prompt).await
    }

    /// Generate text with an explicit provider/model pair.
    ///
    /// Exists so a pipeline run can honor its configured pair without
    /// mutating the active selection.
    pub async fn generate_as(
        &self,
        kind: ProviderKind,
        model: &str,
        prompt: &str,
    ) -> Result<String> {
        self.gate(kind)?;
        let text = self
            .bounded("generation", self.provider(kind).generate(prompt, model))
            .await
            .map_err(|e| wrap_call_error(e, |message| ProviderError::Generation { message }))?;
        Ok(text)
    }

    /// Compile files into one document with the active provider.
    pub async fn process_files(
        &self,
        files: &[SourceDoc],
        document_name: &str,
    ) -> Result<String> {
        let (kind, model) = self.active_pair();
        self.gate(kind)?;
        let text = self
            .bounded(
                "file compilation",
                self.provider(kind).process_files(files, document_name, &model),
            )
            .await
            .map_err(|e| wrap_call_error(e, |message| ProviderError::Compilation { message }))?;
        Ok(text)
    }

    /// Condense content with the active provider.
    pub async fn condense(&self, content: &str) -> Result<String> {
        let (kind, model) = self.active_pair();
        self.gate(kind)?;
        let text = self
            .bounded("condensation", self.provider(kind).condense(content, &model))
            .await
            .map_err(|e| wrap_call_error(e, |message| ProviderError::Condensation { message }))?;
        Ok(text)
    }

    /// Route a chat message with file context through the active provider.
    ///
    /// The keyed provider gets context and message concatenated into its
    /// plain generation path; the account provider applies its own
    /// provider-side context assembly. The asymmetry is intentional: the
    /// two providers share the external contract, not an internal
    /// prompt-assembly strategy.
    pub async fn handle_user_message(&self, message: &str, context: &str) -> Result<String> {
        let (kind, model) = self.active_pair();
        match kind {
            ProviderKind::Keyed => {
                let prompt = if context.is_empty() {
                    message.to_string()
                } else {
                    format!("{context}\n\n{message}")
                };
                self.generate_as(kind, &model, &prompt).await
            }
            ProviderKind::Account => {
                self.gate(kind)?;
                let text = self
                    .bounded(
                        "message handling",
                        self.account.respond(message, context, &model),
                    )
                    .await
                    .map_err(|e| {
                        wrap_call_error(e, |message| ProviderError::Generation { message })
                    })?;
                Ok(text)
            }
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn active_pair(&self) -> (ProviderKind, String) {
        let state = self.state.read().unwrap();
        (state.active, state.model.clone())
    }

    /// The readiness gate: fails fast, before any network attempt.
    fn gate(&self, kind: ProviderKind) -> std::result::Result<(), ProviderError> {
        if self.ready(kind) {
            Ok(())
        } else {
            Err(ProviderError::NotReady { provider: kind })
        }
    }

    fn provider(&self, kind: ProviderKind) -> &dyn AiProvider {
        match kind {
            ProviderKind::Keyed => &self.keyed,
            ProviderKind::Account => &self.account,
        }
    }

    async fn bounded<T>(
        &self,
        operation: &str,
        fut: impl std::future::Future<Output = std::result::Result<T, ProviderError>>,
    ) -> std::result::Result<T, ProviderError> {
        match tokio::time::timeout(self.config.call_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout {
                operation: operation.to_string(),
            }),
        }
    }

    /// Write-through persistence; failures are logged, never propagated.
    async fn persist(&self, patch: ConfigPatch) {
        if let Err(e) = self.settings.merge(patch).await {
            warn!(error = %e, "Failed to persist settings");
        }
    }
}

/// Preserve timeouts; wrap everything else with the caller-facing kind.
fn wrap_call_error(
    error: ProviderError,
    wrap: impl FnOnce(String) -> ProviderError,
) -> ProviderError {
    match error {
        e @ ProviderError::Timeout { .. } => e,
        e => wrap(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DocforgeError;
    use crate::stores::MemorySettings;
    use crate::testing::{KeyedCall, MockKeyedProvider, MockSessionProvider, SessionCall};

    async fn orchestrator(
        keyed: MockKeyedProvider,
        account: MockSessionProvider,
    ) -> ProviderOrchestrator<MockKeyedProvider, MockSessionProvider, MemorySettings> {
        ProviderOrchestrator::new(keyed, account, MemorySettings::new()).await
    }

    #[tokio::test]
    async fn test_generate_while_not_ready_fails_without_network_call() {
        let orch = orchestrator(MockKeyedProvider::new(), MockSessionProvider::new()).await;

        let err = orch.generate("hello").await.unwrap_err();
        assert!(matches!(
            err,
            DocforgeError::Provider(ProviderError::NotReady {
                provider: ProviderKind::Keyed
            })
        ));
        // The gate fired before any provider call.
        assert!(orch.keyed.calls().is_empty());
    }

    #[tokio::test]
    async fn test_set_credential_success_marks_ready_and_fetches_catalog() {
        let keyed = MockKeyedProvider::new()
            .accept_key("sk-good")
            .with_model(ModelInfo::new("m-1"));
        let orch = orchestrator(keyed, MockSessionProvider::new()).await;

        orch.set_credential("sk-good").await.unwrap();

        assert!(orch.ready(ProviderKind::Keyed));
        let record = orch.settings.record();
        assert_eq!(record.api_key.as_deref(), Some("sk-good"));
        assert!(record.api_key_valid);
        assert_eq!(record.keyed_catalog.len(), 1);
        assert!(orch.keyed.calls().contains(&KeyedCall::ListModels));
    }

    #[tokio::test]
    async fn test_set_credential_rejection_persists_attempt() {
        let keyed = MockKeyedProvider::new().accept_key("sk-good");
        let orch = orchestrator(keyed, MockSessionProvider::new()).await;

        let err = orch.set_credential("sk-bad").await.unwrap_err();
        assert!(matches!(
            err,
            DocforgeError::Provider(ProviderError::InvalidCredential { .. })
        ));
        assert!(!orch.ready(ProviderKind::Keyed));

        let record = orch.settings.record();
        assert_eq!(record.api_key.as_deref(), Some("sk-bad"));
        assert!(!record.api_key_valid);
    }

    #[tokio::test]
    async fn test_catalog_failure_does_not_revert_readiness() {
        let keyed = MockKeyedProvider::new().fail_catalog("listing down");
        let orch = orchestrator(keyed, MockSessionProvider::new()).await;

        orch.set_credential("sk-anything").await.unwrap();

        assert!(orch.ready(ProviderKind::Keyed));
        assert!(orch.selection().keyed_catalog.is_empty());
    }

    #[tokio::test]
    async fn test_clear_credential_returns_to_uninitialized() {
        let orch = orchestrator(MockKeyedProvider::new(), MockSessionProvider::new()).await;
        orch.set_credential("sk-x").await.unwrap();
        assert!(orch.ready(ProviderKind::Keyed));

        orch.clear_credential().await;

        assert!(!orch.ready(ProviderKind::Keyed));
        let record = orch.settings.record();
        assert!(record.api_key.is_none());
        assert!(!record.api_key_valid);
    }

    #[tokio::test]
    async fn test_switch_provider_resets_model_and_persists_pair() {
        let orch = orchestrator(MockKeyedProvider::new(), MockSessionProvider::new()).await;
        orch.switch_model("custom-model").await;

        orch.switch_provider(ProviderKind::Account).await;

        let selection = orch.selection();
        assert_eq!(selection.active, ProviderKind::Account);
        assert_eq!(selection.model, ProviderKind::Account.default_model());

        // A reload immediately after the switch sees the matching pair.
        let record = orch.settings.record();
        assert_eq!(record.active_provider, ProviderKind::Account);
        assert_eq!(record.active_model, ProviderKind::Account.default_model());
    }

    #[tokio::test]
    async fn test_connect_interactive_happy_path() {
        let account = MockSessionProvider::new().with_model(ModelInfo::new("a-1"));
        let orch = orchestrator(MockKeyedProvider::new(), account).await;

        orch.connect_interactive().await.unwrap();

        assert!(orch.ready(ProviderKind::Account));
        assert!(orch.settings.record().account_connected);
        let calls = orch.account.calls();
        assert!(calls.contains(&SessionCall::HealthCheck));
        assert!(calls.contains(&SessionCall::SignIn));
        assert!(calls.contains(&SessionCall::TestConnection));
    }

    #[tokio::test]
    async fn test_connect_interactive_unavailable_client() {
        let account = MockSessionProvider::new().unavailable();
        let orch = orchestrator(MockKeyedProvider::new(), account).await;

        let err = orch.connect_interactive().await.unwrap_err();
        assert!(matches!(
            err,
            DocforgeError::Provider(ProviderError::Unavailable { .. })
        ));
        assert!(!orch.ready(ProviderKind::Account));
    }

    #[tokio::test]
    async fn test_connect_interactive_unhealthy_carries_probe_message() {
        let account = MockSessionProvider::new().unhealthy("maintenance window");
        let orch = orchestrator(MockKeyedProvider::new(), account).await;

        let err = orch.connect_interactive().await.unwrap_err();
        match err {
            DocforgeError::Provider(ProviderError::Unhealthy { message }) => {
                assert_eq!(message, "maintenance window");
            }
            other => panic!("expected Unhealthy, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_connect_interactive_sign_in_failure() {
        let account = MockSessionProvider::new().fail_sign_in("user closed prompt");
        let orch = orchestrator(MockKeyedProvider::new(), account).await;

        let err = orch.connect_interactive().await.unwrap_err();
        assert!(matches!(
            err,
            DocforgeError::Provider(ProviderError::SignInFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_connect_interactive_connection_test_failure_persists_false() {
        let account = MockSessionProvider::new().fail_connection_test();
        let orch = orchestrator(MockKeyedProvider::new(), account).await;

        let err = orch.connect_interactive().await.unwrap_err();
        assert!(matches!(
            err,
            DocforgeError::Provider(ProviderError::ConnectionTestFailed)
        ));
        assert!(!orch.ready(ProviderKind::Account));
        assert!(!orch.settings.record().account_connected);
    }

    #[tokio::test]
    async fn test_generation_failure_is_wrapped_with_original_message() {
        let keyed = MockKeyedProvider::new().fail_generation("model overloaded");
        let orch = orchestrator(keyed, MockSessionProvider::new()).await;
        orch.set_credential("sk-x").await.unwrap();

        let err = orch.generate("hello").await.unwrap_err();
        match err {
            DocforgeError::Provider(ProviderError::Generation { message }) => {
                assert!(message.contains("model overloaded"));
            }
            other => panic!("expected Generation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_call_timeout_yields_timeout_kind() {
        let keyed = MockKeyedProvider::new().with_call_delay(Duration::from_millis(200));
        let orch = ProviderOrchestrator::with_config(
            keyed,
            MockSessionProvider::new(),
            MemorySettings::new(),
            OrchestratorConfig::new().with_call_timeout(Duration::from_millis(20)),
        )
        .await;
        orch.state
            .write()
            .unwrap()
            .set_ready(ProviderKind::Keyed, true);

        let err = orch.generate("slow").await.unwrap_err();
        assert!(matches!(
            err,
            DocforgeError::Provider(ProviderError::Timeout { .. })
        ));
    }

    #[tokio::test]
    async fn test_handle_user_message_concatenates_for_keyed() {
        let orch = orchestrator(MockKeyedProvider::new(), MockSessionProvider::new()).await;
        orch.set_credential("sk-x").await.unwrap();

        orch.handle_user_message("what changed?", "File: a.md\ncontents")
            .await
            .unwrap();

        let prompts: Vec<String> = orch
            .keyed
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                KeyedCall::Generate { prompt, .. } => Some(prompt),
                _ => None,
            })
            .collect();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].starts_with("File: a.md"));
        assert!(prompts[0].ends_with("what changed?"));
    }

    #[tokio::test]
    async fn test_handle_user_message_delegates_for_account() {
        let account = MockSessionProvider::new();
        let orch = orchestrator(MockKeyedProvider::new(), account).await;
        orch.connect_interactive().await.unwrap();
        orch.switch_provider(ProviderKind::Account).await;

        orch.handle_user_message("hello", "ctx").await.unwrap();

        assert!(orch
            .account
            .calls()
            .iter()
            .any(|c| matches!(c, SessionCall::Respond { .. })));
        // The keyed path was never touched.
        assert!(orch.keyed.calls().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_catalog_noop_when_not_ready() {
        let orch = orchestrator(MockKeyedProvider::new(), MockSessionProvider::new()).await;

        orch.refresh_catalog().await.unwrap();
        assert!(orch.keyed.calls().is_empty());
    }

    #[tokio::test]
    async fn test_startup_restores_persisted_selection() {
        let settings = MemorySettings::new();
        settings
            .merge(
                ConfigPatch::new()
                    .api_key(Some("sk-saved".to_string()))
                    .api_key_valid(true)
                    .active_provider(ProviderKind::Account)
                    .active_model("a-9")
                    .account_connected(true),
            )
            .await
            .unwrap();

        let orch = ProviderOrchestrator::new(
            MockKeyedProvider::new(),
            MockSessionProvider::new(),
            settings,
        )
        .await;

        let selection = orch.selection();
        assert_eq!(selection.active, ProviderKind::Account);
        assert_eq!(selection.model, "a-9");
        assert!(selection.keyed_ready);
        assert!(selection.account_ready);
    }
}
