//! Testing utilities including mock implementations.
//!
//! These are useful for testing applications that use docforge without
//! making real AI or network calls. Mocks return deterministic,
//! configurable responses and record every call for assertions.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use crate::error::{ExtractError, ExtractResult, ProviderError, ProviderResult};
use crate::security::ApiCredential;
use crate::traits::extractor::TextExtractor;
use crate::traits::provider::{
    AiProvider, AuthStatus, ConnectionQuality, HealthReport, KeyedProvider, ModelInfo,
    SessionProvider,
};
use crate::types::file::{FileStructure, SourceDoc, StagedFile};

/// Record of a call made to [`MockKeyedProvider`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyedCall {
    Validate,
    ListModels,
    Generate { model: String, prompt: String },
    ProcessFiles { files: usize, model: String },
    Condense { model: String },
}

/// A mock keyed provider.
#[derive(Default)]
pub struct MockKeyedProvider {
    credential: RwLock<Option<ApiCredential>>,

    /// Keys considered valid; empty means any non-empty key is accepted
    accepted_keys: RwLock<Vec<String>>,

    models: RwLock<Vec<ModelInfo>>,
    responses: RwLock<HashMap<String, String>>,
    fail_generation: RwLock<Option<String>>,
    fail_catalog: RwLock<Option<String>>,
    fail_validation: RwLock<Option<String>>,
    call_delay: RwLock<Option<Duration>>,
    calls: RwLock<Vec<KeyedCall>>,
}

impl MockKeyedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict validation to this key (repeatable).
    pub fn accept_key(self, key: impl Into<String>) -> Self {
        self.accepted_keys.write().unwrap().push(key.into());
        self
    }

    /// Add a catalog entry.
    pub fn with_model(self, model: ModelInfo) -> Self {
        self.models.write().unwrap().push(model);
        self
    }

    /// Predefine the response for an exact prompt.
    pub fn with_response(self, prompt: impl Into<String>, response: impl Into<String>) -> Self {
        self.responses
            .write()
            .unwrap()
            .insert(prompt.into(), response.into());
        self
    }

    /// Make every generation-family call fail with this message.
    pub fn fail_generation(self, message: impl Into<String>) -> Self {
        *self.fail_generation.write().unwrap() = Some(message.into());
        self
    }

    /// Make catalog fetches fail with this message.
    pub fn fail_catalog(self, message: impl Into<String>) -> Self {
        *self.fail_catalog.write().unwrap() = Some(message.into());
        self
    }

    /// Make validation calls fail (transport error, not rejection).
    pub fn fail_validation(self, message: impl Into<String>) -> Self {
        *self.fail_validation.write().unwrap() = Some(message.into());
        self
    }

    /// Delay every call, for timeout tests.
    pub fn with_call_delay(self, delay: Duration) -> Self {
        *self.call_delay.write().unwrap() = Some(delay);
        self
    }

    /// All calls made to this mock.
    pub fn calls(&self) -> Vec<KeyedCall> {
        self.calls.read().unwrap().clone()
    }

    /// Whether a credential is currently installed.
    pub fn has_credential(&self) -> bool {
        self.credential.read().unwrap().is_some()
    }

    fn record(&self, call: KeyedCall) {
        self.calls.write().unwrap().push(call);
    }

    async fn delay(&self) {
        let delay = *self.call_delay.read().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn generation_failure(&self) -> Option<ProviderError> {
        self.fail_generation
            .read()
            .unwrap()
            .clone()
            .map(|message| ProviderError::Transport(message.into()))
    }
}

#[async_trait]
impl AiProvider for MockKeyedProvider {
    async fn list_models(&self) -> ProviderResult<Vec<ModelInfo>> {
        self.record(KeyedCall::ListModels);
        self.delay().await;
        if let Some(message) = self.fail_catalog.read().unwrap().clone() {
            return Err(ProviderError::Transport(message.into()));
        }
        Ok(self.models.read().unwrap().clone())
    }

    async fn generate(&self, prompt: &str, model: &str) -> ProviderResult<String> {
        self.record(KeyedCall::Generate {
            model: model.to_string(),
            prompt: prompt.to_string(),
        });
        self.delay().await;
        if let Some(e) = self.generation_failure() {
            return Err(e);
        }
        Ok(self
            .responses
            .read()
            .unwrap()
            .get(prompt)
            .cloned()
            .unwrap_or_else(|| format!("generated[{model}]")))
    }

    async fn process_files(
        &self,
        files: &[SourceDoc],
        document_name: &str,
        model: &str,
    ) -> ProviderResult<String> {
        self.record(KeyedCall::ProcessFiles {
            files: files.len(),
            model: model.to_string(),
        });
        self.delay().await;
        if let Some(e) = self.generation_failure() {
            return Err(e);
        }
        let body = files
            .iter()
            .map(|f| format!("## {}\n\n{}", f.name, f.content))
            .collect::<Vec<_>>()
            .join("\n\n");
        Ok(format!("# {document_name}\n\n{body}"))
    }

    async fn condense(&self, content: &str, model: &str) -> ProviderResult<String> {
        self.record(KeyedCall::Condense {
            model: model.to_string(),
        });
        self.delay().await;
        if let Some(e) = self.generation_failure() {
            return Err(e);
        }
        let prefix: String = content.chars().take(80).collect();
        Ok(format!("condensed: {prefix}"))
    }
}

#[async_trait]
impl KeyedProvider for MockKeyedProvider {
    fn install_credential(&self, credential: ApiCredential) {
        *self.credential.write().unwrap() = Some(credential);
    }

    fn clear_credential(&self) {
        *self.credential.write().unwrap() = None;
    }

    async fn validate(&self) -> ProviderResult<bool> {
        self.record(KeyedCall::Validate);
        self.delay().await;
        if let Some(message) = self.fail_validation.read().unwrap().clone() {
            return Err(ProviderError::Transport(message.into()));
        }

        let credential = self.credential.read().unwrap();
        let Some(credential) = credential.as_ref() else {
            return Ok(false);
        };
        if credential.is_empty() {
            return Ok(false);
        }

        let accepted = self.accepted_keys.read().unwrap();
        Ok(accepted.is_empty() || accepted.iter().any(|k| k == credential.expose()))
    }
}

/// Record of a call made to [`MockSessionProvider`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCall {
    WaitForReady,
    HealthCheck,
    IsSignedIn,
    SignIn,
    SignOut,
    TestConnection,
    AuthStatus,
    ListModels,
    Generate { model: String, prompt: String },
    Respond { model: String, message: String },
    ProcessFiles { files: usize, model: String },
    Condense { model: String },
}

/// A mock session (account) provider.
pub struct MockSessionProvider {
    available: bool,
    unhealthy: Option<String>,
    sign_in_failure: Option<String>,
    connection_ok: bool,
    username: Option<String>,

    signed_in: RwLock<bool>,
    models: RwLock<Vec<ModelInfo>>,
    responses: RwLock<HashMap<String, String>>,
    fail_generation: RwLock<Option<String>>,
    calls: RwLock<Vec<SessionCall>>,
}

impl Default for MockSessionProvider {
    fn default() -> Self {
        Self {
            available: true,
            unhealthy: None,
            sign_in_failure: None,
            connection_ok: true,
            username: None,
            signed_in: RwLock::new(false),
            models: RwLock::new(Vec::new()),
            responses: RwLock::new(HashMap::new()),
            fail_generation: RwLock::new(None),
            calls: RwLock::new(Vec::new()),
        }
    }
}

impl MockSessionProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a client runtime that never finishes loading.
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// Make the health probe report not-healthy with this message.
    pub fn unhealthy(mut self, message: impl Into<String>) -> Self {
        self.unhealthy = Some(message.into());
        self
    }

    /// Make interactive sign-in fail with this message.
    pub fn fail_sign_in(mut self, message: impl Into<String>) -> Self {
        self.sign_in_failure = Some(message.into());
        self
    }

    /// Make the connectivity test fail.
    pub fn fail_connection_test(mut self) -> Self {
        self.connection_ok = false;
        self
    }

    /// Report this username from the auth status.
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Start with an existing session.
    pub fn already_signed_in(self) -> Self {
        *self.signed_in.write().unwrap() = true;
        self
    }

    /// Add a catalog entry.
    pub fn with_model(self, model: ModelInfo) -> Self {
        self.models.write().unwrap().push(model);
        self
    }

    /// Predefine the response for an exact prompt or message.
    pub fn with_response(self, input: impl Into<String>, response: impl Into<String>) -> Self {
        self.responses
            .write()
            .unwrap()
            .insert(input.into(), response.into());
        self
    }

    /// Make every generation-family call fail with this message.
    pub fn fail_generation(self, message: impl Into<String>) -> Self {
        *self.fail_generation.write().unwrap() = Some(message.into());
        self
    }

    /// All calls made to this mock.
    pub fn calls(&self) -> Vec<SessionCall> {
        self.calls.read().unwrap().clone()
    }

    fn record(&self, call: SessionCall) {
        self.calls.write().unwrap().push(call);
    }

    fn generation_failure(&self) -> Option<ProviderError> {
        self.fail_generation
            .read()
            .unwrap()
            .clone()
            .map(|message| ProviderError::Transport(message.into()))
    }
}

#[async_trait]
impl AiProvider for MockSessionProvider {
    async fn list_models(&self) -> ProviderResult<Vec<ModelInfo>> {
        self.record(SessionCall::ListModels);
        Ok(self.models.read().unwrap().clone())
    }

    async fn generate(&self, prompt: &str, model: &str) -> ProviderResult<String> {
        self.record(SessionCall::Generate {
            model: model.to_string(),
            prompt: prompt.to_string(),
        });
        if let Some(e) = self.generation_failure() {
            return Err(e);
        }
        Ok(self
            .responses
            .read()
            .unwrap()
            .get(prompt)
            .cloned()
            .unwrap_or_else(|| format!("generated[{model}]")))
    }

    async fn process_files(
        &self,
        files: &[SourceDoc],
        document_name: &str,
        model: &str,
    ) -> ProviderResult<String> {
        self.record(SessionCall::ProcessFiles {
            files: files.len(),
            model: model.to_string(),
        });
        if let Some(e) = self.generation_failure() {
            return Err(e);
        }
        Ok(format!("# {document_name}\n\n({} files)", files.len()))
    }

    async fn condense(&self, content: &str, model: &str) -> ProviderResult<String> {
        self.record(SessionCall::Condense {
            model: model.to_string(),
        });
        if let Some(e) = self.generation_failure() {
            return Err(e);
        }
        let prefix: String = content.chars().take(80).collect();
        Ok(format!("condensed: {prefix}"))
    }
}

#[async_trait]
impl SessionProvider for MockSessionProvider {
    fn is_available(&self) -> bool {
        self.available
    }

    async fn wait_for_ready(&self, _timeout: Duration) -> ProviderResult<bool> {
        self.record(SessionCall::WaitForReady);
        Ok(self.available)
    }

    async fn health_check(&self) -> ProviderResult<HealthReport> {
        self.record(SessionCall::HealthCheck);
        Ok(match &self.unhealthy {
            Some(message) => HealthReport::unhealthy(message.clone()),
            None => HealthReport::healthy(),
        })
    }

    async fn is_signed_in(&self) -> ProviderResult<bool> {
        self.record(SessionCall::IsSignedIn);
        Ok(*self.signed_in.read().unwrap())
    }

    async fn sign_in(&self) -> ProviderResult<()> {
        self.record(SessionCall::SignIn);
        if let Some(message) = &self.sign_in_failure {
            return Err(ProviderError::Transport(message.clone().into()));
        }
        *self.signed_in.write().unwrap() = true;
        Ok(())
    }

    async fn sign_out(&self) -> ProviderResult<()> {
        self.record(SessionCall::SignOut);
        *self.signed_in.write().unwrap() = false;
        Ok(())
    }

    async fn test_connection(&self) -> ProviderResult<bool> {
        self.record(SessionCall::TestConnection);
        Ok(self.connection_ok)
    }

    async fn auth_status(&self) -> ProviderResult<AuthStatus> {
        self.record(SessionCall::AuthStatus);
        let signed_in = *self.signed_in.read().unwrap();
        Ok(AuthStatus {
            signed_in,
            username: self.username.clone(),
            connection_quality: if self.connection_ok {
                ConnectionQuality::Good
            } else {
                ConnectionQuality::Offline
            },
            last_connected: signed_in.then(Utc::now),
        })
    }

    async fn respond(&self, message: &str, _context: &str, model: &str) -> ProviderResult<String> {
        self.record(SessionCall::Respond {
            model: model.to_string(),
            message: message.to_string(),
        });
        if let Some(e) = self.generation_failure() {
            return Err(e);
        }
        Ok(self
            .responses
            .read()
            .unwrap()
            .get(message)
            .cloned()
            .unwrap_or_else(|| format!("reply[{model}]")))
    }
}

/// A mock text extractor.
#[derive(Default)]
pub struct MockExtractor {
    /// File names whose extraction fails
    fail_names: RwLock<Vec<String>>,

    /// Extracted-text overrides by file name
    texts: RwLock<HashMap<String, String>>,
}

impl MockExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make extraction fail for this file name.
    pub fn fail_for(self, name: impl Into<String>) -> Self {
        self.fail_names.write().unwrap().push(name.into());
        self
    }

    /// Predefine extracted text for a file name.
    pub fn with_text(self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.texts.write().unwrap().insert(name.into(), text.into());
        self
    }
}

#[async_trait]
impl TextExtractor for MockExtractor {
    async fn extract_text(&self, file: &StagedFile) -> ExtractResult<String> {
        if self.fail_names.read().unwrap().contains(&file.name) {
            return Err(ExtractError::Decode {
                message: format!("mock failure for {}", file.name),
            });
        }
        Ok(self
            .texts
            .read()
            .unwrap()
            .get(&file.name)
            .cloned()
            .unwrap_or_else(|| file.content.clone()))
    }

    async fn extract_metadata(&self, file: &StagedFile) -> ExtractResult<FileStructure> {
        Ok(FileStructure {
            word_count: file.content.split_whitespace().count(),
            ..Default::default()
        })
    }
}
