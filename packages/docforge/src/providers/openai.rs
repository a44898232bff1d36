//! OpenAI-compatible keyed provider.
//!
//! A reference implementation of [`KeyedProvider`] against any
//! OpenAI-compatible chat-completions API.
//!
//! # Example
//!
//! ```rust,ignore
//! use docforge::providers::OpenAiProvider;
//!
//! let provider = OpenAiProvider::new().with_base_url("https://api.openai.com/v1");
//! ```

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

use crate::error::{ProviderError, ProviderResult};
use crate::security::ApiCredential;
use crate::traits::provider::{AiProvider, KeyedProvider, ModelInfo};
use crate::types::file::SourceDoc;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Keyed provider over an OpenAI-compatible API.
pub struct OpenAiProvider {
    client: Client,
    credential: RwLock<Option<ApiCredential>>,
    base_url: String,
}

impl Default for OpenAiProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenAiProvider {
    /// Create a provider against the default endpoint, with no credential
    /// installed yet.
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            credential: RwLock::new(None),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Set a custom base URL (Azure, proxies, local gateways).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Use a pre-configured HTTP client.
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    fn bearer(&self) -> ProviderResult<String> {
        let credential = self.credential.read().unwrap();
        match credential.as_ref() {
            Some(c) if !c.is_empty() => Ok(format!("Bearer {}", c.expose())),
            _ => Err(ProviderError::InvalidCredential {
                message: "no credential installed".to_string(),
            }),
        }
    }

    async fn chat(&self, prompt: &str, model: &str) -> ProviderResult<String> {
        let request = ChatRequest {
            model: model.to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: 0.7,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", self.bearer()?)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(Box::new(e)))?
            .error_for_status()
            .map_err(|e| ProviderError::Transport(Box::new(e)))?;

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Transport(Box::new(e)))?;

        body.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ProviderError::Generation {
                message: "response contained no choices".to_string(),
            })
    }
}

#[async_trait]
impl AiProvider for OpenAiProvider {
    async fn list_models(&self) -> ProviderResult<Vec<ModelInfo>> {
        let response = self
            .client
            .get(format!("{}/models", self.base_url))
            .header("Authorization", self.bearer()?)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(Box::new(e)))?
            .error_for_status()
            .map_err(|e| ProviderError::Transport(Box::new(e)))?;

        let body: ModelsResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Transport(Box::new(e)))?;

        Ok(body
            .data
            .into_iter()
            .map(|m| ModelInfo::new(m.id))
            .collect())
    }

    async fn generate(&self, prompt: &str, model: &str) -> ProviderResult<String> {
        self.chat(prompt, model).await
    }

    async fn process_files(
        &self,
        files: &[SourceDoc],
        document_name: &str,
        model: &str,
    ) -> ProviderResult<String> {
        let listing = files
            .iter()
            .map(|f| format!("--- {} ---\n{}", f.name, f.content))
            .collect::<Vec<_>>()
            .join("\n\n");
        let prompt = format!(
            "Compile these files into a single coherent markdown document \
             titled \"{document_name}\". Merge overlapping material, keep a \
             logical section order, and preserve code blocks verbatim.\n\n{listing}"
        );
        self.chat(&prompt, model).await
    }
}

#[async_trait]
impl KeyedProvider for OpenAiProvider {
    fn install_credential(&self, credential: ApiCredential) {
        *self.credential.write().unwrap() = Some(credential);
    }

    fn clear_credential(&self) {
        *self.credential.write().unwrap() = None;
    }

    async fn validate(&self) -> ProviderResult<bool> {
        let bearer = match self.bearer() {
            Ok(bearer) => bearer,
            Err(_) => return Ok(false),
        };

        // A models listing is the cheapest authenticated call.
        let response = self
            .client
            .get(format!("{}/models", self.base_url))
            .header("Authorization", bearer)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(Box::new(e)))?;

        let status = response.status();
        if status.is_success() {
            Ok(true)
        } else if status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
        {
            Ok(false)
        } else {
            Err(ProviderError::Transport(
                format!("validation call returned {status}").into(),
            ))
        }
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

#[derive(Deserialize)]
struct ModelsResponse {
    data: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    id: String,
}
