//! Thin chat controller.
//!
//! Turns user text plus file context into calls against the orchestrator's
//! message handling; keeps a session-scoped transcript. All intelligence
//! lives behind the orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::orchestrator::ProviderOrchestrator;
use crate::traits::provider::{KeyedProvider, SessionProvider};
use crate::traits::settings::SettingsStore;
use crate::types::file::SourceDoc;

/// Default character budget for assembled file context.
const DEFAULT_CONTEXT_CHARS: usize = 8000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One side of an exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
    pub at: DateTime<Utc>,
}

/// A session-scoped chat over the ingested files.
pub struct ChatSession {
    history: Vec<ChatTurn>,
    context_chars: usize,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            history: Vec::new(),
            context_chars: DEFAULT_CONTEXT_CHARS,
        }
    }

    /// Set the character budget for file context.
    pub fn with_context_budget(mut self, chars: usize) -> Self {
        self.context_chars = chars;
        self
    }

    /// The transcript so far.
    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }

    /// Drop the transcript.
    pub fn clear(&mut self) {
        self.history.clear();
    }

    /// Send a message with the given files as context.
    ///
    /// The user turn is recorded even when the provider call fails, so a
    /// retry shows what was asked.
    pub async fn send<K, A, S>(
        &mut self,
        orchestrator: &ProviderOrchestrator<K, A, S>,
        sources: &[SourceDoc],
        message: &str,
    ) -> Result<String>
    where
        K: KeyedProvider,
        A: SessionProvider,
        S: SettingsStore,
    {
        let context = build_context(sources, self.context_chars);
        self.history.push(ChatTurn {
            role: ChatRole::User,
            content: message.to_string(),
            at: Utc::now(),
        });

        let reply = orchestrator.handle_user_message(message, &context).await?;

        self.history.push(ChatTurn {
            role: ChatRole::Assistant,
            content: reply.clone(),
            at: Utc::now(),
        });
        Ok(reply)
    }
}

/// Assemble a file-context block within a character budget, splitting the
/// budget evenly across files.
fn build_context(sources: &[SourceDoc], budget: usize) -> String {
    if sources.is_empty() {
        return String::new();
    }
    let per_file = (budget / sources.len()).max(200);

    sources
        .iter()
        .map(|s| {
            let content: String = s.content.chars().take(per_file).collect();
            format!("File: {}\n{}", s.name, content)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
