//! AI-driven file relationship analysis.
//!
//! A derived, recomputable artifact: the provider names related file pairs,
//! and the response is validated against the actual file set before it is
//! surfaced.

use serde::Deserialize;
use std::collections::HashMap;
use tracing::warn;
use uuid::Uuid;

use crate::error::Result;
use crate::pipeline::prompts::format_relationships_prompt;
use crate::traits::provider::{KeyedProvider, SessionProvider};
use crate::traits::settings::SettingsStore;
use crate::types::combination::{FileRelationship, RelationKind};
use crate::types::file::StagedFile;
use crate::ProviderOrchestrator;

/// Characters of each file fed into the relationship prompt.
const EXCERPT_CHARS: usize = 1500;

#[derive(Debug, Deserialize)]
struct RawRelationship {
    source: String,
    target: String,
    kind: RelationKind,
    strength: f32,
    #[serde(default)]
    description: String,
}

/// Ask the active provider how the given files relate to each other.
///
/// Pairs naming unknown files are dropped; strengths are clamped into
/// [0, 1]. Fewer than two files yields an empty result without a provider
/// call.
pub async fn analyze_relationships<K, A, S>(
    orchestrator: &ProviderOrchestrator<K, A, S>,
    files: &[StagedFile],
) -> Result<Vec<FileRelationship>>
where
    K: KeyedProvider,
    A: SessionProvider,
    S: SettingsStore,
{
    if files.len() < 2 {
        return Ok(Vec::new());
    }

    let entries: Vec<(String, String)> = files
        .iter()
        .map(|f| (f.name.clone(), excerpt(f.effective_text())))
        .collect();
    let prompt = format_relationships_prompt(&entries);

    let response = orchestrator.generate(&prompt).await?;

    let ids_by_name: HashMap<&str, Uuid> =
        files.iter().map(|f| (f.name.as_str(), f.id)).collect();
    parse_relationships_response(&response, &ids_by_name)
}

/// Parse the provider's JSON response into validated relationships.
pub fn parse_relationships_response(
    response: &str,
    ids_by_name: &HashMap<&str, Uuid>,
) -> Result<Vec<FileRelationship>> {
    let raw: Vec<RawRelationship> = serde_json::from_str(strip_code_fences(response))?;

    let mut relationships = Vec::with_capacity(raw.len());
    for entry in raw {
        let (Some(&source_id), Some(&target_id)) = (
            ids_by_name.get(entry.source.as_str()),
            ids_by_name.get(entry.target.as_str()),
        ) else {
            warn!(
                source = %entry.source,
                target = %entry.target,
                "Dropping relationship naming unknown file"
            );
            continue;
        };
        if source_id == target_id {
            continue;
        }

        relationships.push(
            FileRelationship::new(source_id, target_id, entry.kind, entry.strength)
                .with_description(entry.description),
        );
    }
    Ok(relationships)
}

/// Strip a leading/trailing markdown code fence, if present.
fn strip_code_fences(response: &str) -> &str {
    let trimmed = response.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}

fn excerpt(text: &str) -> String {
    if text.chars().count() <= EXCERPT_CHARS {
        text.to_string()
    } else {
        text.chars().take(EXCERPT_CHARS).collect()
    }
}
