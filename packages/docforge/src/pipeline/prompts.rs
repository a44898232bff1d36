//! LLM prompts for file analysis and relationship detection.

/// Prompt for analyzing a single file.
pub const ANALYZE_PROMPT: &str = r#"Analyze this file for a document compilation tool.

Output JSON:
{
    "summary": "2-3 sentence overview of what the file contains",
    "topics": ["main topics covered, 3-6 short phrases"]
}

File name: {name}
File content:
{content}"#;

/// Prompt for detecting relationships between files.
pub const RELATIONSHIPS_PROMPT: &str = r#"Given these files, identify relationships between pairs of them.

Relationship kinds:
- similar: the files cover overlapping material
- complementary: the files cover adjacent material that reads well together
- duplicate: the files are substantially the same
- reference: one file cites or depends on the other

Output JSON array (omit unrelated pairs):
[
    {
        "source": "file name",
        "target": "file name",
        "kind": "similar" | "complementary" | "duplicate" | "reference",
        "strength": 0.0 to 1.0,
        "description": "one sentence explaining the relationship"
    }
]

Files:
{files}"#;

/// Fill the analysis prompt for one file.
pub fn format_analyze_prompt(name: &str, content: &str) -> String {
    ANALYZE_PROMPT
        .replace("{name}", name)
        .replace("{content}", content)
}

/// Fill the relationships prompt for a set of files.
///
/// Each entry is rendered as a name plus a content excerpt; full contents
/// would blow the context window for large sets.
pub fn format_relationships_prompt(files: &[(String, String)]) -> String {
    let listing = files
        .iter()
        .map(|(name, excerpt)| format!("--- {name} ---\n{excerpt}"))
        .collect::<Vec<_>>()
        .join("\n\n");
    RELATIONSHIPS_PROMPT.replace("{files}", &listing)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_prompt_substitution() {
        let prompt = format_analyze_prompt("notes.md", "# Notes");
        assert!(prompt.contains("File name: notes.md"));
        assert!(prompt.contains("# Notes"));
        assert!(!prompt.contains("{name}"));
        assert!(!prompt.contains("{content}"));
    }

    #[test]
    fn test_relationships_prompt_lists_all_files() {
        let files = vec![
            ("a.md".to_string(), "alpha".to_string()),
            ("b.md".to_string(), "beta".to_string()),
        ];
        let prompt = format_relationships_prompt(&files);
        assert!(prompt.contains("--- a.md ---"));
        assert!(prompt.contains("--- b.md ---"));
        assert!(!prompt.contains("{files}"));
    }
}
