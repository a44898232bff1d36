//! Local document combination.
//!
//! Pure assembly of the final document from file contents, used by the
//! combine step for the non-AI strategies and to post-process/measure the
//! AI-compiled output.

use regex::Regex;
use sha2::{Digest, Sha256};
use std::time::Instant;

use crate::types::combination::{CombinationMeta, CombinationResult};
use crate::types::config::{CombineOptions, MergeStrategy, OutputFormat};
use crate::types::file::SourceDoc;

/// Combine file contents into one document per the given options.
pub fn combine_files(sources: &[SourceDoc], options: &CombineOptions) -> CombinationResult {
    let start = Instant::now();
    let mut warnings = Vec::new();

    // Elide empty files and exact duplicates (by content hash).
    let mut seen_hashes = Vec::new();
    let mut kept: Vec<&SourceDoc> = Vec::new();
    let mut duplicates_removed = 0;

    for source in sources {
        if source.content.trim().is_empty() {
            warnings.push(format!("'{}' is empty and was skipped", source.name));
            continue;
        }
        let hash = content_hash(&source.content);
        if seen_hashes.contains(&hash) {
            duplicates_removed += 1;
            warnings.push(format!(
                "'{}' duplicates an earlier file and was skipped",
                source.name
            ));
            continue;
        }
        seen_hashes.push(hash);
        kept.push(source);
    }

    let mut parts: Vec<String> = Vec::new();

    if let Some(title) = &options.title {
        let mut front = format!("# {title}");
        if let Some(description) = &options.description {
            front.push_str("\n\n");
            front.push_str(description);
        }
        parts.push(front);
    }

    let sections_created = match options.strategy {
        MergeStrategy::Sections | MergeStrategy::AiCompiled => kept.len(),
        MergeStrategy::Concatenate => 0,
    };

    if options.table_of_contents && !kept.is_empty() && sections_created > 0 {
        let mut toc = String::from("## Contents\n");
        for source in &kept {
            toc.push_str(&format!("- [{}](#{})\n", source.name, slugify(&source.name)));
        }
        parts.push(toc.trim_end().to_string());
    }

    for source in &kept {
        let body = source.content.trim();
        match options.strategy {
            MergeStrategy::Concatenate => parts.push(body.to_string()),
            // AiCompiled falls back to sectioned assembly when invoked
            // locally (the runner routes it through the provider first).
            MergeStrategy::Sections | MergeStrategy::AiCompiled => {
                let body = if options.preserve_structure {
                    body.to_string()
                } else {
                    demote_headings(body)
                };
                parts.push(format!("## {}\n\n{}", source.name, body));
            }
        }
    }

    let mut content = parts.join(&options.separator);

    if options.remove_blank_lines {
        let collapse = Regex::new(r"\n{3,}").unwrap();
        content = collapse.replace_all(&content, "\n\n").to_string();
    }

    if options.format == OutputFormat::PlainText {
        content = strip_markdown(&content);
    }

    let meta = CombinationMeta {
        files_processed: kept.len(),
        total_words: content.split_whitespace().count(),
        total_chars: content.chars().count(),
        duplicates_removed,
        sections_created,
        processing_time_ms: start.elapsed().as_millis() as u64,
    };

    let suggestions = build_suggestions(options, &meta);

    CombinationResult {
        content,
        meta,
        warnings,
        suggestions,
    }
}

/// Wrap provider-compiled content in a [`CombinationResult`] with locally
/// computed metadata.
pub fn finalize_ai_compiled(
    content: String,
    sources: &[SourceDoc],
    options: &CombineOptions,
    elapsed_ms: u64,
) -> CombinationResult {
    let meta = CombinationMeta {
        files_processed: sources.len(),
        total_words: content.split_whitespace().count(),
        total_chars: content.chars().count(),
        duplicates_removed: 0,
        sections_created: content
            .lines()
            .filter(|l| l.starts_with("## "))
            .count(),
        processing_time_ms: elapsed_ms,
    };
    let suggestions = build_suggestions(options, &meta);

    CombinationResult {
        content,
        meta,
        warnings: Vec::new(),
        suggestions,
    }
}

fn build_suggestions(options: &CombineOptions, meta: &CombinationMeta) -> Vec<String> {
    let mut suggestions = Vec::new();
    if !options.table_of_contents && meta.sections_created >= 3 {
        suggestions.push("Enable the table of contents for easier navigation".to_string());
    }
    if meta.total_words > 5000 {
        suggestions.push("The document is long; consider condensing it".to_string());
    }
    if meta.duplicates_removed > 0 {
        suggestions.push("Review the source files for redundant copies".to_string());
    }
    suggestions
}

fn content_hash(content: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(content.trim().as_bytes());
    hasher.finalize().into()
}

/// Demote every markdown heading one level so file headings nest under the
/// per-file section heading.
fn demote_headings(text: &str) -> String {
    let mut out = Vec::with_capacity(text.lines().count());
    let mut in_code_block = false;

    for line in text.lines() {
        if line.trim_start().starts_with("```") {
            in_code_block = !in_code_block;
            out.push(line.to_string());
            continue;
        }
        if !in_code_block && line.starts_with('#') {
            out.push(format!("#{line}"));
        } else {
            out.push(line.to_string());
        }
    }
    out.join("\n")
}

/// Down-convert markdown to plain text.
fn strip_markdown(text: &str) -> String {
    let link_pattern = Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").unwrap();
    let heading_pattern = Regex::new(r"(?m)^#{1,6}\s+").unwrap();
    let emphasis_pattern = Regex::new(r"[*_]{1,3}([^*_]+)[*_]{1,3}").unwrap();

    let mut out = link_pattern.replace_all(text, "$1 ($2)").to_string();
    out = heading_pattern.replace_all(&out, "").to_string();
    out = emphasis_pattern.replace_all(&out, "$1").to_string();
    out = out.replace("```", "");
    out
}

fn slugify(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sources() -> Vec<SourceDoc> {
        vec![
            SourceDoc::new("intro.md", "# Intro\n\nWelcome."),
            SourceDoc::new("body.md", "# Body\n\nDetails here."),
        ]
    }

    #[test]
    fn test_sections_strategy_adds_file_headings() {
        let result = combine_files(&sources(), &CombineOptions::default());

        assert!(result.content.contains("## intro.md"));
        assert!(result.content.contains("## body.md"));
        assert_eq!(result.meta.files_processed, 2);
        assert_eq!(result.meta.sections_created, 2);
    }

    #[test]
    fn test_concatenate_strategy_joins_raw_contents() {
        let options = CombineOptions::new().with_strategy(MergeStrategy::Concatenate);
        let result = combine_files(&sources(), &options);

        assert!(!result.content.contains("## intro.md"));
        assert!(result.content.contains("Welcome."));
        assert!(result.content.contains("Details here."));
        assert_eq!(result.meta.sections_created, 0);
    }

    #[test]
    fn test_duplicates_are_elided_once() {
        let sources = vec![
            SourceDoc::new("a.md", "same content"),
            SourceDoc::new("b.md", "same content"),
            SourceDoc::new("c.md", "different"),
        ];
        let result = combine_files(&sources, &CombineOptions::default());

        assert_eq!(result.meta.files_processed, 2);
        assert_eq!(result.meta.duplicates_removed, 1);
        assert!(result.warnings.iter().any(|w| w.contains("b.md")));
    }

    #[test]
    fn test_empty_files_warned_and_skipped() {
        let sources = vec![
            SourceDoc::new("empty.md", "   "),
            SourceDoc::new("full.md", "content"),
        ];
        let result = combine_files(&sources, &CombineOptions::default());

        assert_eq!(result.meta.files_processed, 1);
        assert!(result.warnings.iter().any(|w| w.contains("empty.md")));
    }

    #[test]
    fn test_title_and_toc() {
        let options = CombineOptions::new()
            .with_title("Handbook")
            .with_description("Everything in one place.")
            .with_table_of_contents();
        let result = combine_files(&sources(), &options);

        assert!(result.content.starts_with("# Handbook"));
        assert!(result.content.contains("Everything in one place."));
        assert!(result.content.contains("## Contents"));
        assert!(result.content.contains("- [intro.md](#intro-md)"));
    }

    #[test]
    fn test_heading_demotion_when_structure_not_preserved() {
        let options = CombineOptions::new().flatten_structure();
        let result = combine_files(&sources(), &options);

        assert!(result.content.contains("## intro.md"));
        assert!(result.content.contains("## Intro"));
        assert!(!result.content.contains("\n# Intro"));
    }

    #[test]
    fn test_plain_text_output_strips_markup() {
        let sources = vec![SourceDoc::new(
            "a.md",
            "# Title\n\nSee **bold** and [link](https://example.com).",
        )];
        let options = CombineOptions::new()
            .with_strategy(MergeStrategy::Concatenate)
            .with_format(OutputFormat::PlainText);
        let result = combine_files(&sources, &options);

        assert!(!result.content.contains('#'));
        assert!(!result.content.contains("**"));
        assert!(result.content.contains("link (https://example.com)"));
    }

    #[test]
    fn test_blank_line_collapse() {
        let sources = vec![SourceDoc::new("a.md", "one\n\n\n\n\ntwo")];
        let options = CombineOptions::new()
            .with_strategy(MergeStrategy::Concatenate)
            .remove_blank_lines();
        let result = combine_files(&sources, &options);

        assert!(result.content.contains("one\n\ntwo"));
    }

    #[test]
    fn test_word_and_char_counts_measure_final_content() {
        let result = combine_files(&sources(), &CombineOptions::default());
        assert_eq!(
            result.meta.total_words,
            result.content.split_whitespace().count()
        );
        assert_eq!(result.meta.total_chars, result.content.chars().count());
    }
}
