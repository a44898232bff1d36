//! Reference text extractor.
//!
//! Handles the text-shaped file kinds directly: markdown, plain text, code,
//! and HTML (tag stripping). Binary document formats (.docx, .pdf, ...)
//! belong to a dedicated extractor behind the same trait; this reference
//! implementation declines them so the pipeline's per-file isolation can
//! report them cleanly.

use async_trait::async_trait;
use regex::Regex;

use crate::error::{ExtractError, ExtractResult};
use crate::traits::extractor::TextExtractor;
use crate::types::file::{FileKind, FileStructure, StagedFile};

/// Extractor for markdown, text, code, and HTML content.
#[derive(Debug, Clone, Default)]
pub struct MarkdownExtractor;

impl MarkdownExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Convert HTML to readable plain text with markdown-ish headings.
    fn html_to_text(&self, html: &str) -> String {
        let mut text = html.to_string();

        // Remove script and style blocks entirely
        let script_pattern = Regex::new(r"(?s)<script[^>]*>.*?</script>").unwrap();
        let style_pattern = Regex::new(r"(?s)<style[^>]*>.*?</style>").unwrap();
        text = script_pattern.replace_all(&text, "").to_string();
        text = style_pattern.replace_all(&text, "").to_string();

        // Headings become markdown headings
        for (level, marker) in [(1, "# "), (2, "## "), (3, "### "), (4, "#### ")] {
            let pattern = Regex::new(&format!(r"(?s)<h{level}[^>]*>(.*?)</h{level}>")).unwrap();
            text = pattern
                .replace_all(&text, format!("\n{marker}$1\n"))
                .to_string();
        }

        // Paragraphs, breaks, list items
        let p_pattern = Regex::new(r"(?s)<p[^>]*>(.*?)</p>").unwrap();
        let br_pattern = Regex::new(r"<br\s*/?>").unwrap();
        let li_pattern = Regex::new(r"(?s)<li[^>]*>(.*?)</li>").unwrap();
        text = p_pattern.replace_all(&text, "\n$1\n").to_string();
        text = br_pattern.replace_all(&text, "\n").to_string();
        text = li_pattern.replace_all(&text, "\n- $1").to_string();

        // Links keep their text and target
        let a_pattern = Regex::new(r#"(?s)<a[^>]*href=["']([^"']+)["'][^>]*>(.*?)</a>"#).unwrap();
        text = a_pattern.replace_all(&text, "[$2]($1)").to_string();

        // Drop every remaining tag
        let tag_pattern = Regex::new(r"<[^>]+>").unwrap();
        text = tag_pattern.replace_all(&text, "").to_string();

        // Common entities
        text = text
            .replace("&nbsp;", " ")
            .replace("&amp;", "&")
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&#39;", "'");

        // Collapse runs of blank lines
        let multi_newline = Regex::new(r"\n{3,}").unwrap();
        text = multi_newline.replace_all(&text, "\n\n").to_string();

        text.trim().to_string()
    }

    /// Scan text for markdown structure.
    fn scan_structure(&self, text: &str) -> FileStructure {
        let heading_pattern = Regex::new(r"^(#{1,6})\s+(.+)$").unwrap();
        let list_pattern = Regex::new(r"^\s*(?:[-*+]|\d+\.)\s+\S").unwrap();
        let link_pattern = Regex::new(r"\[[^\]]+\]\([^)]+\)").unwrap();

        let mut structure = FileStructure::default();
        let mut in_code_block = false;

        for line in text.lines() {
            if let Some(rest) = line.trim_start().strip_prefix("```") {
                if in_code_block {
                    in_code_block = false;
                } else {
                    in_code_block = true;
                    structure.code_blocks += 1;
                    let language = rest.trim();
                    if !language.is_empty() {
                        structure.code_languages.push(language.to_string());
                    }
                }
                continue;
            }
            if in_code_block {
                continue;
            }

            if let Some(caps) = heading_pattern.captures(line) {
                let level = caps[1].len() as u8;
                structure.headings.push((level, caps[2].trim().to_string()));
            } else if list_pattern.is_match(line) {
                structure.list_items += 1;
            }

            structure.links += link_pattern.find_iter(line).count();
        }

        structure.word_count = text.split_whitespace().count();
        structure
    }
}

#[async_trait]
impl TextExtractor for MarkdownExtractor {
    async fn extract_text(&self, file: &StagedFile) -> ExtractResult<String> {
        if file.content.trim().is_empty() {
            return Err(ExtractError::EmptyContent);
        }

        match file.kind {
            FileKind::Html => Ok(self.html_to_text(&file.content)),
            FileKind::Document => Err(ExtractError::Unsupported {
                kind: file.kind.to_string(),
            }),
            FileKind::Markdown | FileKind::Text | FileKind::Code | FileKind::Unknown => {
                // Normalize line endings; content is otherwise kept as-is.
                Ok(file.content.replace("\r\n", "\n").trim_end().to_string())
            }
        }
    }

    async fn extract_metadata(&self, file: &StagedFile) -> ExtractResult<FileStructure> {
        let text = match file.kind {
            FileKind::Html => self.html_to_text(&file.content),
            _ => file.content.clone(),
        };
        Ok(self.scan_structure(&text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_err;

    #[tokio::test]
    async fn test_html_is_stripped_to_text() {
        let extractor = MarkdownExtractor::new();
        let file = StagedFile::new(
            "page.html",
            "<html><head><style>.x{}</style></head>\
             <body><h1>Title</h1><p>Hello <b>world</b></p>\
             <ul><li>one</li><li>two</li></ul></body></html>",
        );

        let text = extractor.extract_text(&file).await.unwrap();
        assert!(text.contains("# Title"));
        assert!(text.contains("Hello world"));
        assert!(text.contains("- one"));
        assert!(!text.contains('<'));
    }

    #[tokio::test]
    async fn test_markdown_passes_through() {
        let extractor = MarkdownExtractor::new();
        let file = StagedFile::new("notes.md", "# Heading\r\n\r\nBody text\r\n");

        let text = extractor.extract_text(&file).await.unwrap();
        assert_eq!(text, "# Heading\n\nBody text");
    }

    #[tokio::test]
    async fn test_document_kind_is_declined() {
        let extractor = MarkdownExtractor::new();
        let file = StagedFile::new("report.docx", "PK...binaryish");

        let err = tokio_test::assert_err!(extractor.extract_text(&file).await);
        assert!(matches!(err, ExtractError::Unsupported { .. }));
    }

    #[tokio::test]
    async fn test_empty_content_is_rejected() {
        let extractor = MarkdownExtractor::new();
        let file = StagedFile::new("empty.txt", "   \n ");

        let err = tokio_test::assert_err!(extractor.extract_text(&file).await);
        assert!(matches!(err, ExtractError::EmptyContent));
    }

    #[tokio::test]
    async fn test_structure_scan() {
        let extractor = MarkdownExtractor::new();
        let file = StagedFile::new(
            "doc.md",
            "# Top\n\n## Sub\n\n- item one\n- item two\n\n\
             ```rust\nfn main() {}\n```\n\nSee [docs](https://example.com).\n",
        );

        let structure = extractor.extract_metadata(&file).await.unwrap();
        assert_eq!(structure.headings.len(), 2);
        assert_eq!(structure.headings[0], (1, "Top".to_string()));
        assert_eq!(structure.list_items, 2);
        assert_eq!(structure.code_blocks, 1);
        assert_eq!(structure.code_languages, vec!["rust"]);
        assert_eq!(structure.links, 1);
    }

    #[tokio::test]
    async fn test_code_fence_contents_not_scanned_as_structure() {
        let extractor = MarkdownExtractor::new();
        let file = StagedFile::new("doc.md", "```\n# not a heading\n- not a list\n```\n");

        let structure = extractor.extract_metadata(&file).await.unwrap();
        assert!(structure.headings.is_empty());
        assert_eq!(structure.list_items, 0);
        assert_eq!(structure.code_blocks, 1);
    }
}
