//! Word-processor (.docx) text extraction.

use super::{ExtractedSegment, Extractor};
use crate::error::{DocBrainError, Result};
use docx_rs::{DocumentChild, Paragraph, ParagraphChild, RunChild};

/// Extracts the whole document body as a single segment, one line per paragraph.
pub struct DocxExtractor;

impl DocxExtractor {
    fn paragraph_text(paragraph: &Paragraph) -> String {
        let mut text = String::new();
        for child in &paragraph.children {
            if let ParagraphChild::Run(run) = child {
                for run_child in &run.children {
                    match run_child {
                        RunChild::Text(t) => text.push_str(&t.text),
                        RunChild::Tab(_) => text.push('\t'),
                        RunChild::Break(_) => text.push('\n'),
                        _ => {}
                    }
                }
            }
        }
        text
    }
}

impl Extractor for DocxExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<Vec<ExtractedSegment>> {
        let doc = docx_rs::read_docx(bytes)
            .map_err(|e| DocBrainError::extraction("document.docx", e))?;

        let paragraphs: Vec<String> = doc
            .document
            .children
            .iter()
            .filter_map(|child| match child {
                DocumentChild::Paragraph(p) => Some(Self::paragraph_text(p)),
                _ => None,
            })
            .collect();

        let content = paragraphs.join("\n");
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        Ok(vec![ExtractedSegment::whole(content)])
    }
}
