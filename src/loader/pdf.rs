//! Page-aware PDF text extraction.

use super::{ExtractedSegment, Extractor};
use crate::error::{DocBrainError, Result};
use lopdf::Document;
use tracing::{debug, warn};

/// Extracts one segment per PDF page, tagged with its 1-based page number.
pub struct PdfExtractor;

impl Extractor for PdfExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<Vec<ExtractedSegment>> {
        let doc = Document::load_mem(bytes)
            .map_err(|e| DocBrainError::extraction("document.pdf", format!("Failed to load PDF: {}", e)))?;

        let pages = doc.get_pages();
        debug!("PDF has {} pages", pages.len());

        let mut segments = Vec::with_capacity(pages.len());
        for page_number in pages.keys() {
            match doc.extract_text(&[*page_number]) {
                Ok(text) if !text.trim().is_empty() => {
                    segments.push(ExtractedSegment::page(text, *page_number));
                }
                Ok(_) => debug!("Page {} has no extractable text", page_number),
                Err(e) => warn!("Could not extract text from page {}: {}", page_number, e),
            }
        }

        Ok(segments)
    }
}
