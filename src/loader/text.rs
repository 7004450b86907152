//! Plain text and Markdown extraction.

use super::{ExtractedSegment, Extractor};
use crate::error::Result;

/// Reads the file as UTF-8 (invalid sequences are replaced) into a single segment.
pub struct PlainTextExtractor;

impl Extractor for PlainTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<Vec<ExtractedSegment>> {
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        let text = String::from_utf8_lossy(bytes).into_owned();
        Ok(vec![ExtractedSegment::whole(text)])
    }
}
