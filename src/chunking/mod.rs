//! Text chunking for embedding and retrieval.
//!
//! Segments are split independently, so a chunk never spans two files or two
//! PDF pages and always carries the metadata of the segment it came from.

mod recursive;

pub use recursive::RecursiveSplitter;

use serde::{Deserialize, Serialize};

/// A contiguous span of extracted text with its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Text content of this chunk.
    pub text: String,
    /// Originating filename.
    pub source: String,
    /// 1-based page number when the source format is paginated.
    pub page: Option<u32>,
}

impl DocumentChunk {
    /// Create a new document chunk.
    pub fn new(text: String, source: String, page: Option<u32>) -> Self {
        Self { text, source, page }
    }

    /// Page number for display ("N/A" for unpaginated sources).
    pub fn page_label(&self) -> String {
        self.page
            .map(|p| p.to_string())
            .unwrap_or_else(|| "N/A".to_string())
    }
}

/// Configuration for chunking, in characters.
#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    /// Maximum characters per chunk.
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks.
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 2000,
            chunk_overlap: 100,
        }
    }
}

impl From<&crate::config::ChunkingSettings> for ChunkingConfig {
    fn from(settings: &crate::config::ChunkingSettings) -> Self {
        Self {
            chunk_size: settings.chunk_size,
            chunk_overlap: settings.chunk_overlap,
        }
    }
}

/// Split every segment into windows, preserving each segment's metadata.
pub fn split_documents(splitter: &RecursiveSplitter, segments: &[DocumentChunk]) -> Vec<DocumentChunk> {
    segments
        .iter()
        .flat_map(|segment| {
            splitter
                .split_text(&segment.text)
                .into_iter()
                .map(move |text| DocumentChunk::new(text, segment.source.clone(), segment.page))
        })
        .collect()
}
