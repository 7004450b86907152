//! Document loading: turns uploaded files into provenance-tagged text segments.
//!
//! Extraction strategies are registered per file extension, so supporting a new
//! format means registering another [`Extractor`].

mod docx;
mod pdf;
mod text;

pub use docx::DocxExtractor;
pub use pdf::PdfExtractor;
pub use text::PlainTextExtractor;

use crate::chunking::DocumentChunk;
use crate::error::{DocBrainError, Result};
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// An uploaded file held in memory.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Original filename, used for extension lookup and citations.
    pub name: String,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, keeping only its file name as the citation source.
    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| DocBrainError::InvalidInput(format!("Not a file path: {}", path.display())))?
            .to_string();
        let bytes = std::fs::read(path)?;
        Ok(Self { name, bytes })
    }

    /// Lowercased extension without the dot, if any.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }
}

/// A unit of extracted text before chunking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedSegment {
    pub text: String,
    /// 1-based page number, for paginated formats only.
    pub page: Option<u32>,
}

impl ExtractedSegment {
    pub fn whole(text: impl Into<String>) -> Self {
        Self { text: text.into(), page: None }
    }

    pub fn page(text: impl Into<String>, page: u32) -> Self {
        Self { text: text.into(), page: Some(page) }
    }
}

/// A text extraction strategy for one file format.
pub trait Extractor: Send + Sync {
    /// Extract text segments from raw file bytes.
    fn extract(&self, bytes: &[u8]) -> Result<Vec<ExtractedSegment>>;
}

/// Maps file extensions to extraction strategies.
#[derive(Clone, Default)]
pub struct LoaderRegistry {
    extractors: HashMap<String, Arc<dyn Extractor>>,
}

impl LoaderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in formats: pdf, docx, txt and md.
    pub fn with_defaults() -> Self {
        let text: Arc<dyn Extractor> = Arc::new(PlainTextExtractor);
        Self::new()
            .register("pdf", Arc::new(PdfExtractor))
            .register("docx", Arc::new(DocxExtractor))
            .register("txt", text.clone())
            .register("md", text)
    }

    /// Register (or replace) the extractor for an extension.
    pub fn register(mut self, extension: &str, extractor: Arc<dyn Extractor>) -> Self {
        self.extractors
            .insert(extension.trim_start_matches('.').to_ascii_lowercase(), extractor);
        self
    }

    /// Whether files with this extension can be loaded.
    pub fn supports(&self, extension: &str) -> bool {
        self.extractors.contains_key(&extension.to_ascii_lowercase())
    }

    /// Registered extensions, sorted.
    pub fn extensions(&self) -> Vec<String> {
        let mut exts: Vec<String> = self.extractors.keys().cloned().collect();
        exts.sort();
        exts
    }

    /// Load a file into source-tagged segments.
    ///
    /// Blank segments are dropped, so an empty file yields an empty vector.
    pub fn load(&self, file: &UploadedFile) -> Result<Vec<DocumentChunk>> {
        let extension = file.extension().unwrap_or_default();
        let extractor = self
            .extractors
            .get(&extension)
            .ok_or_else(|| DocBrainError::UnsupportedFileType(file.name.clone()))?;

        let segments = extractor
            .extract(&file.bytes)
            .map_err(|e| match e {
                DocBrainError::Extraction { reason, .. } => DocBrainError::extraction(&file.name, reason),
                other => other,
            })?;

        let chunks: Vec<DocumentChunk> = segments
            .into_iter()
            .map(|segment| ExtractedSegment {
                text: normalize_text(&segment.text),
                page: segment.page,
            })
            .filter(|segment| !segment.text.trim().is_empty())
            .map(|segment| DocumentChunk::new(segment.text, file.name.clone(), segment.page))
            .collect();

        debug!("Loaded {} segments from {}", chunks.len(), file.name);
        Ok(chunks)
    }
}

/// Normalize line endings, drop NUL bytes and collapse runs of blank lines.
pub fn normalize_text(text: &str) -> String {
    static BLANK_RUNS: OnceLock<Regex> = OnceLock::new();
    let blank_runs = BLANK_RUNS.get_or_init(|| Regex::new(r"\n[ \t]*(\n[ \t]*)+\n").expect("valid regex"));

    let text = text.replace("\r\n", "\n").replace('\r', "\n").replace('\0', "");
    blank_runs.replace_all(&text, "\n\n").trim().to_string()
}
