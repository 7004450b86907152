//! Error types for docbrain.

use thiserror::Error;

/// Library-level error type for docbrain operations.
#[derive(Error, Debug)]
pub enum DocBrainError {
    #[error("No files provided.")]
    NoFilesProvided,

    #[error("No valid text found in files.")]
    NoExtractableText,

    #[error("Index is unavailable. Ingest documents first.")]
    IndexUnavailable,

    #[error("External service failure: {0}")]
    ExternalService(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error(
        "Embedding model mismatch: index was built with {indexed} ({indexed_dimensions} dims), \
         but the configured embedder is {configured} ({configured_dimensions} dims). Re-ingest your documents."
    )]
    EmbeddingModelMismatch {
        indexed: String,
        indexed_dimensions: usize,
        configured: String,
        configured_dimensions: usize,
    },

    #[error("Failed to extract text from {file}: {reason}")]
    Extraction { file: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Index error: {0}")]
    Index(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl DocBrainError {
    /// Build an extraction error for a named file.
    pub fn extraction(file: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Extraction {
            file: file.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type alias for docbrain operations.
pub type Result<T> = std::result::Result<T, DocBrainError>;
