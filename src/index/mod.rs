//! Index store abstraction for docbrain.
//!
//! The index is a singleton: it is either absent or holds the complete result
//! of the most recent successful ingestion. It is replaced wholesale and never
//! updated incrementally.

mod memory;
mod sqlite;

pub use memory::MemoryIndexStore;
pub use sqlite::SqliteIndexStore;

use crate::chunking::DocumentChunk;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// A chunk paired with its embedding, ready to be stored.
#[derive(Debug, Clone)]
pub struct IndexedChunk {
    /// Unique chunk ID.
    pub id: Uuid,
    /// The text and its provenance.
    pub chunk: DocumentChunk,
    /// Embedding vector.
    pub embedding: Vec<f32>,
    /// Position in the ingestion batch; breaks score ties.
    pub order: u32,
}

impl IndexedChunk {
    /// Create a new indexed chunk.
    pub fn new(chunk: DocumentChunk, embedding: Vec<f32>, order: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            chunk,
            embedding,
            order,
        }
    }
}

/// Description of the index currently on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    /// Embedding model used to build the index.
    pub embedding_model: String,
    /// Embedding dimensions.
    pub dimensions: usize,
    /// Number of stored chunks.
    pub chunk_count: usize,
    /// Number of distinct source files.
    pub source_count: usize,
    /// Distinct source filenames, sorted.
    pub sources: Vec<String>,
    /// When the index was built.
    pub built_at: DateTime<Utc>,
}

impl IndexManifest {
    /// Describe a batch of chunks embedded with the given model.
    pub fn describe(embedding_model: &str, dimensions: usize, chunks: &[IndexedChunk]) -> Self {
        let sources: BTreeSet<&str> = chunks.iter().map(|c| c.chunk.source.as_str()).collect();
        Self {
            embedding_model: embedding_model.to_string(),
            dimensions,
            chunk_count: chunks.len(),
            source_count: sources.len(),
            sources: sources.into_iter().map(String::from).collect(),
            built_at: Utc::now(),
        }
    }
}

/// A stored chunk with its similarity to a query.
#[derive(Debug, Clone)]
pub struct SearchHit {
    /// The matched chunk.
    pub chunk: DocumentChunk,
    /// Cosine similarity (higher is better).
    pub score: f32,
    /// Insertion order of the chunk.
    pub order: u32,
}

/// Trait for index store implementations.
#[async_trait]
pub trait IndexStore: Send + Sync {
    /// Replace the whole index with a new set of chunks.
    ///
    /// Either the new index becomes visible in full, or the previous one stays untouched.
    async fn replace(&self, chunks: &[IndexedChunk], manifest: &IndexManifest) -> Result<()>;

    /// Manifest of the current index, or `None` when no index exists.
    async fn manifest(&self) -> Result<Option<IndexManifest>>;

    /// Top `limit` chunks by cosine similarity. Fails with `IndexUnavailable` when no index exists.
    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchHit>>;

    /// All stored chunks in insertion order. Fails with `IndexUnavailable` when no index exists.
    async fn chunks(&self) -> Result<Vec<DocumentChunk>>;

    /// Delete the index. Returns whether one existed.
    async fn reset(&self) -> Result<bool>;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Sort hits by descending score, then insertion order, and keep the first `limit`.
pub fn rank_hits(mut hits: Vec<SearchHit>, limit: usize) -> Vec<SearchHit> {
    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.order.cmp(&b.order))
    });
    hits.truncate(limit);
    hits
}
