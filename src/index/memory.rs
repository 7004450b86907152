//! In-memory index store, used by tests and one-shot runs.

use super::{cosine_similarity, rank_hits, IndexManifest, IndexStore, IndexedChunk, SearchHit};
use crate::chunking::DocumentChunk;
use crate::error::{DocBrainError, Result};
use async_trait::async_trait;
use std::sync::RwLock;

struct Snapshot {
    chunks: Vec<IndexedChunk>,
    manifest: IndexManifest,
}

/// In-memory index store. The whole snapshot is swapped under a write lock.
pub struct MemoryIndexStore {
    current: RwLock<Option<Snapshot>>,
}

impl MemoryIndexStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            current: RwLock::new(None),
        }
    }
}

impl Default for MemoryIndexStore {
    fn default() -> Self {
        Self::new()
    }
}

fn lock_error(e: impl std::fmt::Display) -> DocBrainError {
    DocBrainError::Index(format!("Failed to acquire lock: {}", e))
}

#[async_trait]
impl IndexStore for MemoryIndexStore {
    async fn replace(&self, chunks: &[IndexedChunk], manifest: &IndexManifest) -> Result<()> {
        if chunks.iter().any(|c| c.embedding.len() != manifest.dimensions) {
            return Err(DocBrainError::Index(format!(
                "Embedding dimensions do not match manifest ({})",
                manifest.dimensions
            )));
        }

        let snapshot = Snapshot {
            chunks: chunks.to_vec(),
            manifest: manifest.clone(),
        };
        *self.current.write().map_err(lock_error)? = Some(snapshot);
        Ok(())
    }

    async fn manifest(&self) -> Result<Option<IndexManifest>> {
        let current = self.current.read().map_err(lock_error)?;
        Ok(current.as_ref().map(|s| s.manifest.clone()))
    }

    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchHit>> {
        let current = self.current.read().map_err(lock_error)?;
        let snapshot = current.as_ref().ok_or(DocBrainError::IndexUnavailable)?;

        let hits = snapshot
            .chunks
            .iter()
            .map(|c| SearchHit {
                chunk: c.chunk.clone(),
                score: cosine_similarity(query_embedding, &c.embedding),
                order: c.order,
            })
            .collect();

        Ok(rank_hits(hits, limit))
    }

    async fn chunks(&self) -> Result<Vec<DocumentChunk>> {
        let current = self.current.read().map_err(lock_error)?;
        let snapshot = current.as_ref().ok_or(DocBrainError::IndexUnavailable)?;

        let mut indexed: Vec<&IndexedChunk> = snapshot.chunks.iter().collect();
        indexed.sort_by_key(|c| c.order);
        Ok(indexed.into_iter().map(|c| c.chunk.clone()).collect())
    }

    async fn reset(&self) -> Result<bool> {
        Ok(self.current.write().map_err(lock_error)?.take().is_some())
    }
}
