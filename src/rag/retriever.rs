//! Similarity retrieval over the index.

use super::RetrievedChunk;
use crate::embedding::Embedder;
use crate::error::{DocBrainError, Result};
use crate::index::{IndexManifest, IndexStore};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Embeds a question and returns the closest stored chunks.
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn IndexStore>,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn IndexStore>) -> Self {
        Self { embedder, store }
    }

    /// Manifest of a queryable index built with the configured embedder.
    ///
    /// Fails with `IndexUnavailable` when nothing was ingested and with
    /// `EmbeddingModelMismatch` when the index was built with another model.
    pub async fn ensure_ready(&self) -> Result<IndexManifest> {
        let manifest = self
            .store
            .manifest()
            .await?
            .ok_or(DocBrainError::IndexUnavailable)?;

        if manifest.embedding_model != self.embedder.model_id()
            || manifest.dimensions != self.embedder.dimensions()
        {
            return Err(self.mismatch(&manifest, self.embedder.dimensions()));
        }

        Ok(manifest)
    }

    /// Top `k` chunks for a standalone question, ranked from 1.
    ///
    /// Ties in score keep insertion order, so repeated calls return the same list.
    #[instrument(skip(self))]
    pub async fn retrieve(&self, question: &str, k: usize) -> Result<Vec<RetrievedChunk>> {
        let manifest = self.ensure_ready().await?;
        self.retrieve_checked(&manifest, question, k).await
    }

    /// Same as [`retrieve`](Self::retrieve) for a manifest already returned by
    /// [`ensure_ready`](Self::ensure_ready).
    pub async fn retrieve_checked(
        &self,
        manifest: &IndexManifest,
        question: &str,
        k: usize,
    ) -> Result<Vec<RetrievedChunk>> {
        let query_embedding = self.embedder.embed(question).await?;
        if query_embedding.len() != manifest.dimensions {
            return Err(self.mismatch(manifest, query_embedding.len()));
        }

        let hits = self.store.search(&query_embedding, k).await?;
        debug!("Retrieved {} chunks", hits.len());

        Ok(hits
            .into_iter()
            .enumerate()
            .map(|(i, hit)| RetrievedChunk {
                chunk: hit.chunk,
                rank: i + 1,
                score: hit.score,
            })
            .collect())
    }

    fn mismatch(&self, manifest: &IndexManifest, configured_dimensions: usize) -> DocBrainError {
        DocBrainError::EmbeddingModelMismatch {
            indexed: manifest.embedding_model.clone(),
            indexed_dimensions: manifest.dimensions,
            configured: self.embedder.model_id().to_string(),
            configured_dimensions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::DocumentChunk;
    use crate::index::{IndexedChunk, MemoryIndexStore};
    use crate::testing::HashingEmbedder;

    async fn populated(texts: &[(&str, &str)]) -> (Arc<HashingEmbedder>, Arc<MemoryIndexStore>) {
        let embedder = Arc::new(HashingEmbedder::new(64));
        let store = Arc::new(MemoryIndexStore::new());

        let mut chunks = Vec::new();
        for (i, (text, source)) in texts.iter().enumerate() {
            let embedding = embedder.embed(text).await.unwrap();
            chunks.push(IndexedChunk::new(
                DocumentChunk::new(text.to_string(), source.to_string(), None),
                embedding,
                i as u32,
            ));
        }
        let manifest = IndexManifest::describe(embedder.model_id(), 64, &chunks);
        store.replace(&chunks, &manifest).await.unwrap();

        (embedder, store)
    }

    #[tokio::test]
    async fn test_retrieve_before_ingest_is_unavailable() {
        let retriever = Retriever::new(
            Arc::new(HashingEmbedder::new(64)),
            Arc::new(MemoryIndexStore::new()),
        );
        let result = retriever.retrieve("anything", 3).await;
        assert!(matches!(result, Err(DocBrainError::IndexUnavailable)));
    }

    #[tokio::test]
    async fn test_ranks_start_at_one_and_best_match_first() {
        let (embedder, store) = populated(&[
            ("the cafeteria serves lunch at noon", "food.txt"),
            ("quarterly revenue rose ten percent", "finance.txt"),
            ("parking permits renew every january", "parking.txt"),
        ])
        .await;
        let retriever = Retriever::new(embedder, store);

        let results = retriever.retrieve("how much did revenue rise", 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].rank, 1);
        assert_eq!(results[1].rank, 2);
        assert_eq!(results[0].chunk.source, "finance.txt");
        assert!(results[0].score >= results[1].score);
    }

    #[tokio::test]
    async fn test_retrieval_is_idempotent() {
        let (embedder, store) = populated(&[
            ("alpha report", "a.txt"),
            ("alpha report", "b.txt"),
            ("beta summary", "c.txt"),
        ])
        .await;
        let retriever = Retriever::new(embedder, store);

        let first = retriever.retrieve("alpha", 3).await.unwrap();
        let second = retriever.retrieve("alpha", 3).await.unwrap();

        let sources = |r: &[RetrievedChunk]| r.iter().map(|c| c.chunk.source.clone()).collect::<Vec<_>>();
        assert_eq!(sources(&first), sources(&second));
        // Identical scores keep insertion order.
        assert_eq!(first[0].chunk.source, "a.txt");
        assert_eq!(first[1].chunk.source, "b.txt");
    }

    #[tokio::test]
    async fn test_model_mismatch_is_detected() {
        let (_, store) = populated(&[("some text", "a.txt")]).await;
        let retriever = Retriever::new(Arc::new(HashingEmbedder::with_model("other-model", 64)), store);

        let result = retriever.retrieve("some text", 1).await;
        assert!(matches!(result, Err(DocBrainError::EmbeddingModelMismatch { .. })));
    }
}
