//! Ingestion pipeline: uploaded files to a freshly built index.

use crate::chunking::{split_documents, DocumentChunk, RecursiveSplitter};
use crate::embedding::Embedder;
use crate::error::{DocBrainError, Result};
use crate::index::{IndexManifest, IndexStore, IndexedChunk};
use crate::loader::{LoaderRegistry, UploadedFile};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// A file left out of the index, with the reason.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedFile {
    pub name: String,
    pub reason: String,
}

/// Outcome of a successful ingestion.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    /// Files handed to the pipeline.
    pub files_received: usize,
    /// Files that contributed at least one segment.
    pub files_loaded: usize,
    /// Files that were unsupported or could not be read.
    pub skipped: Vec<SkippedFile>,
    /// Extracted segments (pages for PDFs, whole documents otherwise).
    pub segments: usize,
    /// Chunks written to the new index.
    pub chunks_indexed: usize,
}

/// Loads, chunks, embeds and indexes a batch of files.
pub struct IngestionPipeline {
    loaders: LoaderRegistry,
    splitter: RecursiveSplitter,
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn IndexStore>,
}

impl IngestionPipeline {
    pub fn new(
        loaders: LoaderRegistry,
        splitter: RecursiveSplitter,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn IndexStore>,
    ) -> Self {
        Self {
            loaders,
            splitter,
            embedder,
            store,
        }
    }

    /// Build a new index from `files`, replacing the current one.
    ///
    /// Unsupported and unreadable files are skipped. If nothing usable remains
    /// the batch fails and the current index is left as it was.
    #[instrument(skip(self, files), fields(files = files.len()))]
    pub async fn ingest(&self, files: &[UploadedFile]) -> Result<IngestReport> {
        if files.is_empty() {
            return Err(DocBrainError::NoFilesProvided);
        }

        let mut segments: Vec<DocumentChunk> = Vec::new();
        let mut skipped = Vec::new();
        let mut files_loaded = 0;

        for file in files {
            match self.loaders.load(file) {
                Ok(loaded) if loaded.is_empty() => {
                    debug!("{} has no text", file.name);
                }
                Ok(loaded) => {
                    files_loaded += 1;
                    segments.extend(loaded);
                }
                Err(e @ (DocBrainError::UnsupportedFileType(_) | DocBrainError::Extraction { .. })) => {
                    warn!("Skipping {}: {}", file.name, e);
                    skipped.push(SkippedFile {
                        name: file.name.clone(),
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        if segments.is_empty() {
            return Err(DocBrainError::NoExtractableText);
        }

        let chunks = split_documents(&self.splitter, &segments);
        if chunks.is_empty() {
            return Err(DocBrainError::NoExtractableText);
        }
        info!(
            "Split {} segments from {} files into {} chunks",
            segments.len(),
            files_loaded,
            chunks.len()
        );

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(DocBrainError::ExternalService(format!(
                "Expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let indexed: Vec<IndexedChunk> = chunks
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(i, (chunk, embedding))| IndexedChunk::new(chunk, embedding, i as u32))
            .collect();

        let manifest = IndexManifest::describe(
            self.embedder.model_id(),
            self.embedder.dimensions(),
            &indexed,
        );
        self.store.replace(&indexed, &manifest).await?;

        info!("Indexed {} chunks", indexed.len());

        Ok(IngestReport {
            files_received: files.len(),
            files_loaded,
            skipped,
            segments: segments.len(),
            chunks_indexed: indexed.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::ChunkingConfig;
    use crate::index::{MemoryIndexStore, SqliteIndexStore};
    use crate::testing::{build_pdf, FailingEmbedder, HashingEmbedder};

    fn pipeline(embedder: Arc<dyn Embedder>, store: Arc<dyn IndexStore>) -> IngestionPipeline {
        IngestionPipeline::new(
            LoaderRegistry::with_defaults(),
            RecursiveSplitter::new(ChunkingConfig {
                chunk_size: 200,
                chunk_overlap: 20,
            }),
            embedder,
            store,
        )
    }

    #[tokio::test]
    async fn test_no_files() {
        let result = pipeline(Arc::new(HashingEmbedder::new(64)), Arc::new(MemoryIndexStore::new()))
            .ingest(&[])
            .await;
        assert!(matches!(result, Err(DocBrainError::NoFilesProvided)));
    }

    #[tokio::test]
    async fn test_only_blank_or_unsupported_files() {
        let store = Arc::new(MemoryIndexStore::new());
        let result = pipeline(Arc::new(HashingEmbedder::new(64)), store.clone())
            .ingest(&[
                UploadedFile::new("empty.txt", "   \n\n  "),
                UploadedFile::new("image.png", vec![0x89u8, 0x50]),
            ])
            .await;

        assert!(matches!(result, Err(DocBrainError::NoExtractableText)));
        assert!(store.manifest().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_mixed_batch_reports_skips() {
        let store = Arc::new(MemoryIndexStore::new());
        let report = pipeline(Arc::new(HashingEmbedder::new(64)), store.clone())
            .ingest(&[
                UploadedFile::new("notes.TXT", "Meeting moved to Thursday."),
                UploadedFile::new("report.pdf", build_pdf(&["Page one text", "Page two text"])),
                UploadedFile::new("broken.pdf", b"not a pdf".to_vec()),
                UploadedFile::new("slides.pptx", b"pk".to_vec()),
            ])
            .await
            .unwrap();

        assert_eq!(report.files_received, 4);
        assert_eq!(report.files_loaded, 2);
        assert_eq!(report.segments, 3);
        assert_eq!(report.chunks_indexed, 3);

        let skipped: Vec<&str> = report.skipped.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(skipped, vec!["broken.pdf", "slides.pptx"]);

        let chunks = store.chunks().await.unwrap();
        let pdf_pages: Vec<Option<u32>> = chunks
            .iter()
            .filter(|c| c.source == "report.pdf")
            .map(|c| c.page)
            .collect();
        assert_eq!(pdf_pages, vec![Some(1), Some(2)]);

        let manifest = store.manifest().await.unwrap().unwrap();
        assert_eq!(manifest.sources, vec!["notes.TXT", "report.pdf"]);
    }

    #[tokio::test]
    async fn test_reingest_replaces_index() {
        let store = Arc::new(MemoryIndexStore::new());
        let pipeline = pipeline(Arc::new(HashingEmbedder::new(64)), store.clone());

        pipeline
            .ingest(&[UploadedFile::new("a.txt", "apples are red")])
            .await
            .unwrap();
        pipeline
            .ingest(&[UploadedFile::new("b.txt", "bananas are yellow")])
            .await
            .unwrap();

        let sources: Vec<String> = store.chunks().await.unwrap().into_iter().map(|c| c.source).collect();
        assert_eq!(sources, vec!["b.txt"]);
    }

    #[tokio::test]
    async fn test_failed_ingest_keeps_previous_index() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(SqliteIndexStore::new(dir.path().join("index.db")));

        pipeline(Arc::new(HashingEmbedder::new(64)), store.clone())
            .ingest(&[UploadedFile::new("a.txt", "apples are red")])
            .await
            .unwrap();

        let result = pipeline(Arc::new(FailingEmbedder), store.clone())
            .ingest(&[UploadedFile::new("b.txt", "bananas are yellow")])
            .await;
        assert!(matches!(result, Err(DocBrainError::ExternalService(_))));

        let chunks = store.chunks().await.unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].source, "a.txt");
    }
}
