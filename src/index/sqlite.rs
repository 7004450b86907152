//! SQLite-file index store.
//!
//! The index lives in a single SQLite file. Replacement builds a complete new
//! file next to the old one and renames it into place, so readers see either
//! the previous index or the new one, never a mix. Cosine similarity is
//! computed in Rust over every stored vector.

use super::{cosine_similarity, rank_hits, IndexManifest, IndexStore, IndexedChunk, SearchHit};
use crate::chunking::DocumentChunk;
use crate::error::{DocBrainError, Result};
use async_trait::async_trait;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
    CREATE TABLE chunks (
        id TEXT PRIMARY KEY,
        chunk_order INTEGER NOT NULL,
        source TEXT NOT NULL,
        page INTEGER,
        content TEXT NOT NULL,
        embedding BLOB NOT NULL
    );

    CREATE INDEX idx_chunks_order ON chunks(chunk_order);

    CREATE TABLE meta (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );
"#;

/// SQLite-file index store.
pub struct SqliteIndexStore {
    path: PathBuf,
}

impl SqliteIndexStore {
    /// Create a store for the given index file. Nothing is created until the first replace.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the index file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open the index read-only, or `None` when it does not exist.
    fn open_read(&self) -> Result<Option<Connection>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Some(conn))
    }

    fn open_required(&self) -> Result<Connection> {
        self.open_read()?.ok_or(DocBrainError::IndexUnavailable)
    }

    /// Serialize embedding to bytes.
    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Deserialize embedding from bytes.
    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }

    /// Write a complete index into `path`, which must not already hold tables.
    fn write_index(path: &Path, chunks: &[IndexedChunk], manifest: &IndexManifest) -> Result<()> {
        let mut conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;

        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO chunks (id, chunk_order, source, page, content, embedding)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )?;

            for indexed in chunks {
                stmt.execute(params![
                    indexed.id.to_string(),
                    indexed.order,
                    indexed.chunk.source,
                    indexed.chunk.page,
                    indexed.chunk.text,
                    Self::embedding_to_bytes(&indexed.embedding),
                ])?;
            }
        }
        tx.execute(
            "INSERT INTO meta (key, value) VALUES ('manifest', ?1)",
            params![serde_json::to_string(manifest)?],
        )?;
        tx.commit()?;

        Ok(())
    }
}

#[async_trait]
impl IndexStore for SqliteIndexStore {
    #[instrument(skip(self, chunks, manifest), fields(count = chunks.len()))]
    async fn replace(&self, chunks: &[IndexedChunk], manifest: &IndexManifest) -> Result<()> {
        if let Some(bad) = chunks.iter().find(|c| c.embedding.len() != manifest.dimensions) {
            return Err(DocBrainError::Index(format!(
                "Chunk {} has {} dimensions, manifest declares {}",
                bad.order,
                bad.embedding.len(),
                manifest.dimensions
            )));
        }

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        // Removed on drop unless persisted.
        let staging = tempfile::Builder::new()
            .prefix(".docbrain-index-")
            .suffix(".building")
            .tempfile_in(&dir)?;

        Self::write_index(staging.path(), chunks, manifest)?;

        staging
            .persist(&self.path)
            .map_err(|e| DocBrainError::Io(e.error))?;

        info!("Replaced index at {:?} with {} chunks", self.path, chunks.len());
        Ok(())
    }

    async fn manifest(&self) -> Result<Option<IndexManifest>> {
        let Some(conn) = self.open_read()? else {
            return Ok(None);
        };

        let raw: Option<String> = conn
            .query_row("SELECT value FROM meta WHERE key = 'manifest'", [], |row| row.get(0))
            .optional()?;

        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Err(DocBrainError::Index(format!(
                "Index at {:?} has no manifest; reset and re-ingest",
                self.path
            ))),
        }
    }

    #[instrument(skip(self, query_embedding))]
    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchHit>> {
        let conn = self.open_required()?;

        let mut stmt = conn.prepare(
            "SELECT source, page, content, embedding, chunk_order FROM chunks",
        )?;

        let rows = stmt.query_map([], |row| {
            let embedding_bytes: Vec<u8> = row.get(3)?;
            Ok((
                DocumentChunk::new(row.get(2)?, row.get(0)?, row.get(1)?),
                Self::bytes_to_embedding(&embedding_bytes),
                row.get::<_, u32>(4)?,
            ))
        })?;

        let mut hits = Vec::new();
        for row in rows {
            let (chunk, embedding, order) = row?;
            hits.push(SearchHit {
                score: cosine_similarity(query_embedding, &embedding),
                chunk,
                order,
            });
        }

        let ranked = rank_hits(hits, limit);
        debug!("Found {} matching chunks", ranked.len());
        Ok(ranked)
    }

    async fn chunks(&self) -> Result<Vec<DocumentChunk>> {
        let conn = self.open_required()?;

        let mut stmt = conn.prepare("SELECT source, page, content FROM chunks ORDER BY chunk_order")?;
        let rows = stmt.query_map([], |row| {
            Ok(DocumentChunk::new(row.get(2)?, row.get(0)?, row.get(1)?))
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>().map_err(Into::into)
    }

    #[instrument(skip(self))]
    async fn reset(&self) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&self.path)?;
        info!("Deleted index at {:?}", self.path);
        Ok(true)
    }
}
