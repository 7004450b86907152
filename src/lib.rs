//! docbrain - Document Question Answering
//!
//! Ingest PDF, DOCX, TXT and Markdown files into a local vector index and ask
//! questions answered only from their content, with the source files cited.
//!
//! # Overview
//!
//! docbrain allows you to:
//! - Extract text from uploaded files (per page for PDFs)
//! - Split it into overlapping chunks and embed them
//! - Replace the on-disk index atomically with each ingestion
//! - Ask follow-up questions that are rewritten into standalone ones
//! - Get answers restricted to the retrieved evidence, or a fixed refusal
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management and prompt templates
//! - `loader` - Per-extension text extraction
//! - `chunking` - Recursive character splitting
//! - `embedding` - Embedding generation
//! - `llm` - Chat-completion models
//! - `index` - Index store abstraction (SQLite file, in-memory)
//! - `ingest` - Loader → chunker → embedder → index pipeline
//! - `rag` - Query rewriting, retrieval and answer synthesis
//! - `orchestrator` - Pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use docbrain::config::Settings;
//! use docbrain::loader::UploadedFile;
//! use docbrain::orchestrator::Orchestrator;
//! use docbrain::rag::ModelChoice;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let file = UploadedFile::from_path(std::path::Path::new("handbook.pdf"))?;
//!     let report = orchestrator.ingest(&[file]).await?;
//!     println!("Indexed {} chunks", report.chunks_indexed);
//!
//!     let answer = orchestrator
//!         .answer("How many vacation days do we get?", &[], ModelChoice::Fast)
//!         .await?;
//!     println!("{}", answer.format_for_display());
//!
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod index;
pub mod ingest;
pub mod llm;
pub mod loader;
pub mod openai;
pub mod orchestrator;
pub mod rag;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{DocBrainError, Result};
