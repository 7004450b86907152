//! Pipeline orchestrator for docbrain.
//!
//! Owns the components built from settings and runs ingestion and the
//! rewrite → retrieve → synthesize chain.

use crate::chunking::{ChunkingConfig, RecursiveSplitter};
use crate::config::{Prompts, Settings};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::Result;
use crate::index::{IndexManifest, IndexStore, SqliteIndexStore};
use crate::ingest::{IngestReport, IngestionPipeline};
use crate::llm::{ChatModel, OpenAIChatModel};
use crate::loader::{LoaderRegistry, UploadedFile};
use crate::rag::{
    AnswerSynthesizer, ConversationTurn, ModelChoice, ModelIds, QueryRewriter, RagAnswer,
    RetrievedChunk, Retriever,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument};

/// The main orchestrator for the docbrain pipeline.
pub struct Orchestrator {
    settings: Settings,
    prompts: Prompts,
    store: Arc<dyn IndexStore>,
    pipeline: IngestionPipeline,
    rewriter: QueryRewriter,
    retriever: Retriever,
    synthesizer: AnswerSynthesizer,
}

impl Orchestrator {
    /// Create an orchestrator backed by the configured services and index file.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let embedder: Arc<dyn Embedder> = Arc::new(OpenAIEmbedder::from_settings(&settings.embedding)?);
        let chat: Arc<dyn ChatModel> = Arc::new(OpenAIChatModel::from_settings(&settings.llm)?);
        let store: Arc<dyn IndexStore> = Arc::new(SqliteIndexStore::new(settings.index_path()));

        info!(
            "Using embedder {} and index {:?}",
            settings.embedding.model,
            settings.index_path()
        );

        Ok(Self::with_components(settings, prompts, embedder, chat, store))
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        embedder: Arc<dyn Embedder>,
        chat: Arc<dyn ChatModel>,
        store: Arc<dyn IndexStore>,
    ) -> Self {
        let models = ModelIds::from_settings(&settings.llm);
        let splitter = RecursiveSplitter::new(ChunkingConfig::from(&settings.chunking));

        Self {
            pipeline: IngestionPipeline::new(
                LoaderRegistry::with_defaults(),
                splitter,
                embedder.clone(),
                store.clone(),
            ),
            rewriter: QueryRewriter::new(chat.clone(), models.clone(), prompts.clone()),
            retriever: Retriever::new(embedder, store.clone()),
            synthesizer: AnswerSynthesizer::new(chat, models, prompts.clone()),
            settings,
            prompts,
            store,
        }
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Replace the index with the contents of `files`.
    pub async fn ingest(&self, files: &[UploadedFile]) -> Result<IngestReport> {
        self.pipeline.ingest(files).await
    }

    /// Answer a question grounded in the indexed documents.
    ///
    /// Fails with `IndexUnavailable` before any model call when nothing was ingested.
    #[instrument(skip(self, history), fields(turns = history.len()))]
    pub async fn answer(
        &self,
        question: &str,
        history: &[ConversationTurn],
        model: ModelChoice,
    ) -> Result<RagAnswer> {
        let started = Instant::now();
        let manifest = self.retriever.ensure_ready().await?;

        let standalone_question = self.rewriter.rewrite(history, question, model).await?;
        let evidence = self
            .retriever
            .retrieve_checked(&manifest, &standalone_question, self.settings.retrieval.k)
            .await?;
        let answer = self
            .synthesizer
            .synthesize(&standalone_question, &evidence, history, model)
            .await?;

        let latency = started.elapsed();
        info!(
            "Answered with {} evidence chunks in {:.2}s",
            evidence.len(),
            latency.as_secs_f64()
        );

        Ok(RagAnswer {
            answer,
            evidence,
            standalone_question,
            latency,
        })
    }

    /// Top `k` chunks for a question, without calling the language model.
    pub async fn retrieve(&self, question: &str, k: usize) -> Result<Vec<RetrievedChunk>> {
        self.retriever.retrieve(question, k).await
    }

    /// Turn an earlier answer into a short email, grounded in the same documents.
    ///
    /// The request runs through the normal pipeline with an empty history.
    pub async fn draft_email(&self, answer_text: &str, model: ModelChoice) -> Result<RagAnswer> {
        let mut vars = HashMap::new();
        vars.insert("answer".to_string(), answer_text.to_string());
        let request = self.prompts.render_with_custom(&self.prompts.rag.email_user, &vars);

        self.answer(&request, &[], model).await
    }

    /// Delete the index. Returns whether one existed.
    pub async fn reset(&self) -> Result<bool> {
        self.store.reset().await
    }

    /// Manifest of the current index, if any.
    pub async fn status(&self) -> Result<Option<IndexManifest>> {
        self.store.manifest().await
    }
}
