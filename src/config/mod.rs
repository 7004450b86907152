//! Configuration module for docbrain.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, RagPrompts};
pub use settings::{
    ChunkingSettings, EmbeddingSettings, GeneralSettings, IndexSettings, LlmSettings,
    PromptSettings, RetrievalSettings, Settings,
};
