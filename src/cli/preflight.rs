//! Pre-flight checks before expensive operations.
//!
//! Validates that required credentials are available before starting
//! operations that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{DocBrainError, Result};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Answering questions calls the LLM and the embedding service.
    Ask,
    /// Ingestion calls the embedding service.
    Ingest,
    /// Search calls the embedding service.
    Search,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Ask => {
            check_env_key(&settings.llm.api_key_env)?;
            check_embedding_key(settings)?;
        }
        Operation::Ingest | Operation::Search => {
            check_embedding_key(settings)?;
        }
    }
    Ok(())
}

/// The embedding service only needs a key when one is configured.
fn check_embedding_key(settings: &Settings) -> Result<()> {
    match &settings.embedding.api_key_env {
        Some(env) => check_env_key(env),
        None => Ok(()),
    }
}

/// Check that an environment variable holds a non-empty credential.
fn check_env_key(name: &str) -> Result<()> {
    match std::env::var(name) {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(DocBrainError::Config(format!(
            "{} is empty. Set it with: export {}='...'",
            name, name
        ))),
        Err(_) => Err(DocBrainError::Config(format!(
            "{} not set. Set it with: export {}='...'",
            name, name
        ))),
    }
}
