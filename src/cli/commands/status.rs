//! Status command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the status command.
pub async fn run_status(settings: Settings) -> Result<()> {
    let index_path = settings.index_path();
    let configured_model = settings.embedding.model.clone();
    let orchestrator = Orchestrator::new(settings)?;

    let Some(manifest) = orchestrator.status().await? else {
        Output::info("No documents indexed yet. Use 'docbrain ingest <files>' to add some.");
        return Ok(());
    };

    Output::header(&format!("Indexed Documents ({})", manifest.source_count));
    println!();
    for source in &manifest.sources {
        Output::list_item(source);
    }

    println!();
    Output::kv("Chunks", &manifest.chunk_count.to_string());
    Output::kv(
        "Embedding model",
        &format!("{} ({} dims)", manifest.embedding_model, manifest.dimensions),
    );
    Output::kv("Built", &manifest.built_at.format("%Y-%m-%d %H:%M:%S UTC").to_string());
    Output::kv("Index file", &index_path.display().to_string());

    if manifest.embedding_model != configured_model {
        Output::warning(&format!(
            "Configured embedding model is {}; re-ingest before asking questions.",
            configured_model
        ));
    }

    Ok(())
}
