//! Ingest command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::loader::UploadedFile;
use crate::orchestrator::Orchestrator;
use anyhow::{Context, Result};
use std::path::PathBuf;

/// Run the ingest command.
pub async fn run_ingest(files: &[String], settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ingest, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let mut uploads = Vec::with_capacity(files.len());
    for file in files {
        let path = PathBuf::from(shellexpand::tilde(file).to_string());
        let upload = UploadedFile::from_path(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        uploads.push(upload);
    }

    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner(&format!("Indexing {} files...", uploads.len()));
    let result = orchestrator.ingest(&uploads).await;
    spinner.finish_and_clear();

    match result {
        Ok(report) => {
            Output::ingest_report(&report);
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Ingestion failed: {}", e));
            Output::info("The previous index, if any, is unchanged.");
            Err(e.into())
        }
    }
}
