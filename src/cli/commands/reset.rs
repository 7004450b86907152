//! Reset command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the reset command.
pub async fn run_reset(settings: Settings) -> Result<()> {
    let index_path = settings.index_path();
    let orchestrator = Orchestrator::new(settings)?;

    if orchestrator.reset().await? {
        Output::success(&format!("Deleted index at {}", index_path.display()));
    } else {
        Output::info("No index to delete.");
    }

    Ok(())
}
