//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::rag::ModelChoice;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(question: &str, smart: bool, k: Option<usize>, mut settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    if let Some(k) = k {
        settings.retrieval.k = k;
    }

    let orchestrator = Orchestrator::new(settings)?;
    let spinner = Output::spinner("Searching documents...");

    match orchestrator.answer(question, &[], ModelChoice::from_smart(smart)).await {
        Ok(answer) => {
            spinner.finish_and_clear();
            Output::answer(&answer);
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
