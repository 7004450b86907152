//! CLI output formatting utilities.

use crate::ingest::IngestReport;
use crate::rag::{RagAnswer, RetrievedChunk};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Characters of chunk text shown in search results.
const SEARCH_PREVIEW_CHARS: usize = 200;

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a list item.
    pub fn list_item(msg: &str) {
        println!("  {} {}", style("*").cyan(), msg);
    }

    /// Print an answer, its evidence and latency. Cited sources are marked.
    pub fn answer(answer: &RagAnswer) {
        println!("\n{}\n", answer.answer);

        if !answer.evidence.is_empty() {
            let cited = answer.cited_sources();
            Output::header("Sources");
            for item in &answer.evidence {
                let marker = if cited.contains(&item.chunk.source) {
                    style("cited").green().to_string()
                } else {
                    style("retrieved").dim().to_string()
                };
                println!(
                    "\n{} {} (page {}) [{}]",
                    style(format!("[{}]", item.rank)).cyan(),
                    style(&item.chunk.source).bold(),
                    item.chunk.page_label(),
                    marker
                );
                println!("   {}", style(item.preview().replace('\n', " ")).dim());
            }
        }

        println!(
            "\n{}",
            style(format!("Latency: {:.2}s", answer.latency.as_secs_f64())).dim()
        );
    }

    /// Print a search result.
    pub fn search_result(item: &RetrievedChunk) {
        println!(
            "\n{} {} (page {}, score: {:.2})",
            style(format!("[{}]", item.rank)).green(),
            style(&item.chunk.source).bold(),
            style(item.chunk.page_label()).cyan(),
            item.score
        );
        println!("   {}", content_preview(&item.chunk.text, SEARCH_PREVIEW_CHARS));
    }

    /// Print an ingestion summary.
    pub fn ingest_report(report: &IngestReport) {
        Output::success(&format!(
            "Indexed {} chunks from {} of {} files",
            report.chunks_indexed, report.files_loaded, report.files_received
        ));
        Output::kv("Segments", &report.segments.to_string());

        for skipped in &report.skipped {
            Output::warning(&format!("Skipped {}: {}", skipped.name, skipped.reason));
        }
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Flatten newlines and truncate on a character boundary.
fn content_preview(content: &str, max_chars: usize) -> String {
    let content = content.replace('\n', " ");
    if content.chars().count() <= max_chars {
        content
    } else {
        let truncated: String = content.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}
