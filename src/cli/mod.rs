//! CLI module for docbrain.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// docbrain - Ask questions about your documents
///
/// Ingest PDF, DOCX, TXT and Markdown files into a local index and get answers
/// grounded only in their content, with the source files cited.
#[derive(Parser, Debug)]
#[command(name = "docbrain")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a new index from files, replacing the current one
    Ingest {
        /// Files to index (pdf, docx, txt, md)
        #[arg(required = true)]
        files: Vec<String>,
    },

    /// Ask a single question about the indexed documents
    Ask {
        /// The question to ask
        question: String,

        /// Use the thorough model instead of the fast one
        #[arg(short, long)]
        smart: bool,

        /// Number of chunks to retrieve (defaults to retrieval.k)
        #[arg(short, long)]
        k: Option<usize>,
    },

    /// Start an interactive chat session
    Chat {
        /// Use the thorough model instead of the fast one
        #[arg(short, long)]
        smart: bool,
    },

    /// Show the chunks most similar to a query, without calling the LLM
    Search {
        /// Search query
        query: String,

        /// Maximum number of results (defaults to retrieval.k)
        #[arg(short, long)]
        k: Option<usize>,
    },

    /// Delete the index
    Reset,

    /// Show what is currently indexed
    Status,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}
