//! RAG (Retrieval-Augmented Generation) for question answering with sources.
//!
//! A question goes through three stages: the rewriter turns a follow-up into a
//! standalone question, the retriever finds the closest chunks in the index,
//! and the synthesizer answers from those chunks only.

mod rewriter;
mod retriever;
mod synthesizer;

pub use retriever::Retriever;
pub use rewriter::QueryRewriter;
pub use synthesizer::{cited_sources, AnswerSynthesizer};

use crate::chunking::DocumentChunk;
use crate::config::LlmSettings;
use crate::llm::ChatMessage;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Characters of chunk text shown in evidence previews.
const PREVIEW_CHARS: usize = 300;

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One prior message in a conversation. History is owned by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub text: String,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: Role::User, text: text.into() }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self { role: Role::Assistant, text: text.into() }
    }

    pub(crate) fn to_message(&self) -> ChatMessage {
        match self.role {
            Role::User => ChatMessage::user(self.text.clone()),
            Role::Assistant => ChatMessage::assistant(self.text.clone()),
        }
    }
}

/// Which configured LLM to answer with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelChoice {
    /// Low-latency model.
    #[default]
    Fast,
    /// Higher-quality model.
    Thorough,
}

impl ModelChoice {
    /// `Thorough` when `smart` is set, `Fast` otherwise.
    pub fn from_smart(smart: bool) -> Self {
        if smart {
            Self::Thorough
        } else {
            Self::Fast
        }
    }
}

/// Model identifiers for each `ModelChoice`.
#[derive(Debug, Clone)]
pub struct ModelIds {
    pub fast: String,
    pub thorough: String,
}

impl ModelIds {
    pub fn from_settings(settings: &LlmSettings) -> Self {
        Self {
            fast: settings.fast_model.clone(),
            thorough: settings.thorough_model.clone(),
        }
    }

    pub fn resolve(&self, choice: ModelChoice) -> &str {
        match choice {
            ModelChoice::Fast => &self.fast,
            ModelChoice::Thorough => &self.thorough,
        }
    }
}

/// A chunk selected as evidence, with its 1-based rank.
#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    pub chunk: DocumentChunk,
    pub rank: usize,
    pub score: f32,
}

impl RetrievedChunk {
    /// First characters of the chunk text, for display.
    pub fn preview(&self) -> String {
        let mut preview: String = self.chunk.text.chars().take(PREVIEW_CHARS).collect();
        if self.chunk.text.chars().count() > PREVIEW_CHARS {
            preview.push_str("...");
        }
        preview
    }
}

/// A grounded answer with the evidence it was built from.
#[derive(Debug, Clone)]
pub struct RagAnswer {
    /// The generated answer.
    pub answer: String,
    /// Evidence chunks in rank order.
    pub evidence: Vec<RetrievedChunk>,
    /// The question actually used for retrieval.
    pub standalone_question: String,
    /// Wall-clock time of rewrite, retrieval and synthesis.
    pub latency: Duration,
}

impl RagAnswer {
    /// Evidence filenames mentioned in the answer.
    pub fn cited_sources(&self) -> Vec<String> {
        cited_sources(&self.answer, &self.evidence)
    }

    /// Format the answer for display.
    pub fn format_for_display(&self) -> String {
        let mut output = self.answer.clone();

        if !self.evidence.is_empty() {
            output.push_str("\n\n--- Sources ---\n");
            for item in &self.evidence {
                output.push_str(&format!(
                    "\n[{}] {} (page {}, score: {:.2})\n  {}",
                    item.rank,
                    item.chunk.source,
                    item.chunk.page_label(),
                    item.score,
                    item.preview().replace('\n', " ")
                ));
            }
        }

        output.push_str(&format!("\n\nLatency: {:.2}s", self.latency.as_secs_f64()));
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evidence(text: &str, source: &str, page: Option<u32>) -> RetrievedChunk {
        RetrievedChunk {
            chunk: DocumentChunk::new(text.to_string(), source.to_string(), page),
            rank: 1,
            score: 0.75,
        }
    }

    #[test]
    fn test_model_choice_resolution() {
        let ids = ModelIds::from_settings(&LlmSettings::default());
        assert_eq!(ids.resolve(ModelChoice::from_smart(false)), "llama-3.1-8b-instant");
        assert_eq!(ids.resolve(ModelChoice::from_smart(true)), "llama-3.3-70b-versatile");
    }

    #[test]
    fn test_preview_is_truncated() {
        let long = evidence(&"x".repeat(400), "a.txt", None);
        assert_eq!(long.preview().chars().count(), PREVIEW_CHARS + 3);

        let short = evidence("short", "a.txt", None);
        assert_eq!(short.preview(), "short");
    }

    #[test]
    fn test_format_for_display() {
        let answer = RagAnswer {
            answer: "Revenue grew (report.pdf).".to_string(),
            evidence: vec![evidence("Revenue grew 10%.", "report.pdf", Some(2))],
            standalone_question: "How did revenue change?".to_string(),
            latency: Duration::from_millis(1234),
        };

        let display = answer.format_for_display();
        assert!(display.starts_with("Revenue grew (report.pdf)."));
        assert!(display.contains("[1] report.pdf (page 2, score: 0.75)"));
        assert!(display.contains("Latency: 1.23s"));
        assert_eq!(answer.cited_sources(), vec!["report.pdf"]);
    }
}
