//! Grounded answer generation.

use super::{ConversationTurn, ModelChoice, ModelIds, RetrievedChunk};
use crate::config::Prompts;
use crate::error::{DocBrainError, Result};
use crate::llm::{ChatMessage, ChatModel};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Produces answers restricted to the supplied evidence.
pub struct AnswerSynthesizer {
    chat: Arc<dyn ChatModel>,
    models: ModelIds,
    prompts: Prompts,
}

impl AnswerSynthesizer {
    pub fn new(chat: Arc<dyn ChatModel>, models: ModelIds, prompts: Prompts) -> Self {
        Self { chat, models, prompts }
    }

    /// The sentence returned when the evidence does not cover the question.
    pub fn refusal(&self) -> &str {
        self.prompts.rag.refusal.trim()
    }

    /// Render the evidence as the context block of the system prompt.
    pub fn format_context(&self, evidence: &[RetrievedChunk]) -> String {
        evidence
            .iter()
            .map(|item| {
                let mut vars = HashMap::new();
                vars.insert("source".to_string(), item.chunk.source.clone());
                vars.insert(
                    "page".to_string(),
                    item.chunk
                        .page
                        .map(|p| format!(" (page {})", p))
                        .unwrap_or_default(),
                );
                vars.insert("content".to_string(), item.chunk.text.clone());
                self.prompts.render_with_custom(&self.prompts.rag.document, &vars)
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Answer `question` from `evidence`, with `history` as conversational context.
    ///
    /// Empty evidence yields the refusal without calling the model. A reply that
    /// only refuses is reduced to exactly the refusal; partial answers are kept.
    #[instrument(skip(self, evidence, history), fields(evidence = evidence.len(), turns = history.len()))]
    pub async fn synthesize(
        &self,
        question: &str,
        evidence: &[RetrievedChunk],
        history: &[ConversationTurn],
        model: ModelChoice,
    ) -> Result<String> {
        let refusal = self.refusal();

        if evidence.is_empty() {
            info!("No evidence retrieved, refusing");
            return Ok(refusal.to_string());
        }

        let mut vars = HashMap::new();
        vars.insert("refusal".to_string(), refusal.to_string());
        vars.insert("context".to_string(), self.format_context(evidence));
        let system = self.prompts.render_with_custom(&self.prompts.rag.qa_system, &vars);

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(system));
        messages.extend(history.iter().map(ConversationTurn::to_message));
        messages.push(ChatMessage::user(question));

        let reply = self
            .chat
            .complete(self.models.resolve(model), &messages)
            .await?;
        let answer = reply.trim();

        if answer.is_empty() {
            return Err(DocBrainError::ExternalService(
                "Empty response from LLM".to_string(),
            ));
        }

        if is_refusal(answer, refusal, evidence) {
            debug!("Model refused, normalizing reply");
            return Ok(refusal.to_string());
        }

        Ok(answer.to_string())
    }
}

/// Longest leftover (preamble or sign-off) a refusal may carry and still count as one.
const MAX_REFUSAL_LEFTOVER_CHARS: usize = 120;

/// Whether `answer` is a bare refusal rather than a partial answer that also
/// mentions the refusal sentence.
///
/// A reply counts as a refusal when removing the sentence leaves only a short
/// leftover that cites none of the evidence.
fn is_refusal(answer: &str, refusal: &str, evidence: &[RetrievedChunk]) -> bool {
    if refusal.is_empty() || !answer.contains(refusal) {
        return false;
    }

    let leftover = answer.replacen(refusal, "", 1);
    let leftover = leftover
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, '"' | '\'' | '`' | '*'));

    leftover.is_empty()
        || (leftover.chars().count() <= MAX_REFUSAL_LEFTOVER_CHARS
            && cited_sources(leftover, evidence).is_empty())
}

/// Evidence filenames that appear in `answer`, in rank order without duplicates.
pub fn cited_sources(answer: &str, evidence: &[RetrievedChunk]) -> Vec<String> {
    let haystack = answer.to_lowercase();
    let mut cited: Vec<String> = Vec::new();

    for item in evidence {
        let source = &item.chunk.source;
        if !cited.contains(source) && haystack.contains(&source.to_lowercase()) {
            cited.push(source.clone());
        }
    }

    cited
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::DocumentChunk;
    use crate::config::LlmSettings;
    use crate::llm::MessageRole;
    use crate::testing::{FailingChatModel, ScriptedChatModel};

    const REFUSAL: &str = "I cannot find information about this topic in the uploaded documents.";

    fn synthesizer(chat: Arc<dyn ChatModel>) -> AnswerSynthesizer {
        AnswerSynthesizer::new(
            chat,
            ModelIds::from_settings(&LlmSettings::default()),
            Prompts::default(),
        )
    }

    fn evidence(text: &str, source: &str, page: Option<u32>, rank: usize) -> RetrievedChunk {
        RetrievedChunk {
            chunk: DocumentChunk::new(text.to_string(), source.to_string(), page),
            rank,
            score: 0.5,
        }
    }

    #[tokio::test]
    async fn test_empty_evidence_refuses_without_llm_call() {
        let chat = Arc::new(ScriptedChatModel::new("made up"));
        let answer = synthesizer(chat.clone())
            .synthesize("Who won the cup?", &[], &[], ModelChoice::Fast)
            .await
            .unwrap();

        assert_eq!(answer, REFUSAL);
        assert_eq!(chat.call_count(), 0);
    }

    #[tokio::test]
    async fn test_refusal_reply_is_normalized() {
        let chat = Arc::new(ScriptedChatModel::new(&format!("Sorry. {} Try another file.", REFUSAL)));
        let answer = synthesizer(chat)
            .synthesize(
                "Who won the cup?",
                &[evidence("Widgets cost $5.", "prices.txt", None, 1)],
                &[],
                ModelChoice::Fast,
            )
            .await
            .unwrap();

        assert_eq!(answer, REFUSAL);

        let quoted = Arc::new(ScriptedChatModel::new(&format!("\"{}\"", REFUSAL)));
        let answer = synthesizer(quoted)
            .synthesize(
                "Who won the cup?",
                &[evidence("Widgets cost $5.", "prices.txt", None, 1)],
                &[],
                ModelChoice::Fast,
            )
            .await
            .unwrap();
        assert_eq!(answer, REFUSAL);
    }

    #[tokio::test]
    async fn test_partial_answer_keeps_cited_facts() {
        let reply = format!(
            "Employees get 25 vacation days (handbook.txt). For the parking question: {}",
            REFUSAL
        );
        let chat = Arc::new(ScriptedChatModel::new(&reply));
        let answer = synthesizer(chat)
            .synthesize(
                "How many vacation days, and where do I park?",
                &[evidence("Employees get 25 vacation days.", "handbook.txt", None, 1)],
                &[],
                ModelChoice::Fast,
            )
            .await
            .unwrap();

        assert_eq!(answer, reply);
    }

    #[tokio::test]
    async fn test_evidence_text_reaches_model_verbatim() {
        let tricky = "use {{source}} and {{refusal}} in configs {{page}} {{context}}";
        let odd = "Price:\t$5  \n\n  indented line, ünïcödé {{ unclosed";

        for _ in 0..16 {
            let chat = Arc::new(ScriptedChatModel::new("See a.txt."));
            synthesizer(chat.clone())
                .synthesize(
                    "What goes in configs?",
                    &[
                        evidence(tricky, "a.txt", None, 1),
                        evidence(odd, "b.pdf", Some(2), 2),
                    ],
                    &[],
                    ModelChoice::Fast,
                )
                .await
                .unwrap();

            let system = &chat.calls()[0].messages[0].content;
            assert!(system.contains(&format!("Source: a.txt\nContent: {}", tricky)));
            assert!(system.contains(&format!("Source: b.pdf (page 2)\nContent: {}", odd)));
            assert_eq!(system.matches(REFUSAL).count(), 1);
        }
    }

    #[tokio::test]
    async fn test_prompt_carries_context_history_and_question() {
        let chat = Arc::new(ScriptedChatModel::new("Widgets cost $5 (prices.txt)."));
        let history = vec![
            ConversationTurn::user("Hi"),
            ConversationTurn::assistant("Hello"),
        ];

        let answer = synthesizer(chat.clone())
            .synthesize(
                "How much are widgets?",
                &[
                    evidence("Widgets cost $5.", "prices.txt", None, 1),
                    evidence("Gadgets cost $7.", "catalog.pdf", Some(4), 2),
                ],
                &history,
                ModelChoice::Fast,
            )
            .await
            .unwrap();
        assert_eq!(answer, "Widgets cost $5 (prices.txt).");

        let calls = chat.calls();
        assert_eq!(calls[0].model, "llama-3.1-8b-instant");

        let messages = &calls[0].messages;
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, MessageRole::System);
        assert!(messages[0].content.contains(REFUSAL));
        assert!(messages[0]
            .content
            .contains("Source: prices.txt\nContent: Widgets cost $5."));
        assert!(messages[0]
            .content
            .contains("Source: catalog.pdf (page 4)\nContent: Gadgets cost $7."));
        assert_eq!(messages[1].role, MessageRole::User);
        assert_eq!(messages[2].role, MessageRole::Assistant);
        assert_eq!(messages[3].content, "How much are widgets?");
    }

    #[tokio::test]
    async fn test_llm_failure_propagates() {
        let result = synthesizer(Arc::new(FailingChatModel))
            .synthesize("q", &[evidence("t", "a.txt", None, 1)], &[], ModelChoice::Thorough)
            .await;
        assert!(matches!(result, Err(DocBrainError::ExternalService(_))));
    }

    #[test]
    fn test_cited_sources() {
        let items = vec![
            evidence("a", "Report.pdf", Some(1), 1),
            evidence("b", "notes.txt", None, 2),
            evidence("c", "Report.pdf", Some(2), 3),
        ];

        assert_eq!(
            cited_sources("According to report.pdf, sales rose.", &items),
            vec!["Report.pdf"]
        );
        assert!(cited_sources(REFUSAL, &items).is_empty());
    }
}
