//! Follow-up question rewriting.

use super::{ConversationTurn, ModelChoice, ModelIds};
use crate::config::Prompts;
use crate::error::Result;
use crate::llm::{ChatMessage, ChatModel};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Turns a question that depends on chat history into a standalone one.
pub struct QueryRewriter {
    chat: Arc<dyn ChatModel>,
    models: ModelIds,
    prompts: Prompts,
}

impl QueryRewriter {
    pub fn new(chat: Arc<dyn ChatModel>, models: ModelIds, prompts: Prompts) -> Self {
        Self { chat, models, prompts }
    }

    /// Rewrite `question` so it can be understood without `history`.
    ///
    /// With no history the question is returned as is and no LLM call is made.
    /// A blank model reply also falls back to the original question.
    #[instrument(skip(self, history), fields(turns = history.len()))]
    pub async fn rewrite(
        &self,
        history: &[ConversationTurn],
        question: &str,
        model: ModelChoice,
    ) -> Result<String> {
        if history.is_empty() {
            return Ok(question.to_string());
        }

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(
            self.prompts
                .render_with_custom(&self.prompts.rag.rewrite_system, &Default::default()),
        ));
        messages.extend(history.iter().map(ConversationTurn::to_message));
        messages.push(ChatMessage::user(question));

        let reply = self
            .chat
            .complete(self.models.resolve(model), &messages)
            .await?;
        let rewritten = reply.trim();

        if rewritten.is_empty() {
            return Ok(question.to_string());
        }

        debug!("Rewrote {:?} as {:?}", question, rewritten);
        Ok(rewritten.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LlmSettings;
    use crate::llm::MessageRole;
    use crate::testing::ScriptedChatModel;

    fn rewriter(chat: Arc<ScriptedChatModel>) -> QueryRewriter {
        QueryRewriter::new(
            chat,
            ModelIds::from_settings(&LlmSettings::default()),
            Prompts::default(),
        )
    }

    #[tokio::test]
    async fn test_empty_history_is_identity_without_llm_call() {
        let chat = Arc::new(ScriptedChatModel::new("should not be used"));
        let result = rewriter(chat.clone())
            .rewrite(&[], "What is the refund policy?", ModelChoice::Fast)
            .await
            .unwrap();

        assert_eq!(result, "What is the refund policy?");
        assert_eq!(chat.call_count(), 0);
    }

    #[tokio::test]
    async fn test_history_is_sent_in_order() {
        let chat = Arc::new(
            ScriptedChatModel::new("").with_replies(&["  What is the Q3 revenue of Acme?  "]),
        );
        let history = vec![
            ConversationTurn::user("Tell me about Acme."),
            ConversationTurn::assistant("Acme is a widget maker."),
        ];

        let result = rewriter(chat.clone())
            .rewrite(&history, "What about its Q3 revenue?", ModelChoice::Thorough)
            .await
            .unwrap();
        assert_eq!(result, "What is the Q3 revenue of Acme?");

        let calls = chat.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].model, "llama-3.3-70b-versatile");

        let roles: Vec<MessageRole> = calls[0].messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![MessageRole::System, MessageRole::User, MessageRole::Assistant, MessageRole::User]
        );
        assert_eq!(calls[0].messages[3].content, "What about its Q3 revenue?");
    }

    #[tokio::test]
    async fn test_blank_reply_falls_back_to_question() {
        let chat = Arc::new(ScriptedChatModel::new("   "));
        let history = vec![ConversationTurn::user("hi")];

        let result = rewriter(chat)
            .rewrite(&history, "and then?", ModelChoice::Fast)
            .await
            .unwrap();
        assert_eq!(result, "and then?");
    }
}
