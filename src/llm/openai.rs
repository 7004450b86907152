//! OpenAI-compatible chat completions (Groq, OpenAI, local servers).

use super::{ChatMessage, ChatModel, MessageRole};
use crate::config::LlmSettings;
use crate::error::{DocBrainError, Result};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// Chat model backed by an OpenAI-compatible endpoint.
pub struct OpenAIChatModel {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    temperature: f32,
    /// Name of the unset credential variable; completions fail until it is provided.
    missing_key_env: Option<String>,
}

impl OpenAIChatModel {
    /// Create a chat model from settings.
    ///
    /// A missing API key does not fail construction, so commands that never
    /// reach the model (ingest, search, status) still work. `complete` reports it.
    pub fn from_settings(settings: &LlmSettings) -> Result<Self> {
        match settings.api_key() {
            Some(api_key) => Self::with_api_key(settings, &api_key),
            None => Ok(Self {
                client: create_client(
                    &settings.api_base,
                    None,
                    Duration::from_secs(settings.timeout_seconds),
                )?,
                temperature: settings.temperature,
                missing_key_env: Some(settings.api_key_env.clone()),
            }),
        }
    }

    /// Create a chat model with an explicit credential.
    pub fn with_api_key(settings: &LlmSettings, api_key: &str) -> Result<Self> {
        Ok(Self {
            client: create_client(
                &settings.api_base,
                Some(api_key),
                Duration::from_secs(settings.timeout_seconds),
            )?,
            temperature: settings.temperature,
            missing_key_env: None,
        })
    }

    fn to_request_message(message: &ChatMessage) -> Result<ChatCompletionRequestMessage> {
        let built: ChatCompletionRequestMessage = match message.role {
            MessageRole::System => ChatCompletionRequestSystemMessageArgs::default()
                .content(message.content.clone())
                .build()
                .map_err(|e| DocBrainError::ExternalService(e.to_string()))?
                .into(),
            MessageRole::User => ChatCompletionRequestUserMessageArgs::default()
                .content(message.content.clone())
                .build()
                .map_err(|e| DocBrainError::ExternalService(e.to_string()))?
                .into(),
            MessageRole::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                .content(message.content.clone())
                .build()
                .map_err(|e| DocBrainError::ExternalService(e.to_string()))?
                .into(),
        };
        Ok(built)
    }
}

#[async_trait]
impl ChatModel for OpenAIChatModel {
    #[instrument(skip(self, messages), fields(messages = messages.len()))]
    async fn complete(&self, model: &str, messages: &[ChatMessage]) -> Result<String> {
        if let Some(env) = &self.missing_key_env {
            return Err(DocBrainError::Config(format!(
                "{} not set. Set it with: export {}='...'",
                env, env
            )));
        }

        let request_messages = messages
            .iter()
            .map(Self::to_request_message)
            .collect::<Result<Vec<_>>>()?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(model)
            .messages(request_messages)
            .temperature(self.temperature)
            .build()
            .map_err(|e| DocBrainError::ExternalService(e.to_string()))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            DocBrainError::ExternalService(format!("Failed to generate response: {}", e))
        })?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| DocBrainError::ExternalService("Empty response from LLM".to_string()))?
            .clone();

        debug!("LLM returned {} characters", content.len());
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_api_key_is_config_error() {
        let settings = LlmSettings {
            api_key_env: "DOCBRAIN_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..LlmSettings::default()
        };
        let model = OpenAIChatModel::from_settings(&settings).unwrap();

        match model.complete("llama-3.1-8b-instant", &[ChatMessage::user("hi")]).await {
            Err(DocBrainError::Config(msg)) => assert!(msg.contains("DOCBRAIN_TEST_KEY_THAT_IS_NEVER_SET")),
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[test]
    fn test_message_conversion() {
        for message in [
            ChatMessage::system("rules"),
            ChatMessage::user("question"),
            ChatMessage::assistant("answer"),
        ] {
            assert!(OpenAIChatModel::to_request_message(&message).is_ok());
        }
    }
}
