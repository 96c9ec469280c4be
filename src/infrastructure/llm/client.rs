//! # LLM Client
//!
//! Provides the `Client` struct, the `LlmProvider` the commands talk to.
//! It resolves the configured provider, wraps the call in the retry policy
//! and returns the raw answer text.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::config::AiConfig;
use crate::domain::error::{AlfredError, Result};
use crate::domain::traits::LlmProvider;
use crate::domain::types::AgentInstruction;
use crate::infrastructure::llm::providers::{self, ProviderConfig};
use crate::infrastructure::llm::retry::RetryPolicy;
use crate::infrastructure::llm::{Context, Message, Provider};
use crate::strings::prompts;

pub struct Client {
    config: AiConfig,
    retry: RetryPolicy,
}

impl Client {
    /// Create a new client from the AI section of the configuration
    pub fn new(config: AiConfig) -> Self {
        let retry = RetryPolicy::new(config.retries, Duration::from_secs(1));
        Self { config, retry }
    }

    /// Persona system message, then the prompt with its images.
    fn context(&self, model: &str, instruction: &AgentInstruction) -> Context {
        Context::new()
            .with_model(model)
            .with_temperature(self.config.temperature)
            .add_system_message(prompts::system_prompt(instruction.persona.as_str()))
            .add_message(
                Message::user(instruction.prompt.clone()).with_images(instruction.images.clone()),
            )
    }

    fn provider(&self) -> Result<Provider> {
        Provider::from_str(&self.config.provider).ok_or_else(|| {
            AlfredError::provider(
                &self.config.provider,
                "Unknown provider (expected ollama, openai, anthropic or gemini)",
            )
        })
    }
}

#[async_trait]
impl LlmProvider for Client {
    async fn complete(&self, instruction: &AgentInstruction) -> Result<String> {
        let provider = self.provider()?;
        let provider_config = ProviderConfig::from_ai_config(provider, &self.config)?;

        let context = self.context(&provider_config.default_model, instruction);

        tracing::info!(
            "Asking {} ({}) as {} persona with {} image(s)",
            provider.as_str(),
            provider_config.default_model,
            instruction.persona.as_str(),
            instruction.images.len()
        );

        let response = self
            .retry
            .execute(
                || providers::chat(provider, provider_config.clone(), context.clone()),
                provider.as_str(),
            )
            .await?;

        tracing::info!(
            "Response from {}: {} prompt / {} completion tokens",
            response.model,
            response.usage.prompt_tokens,
            response.usage.completion_tokens
        );
        tracing::debug!("Raw response: {}", response.content);

        Ok(response.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{ImageAttachment, Persona};
    use crate::infrastructure::llm::MessageRole;

    #[test]
    fn test_provider_from_str() {
        assert_eq!(Provider::from_str("ollama"), Some(Provider::Ollama));
        assert_eq!(Provider::from_str("OpenAI"), Some(Provider::OpenAI));
        assert_eq!(Provider::from_str("claude"), Some(Provider::Anthropic));
        assert_eq!(Provider::from_str("google"), Some(Provider::Gemini));
        assert_eq!(Provider::from_str("unknown"), None);
    }

    #[test]
    fn test_context_leads_with_persona_system_message() {
        let client = Client::new(AiConfig::default());
        let image = ImageAttachment {
            file_name: "a.png".into(),
            mime_type: "image/png",
            data: vec![1],
        };
        let instruction =
            AgentInstruction::new(Persona::Rename, "name these").with_images(vec![image]);
        let context = client.context("qwen3:4b", &instruction);

        assert_eq!(context.model.as_deref(), Some("qwen3:4b"));
        assert_eq!(context.temperature, Some(0.2));
        assert_eq!(context.messages.len(), 2);
        assert_eq!(context.messages[0].role, MessageRole::System);
        assert!(context.messages[0].content.contains("rename persona"));
        assert_eq!(context.messages[1].role, MessageRole::User);
        assert_eq!(context.messages[1].content, "name these");
        assert_eq!(context.messages[1].images.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_provider_is_a_provider_error() {
        let client = Client::new(AiConfig {
            provider: "mystery".into(),
            ..AiConfig::default()
        });
        let err = client
            .complete(&AgentInstruction::new(Persona::Summarize, "hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, AlfredError::Provider { provider, .. } if provider == "mystery"));
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_any_request() {
        let client = Client::new(AiConfig {
            provider: "openai".into(),
            ..AiConfig::default()
        });
        let err = client
            .complete(&AgentInstruction::new(Persona::Summarize, "hi"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "[openai] OPENAI_API_KEY is not set");
    }
}
