//! Provider implementations for the LLM API wrapper
//!
//! - OpenAI-compatible API (OpenAI, and Ollama's `/v1` endpoint)
//! - Anthropic Messages API
//! - Gemini `generateContent`
//!
//! Each provider translates the shared `Context` (including image
//! attachments) into its native request format.

mod anthropic;
mod gemini;
mod openai;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use std::sync::OnceLock;

use crate::domain::config::AiConfig;
use crate::domain::types::ImageAttachment;
use crate::infrastructure::llm::{Context, Error, Provider, Response};

/// HTTP client reused across requests
fn http_client() -> &'static Client {
    static CLIENT: OnceLock<Client> = OnceLock::new();
    CLIENT.get_or_init(|| {
        Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .expect("Failed to create HTTP client")
    })
}

fn encode_image(image: &ImageAttachment) -> String {
    STANDARD.encode(&image.data)
}

/// Pulls `error.message` out of a JSON error body, falling back to the raw text.
fn error_from_body(provider: &str, status: reqwest::StatusCode, body: &str) -> Error {
    let detail = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| {
            json.get("error")
                .and_then(|e| e.get("message").or(Some(e)))
                .and_then(|m| m.as_str().map(str::to_string))
        })
        .unwrap_or_else(|| body.to_string());
    Error::new(provider, format!("HTTP {status}: {detail}"))
}

/// Configuration for a provider
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// API key (empty for Ollama)
    pub api_key: String,
    /// Base URL (for non-default endpoints)
    pub base_url: Option<String>,
    /// Default model
    pub default_model: String,
    /// Timeout in seconds
    pub timeout: Option<u64>,
}

impl ProviderConfig {
    pub fn from_ai_config(provider: Provider, config: &AiConfig) -> Result<Self, Error> {
        let require = |key: &Option<String>, var: &str| -> Result<String, Error> {
            key.clone()
                .filter(|k| !k.trim().is_empty())
                .ok_or_else(|| Error::new(provider.as_str(), format!("{var} is not set")))
        };

        let api_key = match provider {
            Provider::Ollama => String::new(),
            Provider::OpenAI => require(&config.openai_api_key, "OPENAI_API_KEY")?,
            Provider::Anthropic => require(&config.anthropic_api_key, "ANTHROPIC_API_KEY")?,
            Provider::Gemini => require(&config.gemini_api_key, "GEMINI_API_KEY")?,
        };

        let base_url = match (&config.endpoint, provider) {
            (Some(endpoint), _) => Some(endpoint.trim_end_matches('/').to_string()),
            (None, Provider::Ollama) => Some(format!(
                "{}/v1",
                config.ollama_api_base.trim_end_matches('/')
            )),
            (None, _) => None,
        };

        // "gemini/gemini-2.0-flash" style names carry a routing prefix.
        let prefix = format!("{}/", provider.as_str());
        let default_model = config
            .model
            .strip_prefix(&prefix)
            .unwrap_or(&config.model)
            .to_string();

        Ok(Self {
            api_key,
            base_url,
            default_model,
            timeout: Some(config.timeout),
        })
    }
}

/// Execute a chat request with the specified provider
pub async fn chat(
    provider: Provider,
    config: ProviderConfig,
    context: Context,
) -> Result<Response, Error> {
    match provider {
        Provider::OpenAI | Provider::Ollama => {
            openai::chat(provider.as_str(), config, context).await
        }
        Provider::Anthropic => anthropic::chat(config, context).await,
        Provider::Gemini => gemini::chat(config, context).await,
    }
}
