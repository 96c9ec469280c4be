//! Anthropic (Claude) provider
//!
//! System messages move to the top-level `system` field; images become
//! base64 `image` blocks ahead of the prompt text.

use serde::{Deserialize, Serialize};

use super::{ProviderConfig, encode_image, error_from_body, http_client};
use crate::infrastructure::llm::{Context, Error, MessageRole, Response, TokenUsage};

const API_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Anthropic API request format
#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// Anthropic message format
#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: Vec<AnthropicContentBlock>,
}

/// Anthropic content block
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicContentBlock {
    Text { text: String },
    Image { source: ImageSource },
}

#[derive(Debug, Serialize)]
struct ImageSource {
    #[serde(rename = "type")]
    source_type: &'static str,
    media_type: String,
    data: String,
}

/// Anthropic API response format
#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    model: String,
    content: Vec<AnthropicResponseContent>,
    #[serde(default)]
    usage: Option<AnthropicUsage>,
}

/// Anthropic response content
#[derive(Debug, Deserialize)]
struct AnthropicResponseContent {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: Option<String>,
}

/// Anthropic usage information
#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

fn build_request(model: String, context: Context) -> AnthropicRequest {
    let mut system: Option<String> = None;
    let mut messages = Vec::new();

    for msg in context.messages {
        if msg.role == MessageRole::System {
            system = Some(match system {
                Some(existing) => format!("{existing}\n\n{}", msg.content),
                None => msg.content,
            });
            continue;
        }

        let mut content: Vec<AnthropicContentBlock> = msg
            .images
            .iter()
            .map(|image| AnthropicContentBlock::Image {
                source: ImageSource {
                    source_type: "base64",
                    media_type: image.mime_type.to_string(),
                    data: encode_image(image),
                },
            })
            .collect();
        content.push(AnthropicContentBlock::Text { text: msg.content });

        messages.push(AnthropicMessage {
            role: msg.role.as_str().to_string(),
            content,
        });
    }

    AnthropicRequest {
        model,
        max_tokens: context.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        messages,
        system,
        temperature: context.temperature,
    }
}

/// Execute a chat request using Anthropic's API
pub async fn chat(config: ProviderConfig, context: Context) -> Result<Response, Error> {
    let base_url = config
        .base_url
        .unwrap_or_else(|| "https://api.anthropic.com".to_string());
    let model = context.model.clone().unwrap_or_else(|| {
        if config.default_model.is_empty() {
            "claude-3-5-sonnet-20241022".to_string()
        } else {
            config.default_model.clone()
        }
    });

    let url = format!("{}/v1/messages", base_url);
    let request = build_request(model, context);

    let mut request_builder = http_client()
        .post(&url)
        .header("x-api-key", &config.api_key)
        .header("anthropic-version", API_VERSION)
        .header("Content-Type", "application/json")
        .json(&request);

    if let Some(timeout_secs) = config.timeout {
        request_builder = request_builder.timeout(std::time::Duration::from_secs(timeout_secs));
    }

    let response = request_builder
        .send()
        .await
        .map_err(|e| Error::from_http("anthropic", e))?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error response".to_string());
        return Err(error_from_body("anthropic", status, &error_text));
    }

    let anthropic_response: AnthropicResponse = response
        .json()
        .await
        .map_err(|e| Error::new("anthropic", format!("Failed to parse response: {}", e)))?;

    let content: String = anthropic_response
        .content
        .into_iter()
        .filter(|block| block.content_type == "text")
        .filter_map(|block| block.text)
        .collect::<Vec<_>>()
        .join("");

    if content.is_empty() {
        return Err(Error::new("anthropic", "No text content in response"));
    }

    let usage = anthropic_response
        .usage
        .map(|u| TokenUsage {
            prompt_tokens: u.input_tokens,
            completion_tokens: u.output_tokens,
        })
        .unwrap_or_default();

    Ok(Response {
        content,
        model: anthropic_response.model,
        usage,
    })
}
