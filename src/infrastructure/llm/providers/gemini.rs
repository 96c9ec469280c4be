//! Gemini provider
//!
//! Calls `models/{model}:generateContent`. Images travel as `inline_data`
//! parts; system text goes to `system_instruction`.

use serde::{Deserialize, Serialize};

use super::{ProviderConfig, encode_image, error_from_body, http_client};
use crate::infrastructure::llm::{Context, Error, MessageRole, Response, TokenUsage};

/// Gemini API request format
#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

/// Gemini content (message)
#[derive(Debug, Serialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<GeminiPart>,
}

/// Gemini content part
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiPart {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

/// Generation configuration
#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

/// Gemini API response format
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<GeminiUsage>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    #[serde(default)]
    text: Option<String>,
}

/// Gemini usage metadata
#[derive(Debug, Deserialize)]
struct GeminiUsage {
    #[serde(rename = "promptTokenCount", default)]
    prompt_token_count: u32,
    #[serde(rename = "candidatesTokenCount", default)]
    candidates_token_count: u32,
}

fn build_request(context: Context) -> GeminiRequest {
    let mut system_parts = Vec::new();
    let mut contents = Vec::new();

    for msg in context.messages {
        if msg.role == MessageRole::System {
            system_parts.push(GeminiPart::Text { text: msg.content });
            continue;
        }

        let mut parts = vec![GeminiPart::Text { text: msg.content }];
        parts.extend(msg.images.iter().map(|image| GeminiPart::InlineData {
            inline_data: InlineData {
                mime_type: image.mime_type.to_string(),
                data: encode_image(image),
            },
        }));
        contents.push(GeminiContent {
            role: Some("user".to_string()),
            parts,
        });
    }

    let generation_config = (context.temperature.is_some() || context.max_tokens.is_some())
        .then_some(GenerationConfig {
            temperature: context.temperature,
            max_output_tokens: context.max_tokens,
        });

    GeminiRequest {
        contents,
        system_instruction: (!system_parts.is_empty()).then_some(GeminiContent {
            role: None,
            parts: system_parts,
        }),
        generation_config,
    }
}

/// Execute a chat request using Gemini's API
pub async fn chat(config: ProviderConfig, context: Context) -> Result<Response, Error> {
    let base_url = config
        .base_url
        .unwrap_or_else(|| "https://generativelanguage.googleapis.com".to_string());
    let model = context.model.clone().unwrap_or_else(|| {
        if config.default_model.is_empty() {
            "gemini-2.0-flash".to_string()
        } else {
            config.default_model.clone()
        }
    });

    let url = format!("{}/v1beta/models/{}:generateContent", base_url, model);
    let request = build_request(context);

    let mut request_builder = http_client()
        .post(&url)
        .query(&[("key", config.api_key.as_str())])
        .header("Content-Type", "application/json")
        .json(&request);

    if let Some(timeout_secs) = config.timeout {
        request_builder = request_builder.timeout(std::time::Duration::from_secs(timeout_secs));
    }

    let response = request_builder
        .send()
        .await
        .map_err(|e| Error::from_http("gemini", e))?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error response".to_string());
        return Err(error_from_body("gemini", status, &error_text));
    }

    let gemini_response: GeminiResponse = response
        .json()
        .await
        .map_err(|e| Error::new("gemini", format!("Failed to parse response: {}", e)))?;

    let content: String = gemini_response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if content.is_empty() {
        return Err(Error::new("gemini", "No candidates in response"));
    }

    let usage = gemini_response
        .usage_metadata
        .map(|u| TokenUsage {
            prompt_tokens: u.prompt_token_count,
            completion_tokens: u.candidates_token_count,
        })
        .unwrap_or_default();

    Ok(Response {
        content,
        model,
        usage,
    })
}
