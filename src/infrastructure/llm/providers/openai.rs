//! OpenAI-compatible API provider
//!
//! Serves OpenAI itself and Ollama's `/v1/chat/completions` endpoint.
//! Images go out as `image_url` parts holding base64 data URLs.

use serde::{Deserialize, Serialize};

use super::{ProviderConfig, encode_image, error_from_body, http_client};
use crate::infrastructure::llm::{Context, Error, Message, Response, TokenUsage};

/// OpenAI API request format
#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: String,
    content: OpenAIContent,
}

/// Plain text, or a list of parts when images are attached
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum OpenAIContent {
    Text(String),
    Parts(Vec<OpenAIPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum OpenAIPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

/// OpenAI API response format
#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    model: String,
    choices: Vec<OpenAIChoice>,
    #[serde(default)]
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

fn to_openai_message(msg: Message) -> OpenAIMessage {
    let content = if msg.images.is_empty() {
        OpenAIContent::Text(msg.content)
    } else {
        let mut parts = vec![OpenAIPart::Text { text: msg.content }];
        parts.extend(msg.images.iter().map(|image| OpenAIPart::ImageUrl {
            image_url: ImageUrl {
                url: format!("data:{};base64,{}", image.mime_type, encode_image(image)),
            },
        }));
        OpenAIContent::Parts(parts)
    };

    OpenAIMessage {
        role: msg.role.as_str().to_string(),
        content,
    }
}

fn build_request(model: String, context: Context) -> OpenAIRequest {
    OpenAIRequest {
        model,
        messages: context.messages.into_iter().map(to_openai_message).collect(),
        temperature: context.temperature,
        max_tokens: context.max_tokens,
        stream: false,
    }
}

/// Execute a chat request using an OpenAI-compatible API
pub async fn chat(provider: &str, config: ProviderConfig, context: Context) -> Result<Response, Error> {
    let base_url = config
        .base_url
        .unwrap_or_else(|| "https://api.openai.com/v1".to_string());
    let model = context.model.clone().unwrap_or_else(|| {
        if config.default_model.is_empty() {
            "gpt-4o-mini".to_string()
        } else {
            config.default_model.clone()
        }
    });

    let url = format!("{}/chat/completions", base_url);
    let request = build_request(model, context);

    let mut request_builder = http_client()
        .post(&url)
        .header("Content-Type", "application/json")
        .json(&request);

    if !config.api_key.is_empty() {
        request_builder = request_builder.bearer_auth(&config.api_key);
    }
    if let Some(timeout_secs) = config.timeout {
        request_builder = request_builder.timeout(std::time::Duration::from_secs(timeout_secs));
    }

    tracing::debug!("POST {url} (model {})", request.model);
    let response = request_builder
        .send()
        .await
        .map_err(|e| Error::from_http(provider, e))?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error response".to_string());
        return Err(error_from_body(provider, status, &error_text));
    }

    let openai_response: OpenAIResponse = response
        .json()
        .await
        .map_err(|e| Error::new(provider, format!("Failed to parse response: {}", e)))?;

    let content = openai_response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| Error::new(provider, "No choices in response"))?;

    let usage = openai_response
        .usage
        .map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
        })
        .unwrap_or_default();

    Ok(Response {
        content,
        model: openai_response.model,
        usage,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::ImageAttachment;

    #[test]
    fn test_text_only_message_is_a_string() {
        let context = Context::new()
            .with_temperature(0.2)
            .add_message(Message::user("hello"));
        let body = serde_json::to_value(build_request("qwen3:4b".into(), context)).unwrap();

        assert_eq!(body["model"], "qwen3:4b");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "hello");
        assert_eq!(body["stream"], false);
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn test_images_become_data_urls() {
        let image = ImageAttachment {
            file_name: "a.png".into(),
            mime_type: "image/png",
            data: vec![1, 2, 3],
        };
        let context = Context::new().add_message(Message::user("look").with_images(vec![image]));
        let body = serde_json::to_value(build_request("m".into(), context)).unwrap();

        let parts = &body["messages"][0]["content"];
        assert_eq!(parts[0]["type"], "text");
        assert_eq!(parts[0]["text"], "look");
        assert_eq!(parts[1]["type"], "image_url");
        assert_eq!(parts[1]["image_url"]["url"], "data:image/png;base64,AQID");
    }
}
