//! OpenAI-compatible provider implementation
//!
//! Works with OpenRouter, OpenAI, vLLM, Ollama, and other OpenAI-compatible APIs.

use super::*;
use crate::error::{Error, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// OpenAI-compatible provider
pub struct OpenAIProvider {
    client: Client,
    config: ProviderConfig,
}

impl OpenAIProvider {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                Error::config_invalid("failed to create HTTP client")
                    .with_operation("provider::new")
                    .set_source(e)
            })?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn build_request(&self, request: &CompletionRequest) -> OpenAIRequest {
        OpenAIRequest {
            model: request
                .model
                .clone()
                .unwrap_or_else(|| self.config.default_model.clone()),
            messages: request.messages.iter().cloned().map(OpenAIMessage::from).collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            response_format: request.json_output.then(|| ResponseFormat {
                r#type: "json_object".into(),
            }),
        }
    }
}

impl LlmProvider for OpenAIProvider {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }

    async fn complete(&self, request: CompletionRequest) -> std::result::Result<CompletionResponse, ProviderError> {
        let api_request = self.build_request(&request);

        let mut req = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url.trim_end_matches('/')))
            .json(&api_request);

        if let Some(api_key) = &self.config.api_key {
            if !api_key.is_empty() {
                req = req.header("Authorization", format!("Bearer {}", api_key));
            }
        }

        for (key, value) in &self.config.headers {
            req = req.header(key, value);
        }

        tracing::debug!(
            provider = %self.config.name,
            model = %api_request.model,
            messages = api_request.messages.len(),
            "sending chat completion"
        );

        let response = req
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(status_error(status, text));
        }

        let api_response: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        into_completion(api_response)
    }
}

fn status_error(status: u16, message: String) -> ProviderError {
    match status {
        429 => ProviderError::RateLimited { retry_after: None },
        401 | 403 => ProviderError::AuthenticationFailed,
        _ => ProviderError::Api { status, message },
    }
}

fn into_completion(api_response: OpenAIResponse) -> std::result::Result<CompletionResponse, ProviderError> {
    let choice = api_response
        .choices
        .into_iter()
        .next()
        .ok_or(ProviderError::EmptyResponse)?;

    let finish_reason = match choice.finish_reason.as_deref() {
        Some("stop") => FinishReason::Stop,
        Some("length") => FinishReason::Length,
        Some("content_filter") => FinishReason::ContentFilter,
        _ => FinishReason::Unknown,
    };

    let usage = api_response
        .usage
        .map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        })
        .unwrap_or_default();

    Ok(CompletionResponse {
        id: api_response.id,
        model: api_response.model,
        content: choice.message.content,
        finish_reason,
        usage,
    })
}

// ============================================================================
// OpenAI API Types
// ============================================================================

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    r#type: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

impl From<ChatMessage> for OpenAIMessage {
    fn from(msg: ChatMessage) -> Self {
        Self {
            role: match msg.role {
                Role::System => "system".into(),
                Role::User => "user".into(),
                Role::Assistant => "assistant".into(),
            },
            content: msg.content,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    id: String,
    #[serde(default)]
    model: String,
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
    total_tokens: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn provider() -> OpenAIProvider {
        OpenAIProvider::new(ProviderConfig::openrouter("sk-or-test")).unwrap()
    }

    #[test]
    fn test_request_uses_default_model_and_json_mode() {
        let request = CompletionRequest::new(vec![
            ChatMessage::system("sys"),
            ChatMessage::user("goal"),
        ])
        .with_json_output();

        let body = serde_json::to_value(provider().build_request(&request)).unwrap();
        assert_eq!(body["model"], json!(OPENROUTER_DEFAULT_MODEL));
        assert_eq!(body["response_format"], json!({"type": "json_object"}));
        assert_eq!(body["messages"][0], json!({"role": "system", "content": "sys"}));
        assert!(body.get("temperature").is_none());
    }

    #[test]
    fn test_request_model_override() {
        let request = CompletionRequest::new(vec![ChatMessage::user("x")]).with_model("gpt-4o-mini");
        let body = serde_json::to_value(provider().build_request(&request)).unwrap();
        assert_eq!(body["model"], json!("gpt-4o-mini"));
        assert!(body.get("response_format").is_none());
    }

    #[test]
    fn test_response_parsing() {
        let raw = json!({
            "id": "gen-1",
            "model": "xiaomi/mimo-v2-flash:free",
            "choices": [{
                "message": { "role": "assistant", "content": "{\"thought\":\"t\",\"finalAnswer\":\"a\"}" },
                "finish_reason": "stop"
            }],
            "usage": { "prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15 }
        });

        let parsed: OpenAIResponse = serde_json::from_value(raw).unwrap();
        let response = into_completion(parsed).unwrap();
        assert_eq!(response.finish_reason, FinishReason::Stop);
        assert_eq!(response.usage.total_tokens, 15);
        assert!(response.content.unwrap().contains("finalAnswer"));
    }

    #[test]
    fn test_empty_choices_is_an_error() {
        let parsed: OpenAIResponse = serde_json::from_value(json!({"choices": []})).unwrap();
        assert!(matches!(into_completion(parsed), Err(ProviderError::EmptyResponse)));
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(status_error(429, String::new()), ProviderError::RateLimited { .. }));
        assert!(matches!(status_error(401, String::new()), ProviderError::AuthenticationFailed));
        assert!(matches!(
            status_error(502, "bad gateway".into()),
            ProviderError::Api { status: 502, .. }
        ));
    }
}
