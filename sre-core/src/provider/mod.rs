//! # LLM Provider Interface
//!
//! Trait-based abstraction over chat-completion backends.
//!
//! ## Design
//! - `LlmProvider` trait defines the request/response contract
//! - `OpenAIProvider` speaks the OpenAI-compatible wire format (OpenAI,
//!   OpenRouter, vLLM, Ollama)
//! - Provider failures are `ProviderError`s; the adapter layer turns them
//!   into workspace errors

pub mod openai;

pub use openai::OpenAIProvider;

use crate::error::{Error, ErrorKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// Core Types
// ============================================================================

/// A chat message in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: Option<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: Some(content.into()),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Some(content.into()),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: Some(content.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Request parameters for a completion
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<usize>,
    /// Ask the backend for a JSON object response
    pub json_output: bool,
}

impl CompletionRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn with_max_tokens(mut self, max: usize) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn with_json_output(mut self) -> Self {
        self.json_output = true;
        self
    }
}

/// Response from a completion request
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub id: String,
    pub model: String,
    pub content: Option<String>,
    pub finish_reason: FinishReason,
    pub usage: Usage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    Unknown,
}

/// Token usage information
#[derive(Debug, Clone, Default)]
pub struct Usage {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
}

// ============================================================================
// Provider Trait
// ============================================================================

/// Error type for provider operations
#[derive(Debug)]
pub enum ProviderError {
    /// Network/connection error
    Network(String),
    /// API returned an error
    Api { status: u16, message: String },
    /// Failed to parse response
    Parse(String),
    /// Rate limited
    RateLimited { retry_after: Option<u64> },
    /// Authentication failed
    AuthenticationFailed,
    /// Response carried no usable choice
    EmptyResponse,
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network(e) => write!(f, "Network error: {}", e),
            Self::Api { status, message } => write!(f, "API error ({}): {}", status, message),
            Self::Parse(e) => write!(f, "Parse error: {}", e),
            Self::RateLimited { retry_after } => {
                write!(f, "Rate limited")?;
                if let Some(secs) = retry_after {
                    write!(f, " (retry after {}s)", secs)?;
                }
                Ok(())
            }
            Self::AuthenticationFailed => write!(f, "Authentication failed"),
            Self::EmptyResponse => write!(f, "Provider returned no choices"),
        }
    }
}

impl std::error::Error for ProviderError {}

impl ProviderError {
    /// Convert into the workspace error, keeping the provider error as source
    pub fn into_error(self, operation: &'static str) -> Error {
        let kind = match &self {
            Self::Network(_) => ErrorKind::NetworkFailed,
            Self::RateLimited { .. } => ErrorKind::RateLimited,
            Self::AuthenticationFailed => ErrorKind::AuthenticationFailed,
            Self::Parse(_) => ErrorKind::ParseFailed,
            Self::Api { .. } | Self::EmptyResponse => ErrorKind::AdapterFailed,
        };
        let mut err = Error::new(kind, self.to_string()).with_operation(operation);
        if let Self::Api { status, .. } = &self {
            err = err.with_context("status", status.to_string());
        }
        err.set_source(self)
    }
}

/// The main LLM provider trait
#[allow(async_fn_in_trait)]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name (e.g., "openai", "openrouter")
    fn name(&self) -> &str;

    /// Get the default model
    fn default_model(&self) -> &str;

    /// Send a completion request and get a full response
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError>;
}

// ============================================================================
// Provider Configuration
// ============================================================================

/// Configuration for creating providers
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub name: String,
    pub api_key: Option<String>,
    pub base_url: String,
    pub default_model: String,
    pub headers: HashMap<String, String>,
    pub timeout_secs: u64,
}

pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const OPENROUTER_DEFAULT_MODEL: &str = "xiaomi/mimo-v2-flash:free";

impl ProviderConfig {
    /// OpenRouter, the default live backend
    pub fn openrouter(api_key: impl Into<String>) -> Self {
        let mut headers = HashMap::new();
        headers.insert("HTTP-Referer".into(), "https://sre-reasoning-core.local".into());
        headers.insert("X-Title".into(), "SRE Reasoning Core".into());

        Self {
            name: "openrouter".into(),
            api_key: Some(api_key.into()),
            base_url: OPENROUTER_BASE_URL.into(),
            default_model: OPENROUTER_DEFAULT_MODEL.into(),
            headers,
            timeout_secs: 120,
        }
    }

    /// Any OpenAI-compatible endpoint (vLLM, Ollama, OpenAI itself)
    pub fn openai_compatible(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            name: "openai".into(),
            api_key,
            base_url: base_url.into(),
            default_model: "gpt-4o".into(),
            headers: HashMap::new(),
            timeout_secs: 120,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_message_constructors() {
        let sys = ChatMessage::system("You are a Senior SRE Agent");
        assert_eq!(sys.role, Role::System);
        assert_eq!(sys.content.as_deref(), Some("You are a Senior SRE Agent"));

        assert_eq!(ChatMessage::user("Hello").role, Role::User);
        assert_eq!(ChatMessage::assistant("{}").role, Role::Assistant);
    }

    #[test]
    fn test_completion_request_builder() {
        let request = CompletionRequest::new(vec![ChatMessage::user("Hello")])
            .with_model("gpt-4o")
            .with_temperature(0.2)
            .with_max_tokens(1000)
            .with_json_output();

        assert_eq!(request.model, Some("gpt-4o".into()));
        assert_eq!(request.temperature, Some(0.2));
        assert_eq!(request.max_tokens, Some(1000));
        assert!(request.json_output);
    }

    #[test]
    fn test_provider_config() {
        let config = ProviderConfig::openrouter("sk-or-test");
        assert_eq!(config.base_url, OPENROUTER_BASE_URL);
        assert_eq!(config.default_model, OPENROUTER_DEFAULT_MODEL);
        assert!(config.headers.contains_key("X-Title"));

        let config = ProviderConfig::openai_compatible("http://localhost:11434/v1", None)
            .with_model("llama3")
            .with_timeout(30);
        assert_eq!(config.default_model, "llama3");
        assert_eq!(config.timeout_secs, 30);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_provider_error_mapping() {
        let err = ProviderError::RateLimited { retry_after: Some(3) }.into_error("provider::complete");
        assert_eq!(err.kind(), ErrorKind::RateLimited);
        assert!(err.is_retryable());

        let err = ProviderError::AuthenticationFailed.into_error("provider::complete");
        assert_eq!(err.kind(), ErrorKind::AuthenticationFailed);
        assert!(!err.is_retryable());

        let err = ProviderError::Api { status: 500, message: "boom".into() }
            .into_error("provider::complete");
        assert_eq!(err.kind(), ErrorKind::AdapterFailed);
        assert!(err.context().iter().any(|(k, v)| *k == "status" && v == "500"));
        assert!(err.source_ref().is_some());

        let err = ProviderError::Parse("expected value".into()).into_error("provider::complete");
        assert_eq!(err.kind(), ErrorKind::ParseFailed);
        assert!(!err.is_retryable());
    }
}
