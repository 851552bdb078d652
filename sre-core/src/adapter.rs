//! # Model Adapters
//!
//! The reasoning loop only needs one thing from a language model: given the
//! goal and the current history, return raw text that should parse as a
//! step. Adapter failures are fatal to the run; the loop does not retry.

use crate::error::{Error, Result};
use crate::history::{History, HistoryEntry};
use crate::provider::{ChatMessage, CompletionRequest, LlmProvider};
use std::collections::VecDeque;
use tokio::sync::Mutex;

/// Contract the loop consumes from a language model
#[allow(async_fn_in_trait)]
pub trait ModelAdapter: Send + Sync {
    async fn generate(&self, prompt: &str, history: &History) -> Result<String>;
}

// ============================================================================
// Provider-backed adapter
// ============================================================================

/// Adapter over a chat-completion provider.
///
/// History is translated into role-tagged messages: setup notes become
/// `system` messages, the goal and observations are `user` messages, past
/// steps are `assistant` messages. The prompt is appended as the final
/// `user` message and JSON output is requested.
pub struct ProviderAdapter<P> {
    provider: P,
    system_prompt: String,
    model: Option<String>,
    temperature: Option<f32>,
}

impl<P: LlmProvider> ProviderAdapter<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            system_prompt: crate::prompt::SRE_SYSTEM_PROMPT.to_string(),
            model: None,
            temperature: None,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Model requested on each call: the override, else the provider default
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }

    /// Messages sent for one `generate` call
    pub fn build_messages(&self, prompt: &str, history: &History) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(&self.system_prompt));

        for entry in history.iter() {
            let message = match entry {
                HistoryEntry::SystemNote(note) => ChatMessage::system(note),
                HistoryEntry::Goal(goal) => ChatMessage::user(goal),
                HistoryEntry::Step(step) => ChatMessage::assistant(step.to_json()),
                HistoryEntry::Observation(obs) => ChatMessage::user(obs.text()),
            };
            messages.push(message);
        }

        messages.push(ChatMessage::user(prompt));
        messages
    }
}

impl<P: LlmProvider> ModelAdapter for ProviderAdapter<P> {
    async fn generate(&self, prompt: &str, history: &History) -> Result<String> {
        let mut request = CompletionRequest::new(self.build_messages(prompt, history))
            .with_json_output()
            .with_model(self.model());
        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }

        let response = self
            .provider
            .complete(request)
            .await
            .map_err(|e| {
                let err = e.into_error("adapter::generate");
                tracing::error!(
                    provider = self.provider.name(),
                    model = self.model(),
                    error = %err,
                    "model call failed"
                );
                err
            })?;

        tracing::debug!(
            model = %response.model,
            prompt_tokens = response.usage.prompt_tokens,
            completion_tokens = response.usage.completion_tokens,
            "model responded"
        );

        response
            .content
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| {
                Error::adapter_failed("model returned empty content")
                    .with_operation("adapter::generate")
                    .with_context("provider", self.provider.name().to_string())
            })
    }
}

// ============================================================================
// Scripted adapter
// ============================================================================

/// Replays a fixed queue of raw responses.
///
/// Used for tests and offline replays. Every call records the rendered
/// history it was given.
#[derive(Debug, Default)]
pub struct ScriptedModel {
    responses: Mutex<VecDeque<String>>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl ScriptedModel {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue another response
    pub async fn push_response(&self, response: impl Into<String>) {
        self.responses.lock().await.push_back(response.into());
    }

    pub async fn remaining(&self) -> usize {
        self.responses.lock().await.len()
    }

    /// Rendered history snapshot for every call so far
    pub async fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().await.clone()
    }
}

impl ModelAdapter for ScriptedModel {
    async fn generate(&self, _prompt: &str, history: &History) -> Result<String> {
        self.calls.lock().await.push(history.render());

        self.responses.lock().await.pop_front().ok_or_else(|| {
            Error::adapter_failed("no more responses configured for this script")
                .with_operation("scripted::generate")
                .permanent()
        })
    }
}
