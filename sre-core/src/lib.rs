//! # SRE Reasoning Core
//!
//! The pieces the reasoning loop is built from.
//!
//! ## Core Concepts
//! - **Step**: one validated model output (thought + action or final answer)
//! - **Guardrail**: pre-execution blacklist check on tool arguments
//! - **Registry**: name-keyed lookup of executable tools
//! - **History**: append-only context fed back to the model every iteration
//! - **Adapter**: the contract the loop needs from a language model
//! - **Provider**: OpenAI-compatible chat-completion client (OpenRouter, OpenAI, local)

pub mod adapter;
pub mod error;
pub mod guardrail;
pub mod history;
pub mod prompt;
pub mod provider;
pub mod registry;
pub mod step;
pub mod tools;

pub use adapter::{ModelAdapter, ProviderAdapter, ScriptedModel};
pub use error::{Error, ErrorKind, ErrorStatus, Result};
pub use guardrail::Guardrail;
pub use history::{History, HistoryEntry, Observation, ObservationKind};
pub use prompt::SRE_SYSTEM_PROMPT;
pub use provider::{
    ChatMessage, CompletionRequest, CompletionResponse, FinishReason, LlmProvider,
    OpenAIProvider, ProviderConfig, ProviderError, Role, Usage,
};
pub use registry::{Registry, Tool};
pub use step::{Action, Step};
pub use tools::SimulatedBash;
