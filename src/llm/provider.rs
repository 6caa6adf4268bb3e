use async_trait::async_trait;

use crate::errors::PilotResult;
use crate::llm::types::{CallConfig, ChatMessage, LlmResponse};

/// Chat-completions backend. New backends implement this trait and get an
/// entry under `[llm.providers.*]` in config.toml.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Returns the provider's identifier (matches config.toml key).
    fn name(&self) -> &str;

    /// Sends the full conversation and returns the assistant reply.
    async fn chat(&self, messages: &[ChatMessage], cfg: &CallConfig) -> PilotResult<LlmResponse>;
}
