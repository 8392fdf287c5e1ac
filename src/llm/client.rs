use super::error::BackendError;
use super::types::{ChatMessage, ChatOptions, ChatResponse};
use async_trait::async_trait;

/// Single-turn chat completion against some model backend
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        options: &ChatOptions,
    ) -> Result<ChatResponse, BackendError>;

    fn name(&self) -> &str;
}
