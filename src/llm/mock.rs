use super::client::ChatClient;
use super::error::BackendError;
use super::types::{ChatMessage, ChatOptions, ChatResponse};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

const MOCK_MODEL: &str = "mock-model";

/// Replays a scripted queue of responses and keeps every request it saw
pub struct MockChatClient {
    responses: Mutex<VecDeque<Result<String, BackendError>>>,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl MockChatClient {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let client = Self::new();
        for response in responses {
            client.add_response(response);
        }
        client
    }

    pub fn add_response(&self, content: impl Into<String>) {
        if let Ok(mut queue) = self.responses.lock() {
            queue.push_back(Ok(content.into()));
        }
    }

    pub fn add_error(&self, error: BackendError) {
        if let Ok(mut queue) = self.responses.lock() {
            queue.push_back(Err(error));
        }
    }

    pub fn remaining_responses(&self) -> usize {
        self.responses.lock().map(|q| q.len()).unwrap_or(0)
    }

    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl Default for MockChatClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatClient for MockChatClient {
    async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        _options: &ChatOptions,
    ) -> Result<ChatResponse, BackendError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(messages);
        }

        let next = self
            .responses
            .lock()
            .ok()
            .and_then(|mut queue| queue.pop_front())
            .ok_or_else(|| BackendError::Other {
                message: "MockChatClient: No more responses in queue".to_string(),
            })?;

        next.map(|content| ChatResponse::new(content, MOCK_MODEL))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

impl std::fmt::Debug for MockChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockChatClient")
            .field("remaining_responses", &self.remaining_responses())
            .finish()
    }
}
