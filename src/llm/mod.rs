//! Chat model abstraction used by persona agents
//!
//! The routing core never talks to a model; only agents that opt in hold a
//! [`ChatClient`].

mod client;
mod error;
mod genai;
mod mock;
mod types;

pub use client::ChatClient;
pub use error::BackendError;
pub use self::genai::{GenAIChatClient, Provider};
pub use mock::MockChatClient;
pub use types::{ChatMessage, ChatOptions, ChatResponse, MessageRole};
