//! `genai`-backed chat client
//!
//! Provider credentials and hosts come from the environment variables the
//! `genai` crate reads itself (`OPENAI_API_KEY`, `ANTHROPIC_API_KEY`,
//! `OLLAMA_HOST`, ...). `PATHFINDER_API_BASE_URL` routes every request to a
//! custom endpoint instead.

use super::client::ChatClient;
use super::error::BackendError;
use super::types::{ChatMessage, ChatOptions, ChatResponse, MessageRole};
use async_trait::async_trait;
use genai::adapter::AdapterKind;
use genai::chat::{
    ChatMessage as GenAIChatMessage, ChatOptions as GenAIChatOptions,
    ChatRequest as GenAIChatRequest,
};
use genai::resolver::{AuthData, Endpoint, ServiceTargetResolver};
use genai::{Client, ModelIden, ServiceTarget};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, error};

const API_BASE_URL_ENV: &str = "PATHFINDER_API_BASE_URL";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Ollama,
    OpenAI,
    Claude,
    Gemini,
    Grok,
    Groq,
}

impl Provider {
    pub fn adapter_kind(&self) -> AdapterKind {
        match self {
            Provider::Ollama => AdapterKind::Ollama,
            Provider::OpenAI => AdapterKind::OpenAI,
            Provider::Claude => AdapterKind::Anthropic,
            Provider::Gemini => AdapterKind::Gemini,
            Provider::Grok => AdapterKind::Xai,
            Provider::Groq => AdapterKind::Groq,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Ollama => "ollama",
            Provider::OpenAI => "openai",
            Provider::Claude => "claude",
            Provider::Gemini => "gemini",
            Provider::Grok => "grok",
            Provider::Groq => "groq",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(Provider::Ollama),
            "openai" => Ok(Provider::OpenAI),
            "claude" | "anthropic" => Ok(Provider::Claude),
            "gemini" => Ok(Provider::Gemini),
            "grok" | "xai" => Ok(Provider::Grok),
            "groq" => Ok(Provider::Groq),
            other => Err(format!(
                "Invalid provider: {}. Valid options: ollama, openai, claude, gemini, grok, groq",
                other
            )),
        }
    }
}

pub struct GenAIChatClient {
    client: Client,
    model: String,
    provider: Provider,
    timeout: Duration,
}

impl GenAIChatClient {
    pub fn new(provider: Provider, model: impl Into<String>, timeout: Duration) -> Self {
        let model = model.into();
        let client = match std::env::var(API_BASE_URL_ENV).ok() {
            Some(endpoint_url) => {
                debug!(provider = %provider, endpoint = %endpoint_url, "Using custom endpoint");
                Self::custom_endpoint_client(provider.adapter_kind(), model.clone(), endpoint_url)
            }
            None => Client::default(),
        };

        debug!(provider = %provider, model = %model, "Creating GenAI chat client");

        Self {
            client,
            model,
            provider,
            timeout,
        }
    }

    fn custom_endpoint_client(kind: AdapterKind, model: String, endpoint_url: String) -> Client {
        let resolver = ServiceTargetResolver::from_resolver_fn(
            move |_service_target: ServiceTarget| -> Result<ServiceTarget, genai::resolver::Error> {
                let auth = match kind.default_key_env_name() {
                    Some(api_key_var) => AuthData::from_env(api_key_var),
                    None => AuthData::from_single(""),
                };

                Ok(ServiceTarget {
                    endpoint: Endpoint::from_owned(endpoint_url.clone()),
                    auth,
                    model: ModelIden::new(kind, &model),
                })
            },
        );

        Client::builder()
            .with_service_target_resolver(resolver)
            .build()
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn convert_message(msg: &ChatMessage) -> GenAIChatMessage {
        match msg.role {
            MessageRole::System => GenAIChatMessage::system(&msg.content),
            MessageRole::User => GenAIChatMessage::user(&msg.content),
            MessageRole::Assistant => GenAIChatMessage::assistant(&msg.content),
        }
    }
}

#[async_trait]
impl ChatClient for GenAIChatClient {
    async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        options: &ChatOptions,
    ) -> Result<ChatResponse, BackendError> {
        let request =
            GenAIChatRequest::new(messages.iter().map(Self::convert_message).collect());

        let mut genai_options = GenAIChatOptions::default();
        if let Some(temperature) = options.temperature {
            genai_options = genai_options.with_temperature(temperature as f64);
        }
        if let Some(max_tokens) = options.max_tokens {
            genai_options = genai_options.with_max_tokens(max_tokens);
        }

        let response = match tokio::time::timeout(
            self.timeout,
            self.client
                .exec_chat(&self.model, request, Some(&genai_options)),
        )
        .await
        {
            Ok(Ok(resp)) => resp,
            Ok(Err(e)) => {
                error!(provider = %self.provider, error = %e, "Chat request failed");
                return Err(BackendError::ApiError {
                    message: format!("{} request failed: {}", self.provider, e),
                    status_code: None,
                });
            }
            Err(_) => {
                error!(
                    provider = %self.provider,
                    timeout_secs = self.timeout.as_secs(),
                    "Chat request timed out"
                );
                return Err(BackendError::TimeoutError {
                    seconds: self.timeout.as_secs(),
                });
            }
        };

        let content = response.first_text().unwrap_or_default().to_string();
        if content.trim().is_empty() {
            return Err(BackendError::InvalidResponse {
                message: "empty completion".to_string(),
                raw_response: None,
            });
        }

        Ok(ChatResponse::new(content, self.model.clone()))
    }

    fn name(&self) -> &str {
        self.provider.as_str()
    }
}

impl fmt::Debug for GenAIChatClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenAIChatClient")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}
