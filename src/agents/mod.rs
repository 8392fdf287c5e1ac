//! Agents: units of work the orchestrator dispatches to
//!
//! An agent declares a static [`AgentProfile`] (routing keywords, supported
//! languages, capabilities) and an async `run` entry point. Returning `Err`
//! or panicking never aborts a plan; the orchestrator turns both into a
//! failed [`ExecutionResult`].

mod persona;
mod phase_audit;
mod registry;
mod result;

pub use persona::{PersonaAgent, PersonaDefinition};
pub use phase_audit::{PhaseAuditAgent, PHASE_AUDIT_AGENT_ID};
pub use registry::AgentRegistry;
pub use result::{Change, Diagnostic, ExecutionResult, Severity};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentProfile {
    pub id: String,
    pub description: String,
    /// Routing keywords; multi-word entries match as phrases
    pub keywords: Vec<String>,
    /// Empty means "any language"
    pub supported_languages: Vec<String>,
    pub capabilities: Vec<String>,
}

impl AgentProfile {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.supported_languages = languages.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capabilities = capabilities.into_iter().map(Into::into).collect();
        self
    }

    pub fn restricts_languages(&self) -> bool {
        !self.supported_languages.is_empty()
    }

    /// Case-insensitive membership in the declared language set.
    pub fn declares_language(&self, language: &str) -> bool {
        self.supported_languages
            .iter()
            .any(|l| l.eq_ignore_ascii_case(language))
    }

    /// True when the set is unrestricted or contains `language`.
    pub fn supports_language(&self, language: &str) -> bool {
        !self.restricts_languages() || self.declares_language(language)
    }
}

/// Out-of-band context a caller attaches to a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalContext {
    pub knowledge_base: Option<String>,
    #[serde(default)]
    pub snippets: Vec<String>,
}

impl ExternalContext {
    /// The knowledge base identifier, appended verbatim to run summaries
    pub fn annotation(&self) -> Option<String> {
        self.knowledge_base.clone()
    }
}

#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub workspace_path: PathBuf,
    /// Workspace descriptor fields overlaid with the plan entry's config
    pub metadata: Map<String, Value>,
    pub user_intent: String,
    pub external_context: Option<ExternalContext>,
}

impl ExecutionContext {
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }
}

#[async_trait]
pub trait Agent: Send + Sync {
    fn profile(&self) -> &AgentProfile;

    fn id(&self) -> &str {
        &self.profile().id
    }

    async fn run(&self, ctx: &ExecutionContext) -> anyhow::Result<ExecutionResult>;
}
