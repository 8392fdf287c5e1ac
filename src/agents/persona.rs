use super::{Agent, AgentProfile, Diagnostic, ExecutionContext, ExecutionResult};
use crate::llm::{ChatClient, ChatMessage, ChatOptions};
use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// `[[agents]]` entry of the configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonaDefinition {
    pub id: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub languages: Vec<String>,
    pub capabilities: Vec<String>,
    /// Inline system prompt; takes precedence over `persona_file`
    pub persona: Option<String>,
    pub persona_file: Option<PathBuf>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl PersonaDefinition {
    pub fn profile(&self) -> AgentProfile {
        AgentProfile::new(self.id.clone(), self.description.clone())
            .with_keywords(self.keywords.iter().cloned())
            .with_languages(self.languages.iter().cloned())
            .with_capabilities(self.capabilities.iter().cloned())
    }

    /// Inline persona, else `persona_file` resolved against `base_dir`, else a
    /// prompt built from the description.
    pub fn resolve_persona(&self, base_dir: Option<&Path>) -> anyhow::Result<String> {
        if let Some(persona) = &self.persona {
            return Ok(persona.clone());
        }
        if let Some(file) = &self.persona_file {
            let path = match base_dir {
                Some(dir) if file.is_relative() => dir.join(file),
                _ => file.clone(),
            };
            return std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read persona file {}", path.display()));
        }
        Ok(format!(
            "You are the '{}' agent. {}",
            self.id, self.description
        ))
    }
}

/// Agent that answers by prompting a chat model with a configured persona
pub struct PersonaAgent {
    profile: AgentProfile,
    persona: String,
    client: Arc<dyn ChatClient>,
    options: ChatOptions,
}

impl PersonaAgent {
    pub fn new(profile: AgentProfile, persona: impl Into<String>, client: Arc<dyn ChatClient>) -> Self {
        Self {
            profile,
            persona: persona.into(),
            client,
            options: ChatOptions::default(),
        }
    }

    pub fn from_definition(
        definition: &PersonaDefinition,
        client: Arc<dyn ChatClient>,
        base_dir: Option<&Path>,
    ) -> anyhow::Result<Self> {
        if definition.id.trim().is_empty() {
            anyhow::bail!("persona agent definition is missing an id");
        }
        let persona = definition.resolve_persona(base_dir)?;
        Ok(Self {
            profile: definition.profile(),
            persona,
            client,
            options: ChatOptions {
                temperature: definition.temperature,
                max_tokens: definition.max_tokens,
            },
        })
    }

    fn build_messages(&self, ctx: &ExecutionContext) -> anyhow::Result<Vec<ChatMessage>> {
        let metadata = serde_json::to_string_pretty(&ctx.metadata)?;
        let mut prompt = format!(
            "Request: {}\n\nWorkspace: {}\nWorkspace metadata:\n{}\n",
            ctx.user_intent,
            ctx.workspace_path.display(),
            metadata
        );

        if let Some(external) = &ctx.external_context {
            if let Some(kb) = &external.knowledge_base {
                prompt.push_str(&format!("\nKnowledge base: {}\n", kb));
            }
            for snippet in &external.snippets {
                prompt.push_str(&format!("\n---\n{}\n", snippet));
            }
        }

        prompt.push_str(
            "\nAnswer concisely. Prefix lines that need attention with 'warning:' or 'error:'.",
        );

        Ok(vec![ChatMessage::system(&self.persona), ChatMessage::user(prompt)])
    }
}

/// Lines tagged `warning:` / `error:` become diagnostics of that severity.
fn tagged_diagnostics(content: &str) -> Vec<Diagnostic> {
    content
        .lines()
        .map(str::trim)
        .filter_map(|line| {
            let lower = line.to_lowercase();
            if lower.starts_with("warning:") {
                Some(Diagnostic::warning(tail(line, "warning:")))
            } else if lower.starts_with("error:") {
                Some(Diagnostic::error(tail(line, "error:")))
            } else {
                None
            }
        })
        .collect()
}

fn tail<'a>(line: &'a str, tag: &str) -> &'a str {
    line.get(tag.len()..).unwrap_or_default().trim()
}

#[async_trait]
impl Agent for PersonaAgent {
    fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    async fn run(&self, ctx: &ExecutionContext) -> anyhow::Result<ExecutionResult> {
        let messages = self.build_messages(ctx)?;
        debug!(agent = %self.profile.id, client = self.client.name(), "Prompting persona");

        let response = self
            .client
            .chat(messages, &self.options)
            .await
            .with_context(|| format!("{} could not reach its model", self.profile.id))?;

        info!(agent = %self.profile.id, model = %response.model, "Persona responded");

        let content = response.content.trim().to_string();
        let mut result = ExecutionResult::success(content.clone());
        result.diagnostics = tagged_diagnostics(&content);
        Ok(result)
    }
}
