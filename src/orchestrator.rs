//! Sequential plan execution
//!
//! Entries run strictly one after another in plan order. A failing entry
//! (missing agent, language mismatch, `Err`, or panic) yields a failed
//! [`ExecutionResult`] and the plan carries on; `orchestrate` itself never
//! fails.

use crate::agents::{AgentRegistry, Diagnostic, ExecutionContext, ExecutionResult, ExternalContext};
use crate::agents::{Change, Severity};
use crate::routing::{AgentPlanEntry, DispatchPlan};
use crate::workspace::WorkspaceDescriptor;
use async_trait::async_trait;
use futures_util::FutureExt;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Optional sink notified after every successful entry
#[async_trait]
pub trait TaskTracker: Send + Sync {
    async fn record_completion(&self, agent_id: &str, result: &ExecutionResult) -> anyhow::Result<()>;
}

#[derive(Debug, Clone)]
pub struct OrchestrationRequest {
    pub workspace_path: PathBuf,
    pub metadata: WorkspaceDescriptor,
    pub plan: DispatchPlan,
    pub user_intent: String,
    pub external_context: Option<ExternalContext>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRun {
    pub agent_id: String,
    #[serde(flatten)]
    pub result: ExecutionResult,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrchestrationOutcome {
    pub results: Vec<AgentRun>,
    pub summary: String,
}

impl OrchestrationOutcome {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.result.success).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed() == 0
    }

    /// Diagnostics of every entry, prefixed with the agent id
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.results
            .iter()
            .flat_map(|run| {
                run.result.diagnostics.iter().map(move |d| Diagnostic {
                    message: format!("{}: {}", run.agent_id, d.message),
                    ..d.clone()
                })
            })
            .collect()
    }

    pub fn changes(&self) -> Vec<Change> {
        self.results
            .iter()
            .flat_map(|run| run.result.changes.iter().cloned())
            .collect()
    }
}

pub struct Orchestrator {
    agents: Arc<AgentRegistry>,
    tracker: Option<Arc<dyn TaskTracker>>,
}

impl Orchestrator {
    pub fn new(agents: Arc<AgentRegistry>) -> Self {
        Self {
            agents,
            tracker: None,
        }
    }

    pub fn with_tracker(mut self, tracker: Arc<dyn TaskTracker>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    #[instrument(skip(self, request), fields(entries = request.plan.agents.len()))]
    pub async fn orchestrate(&self, request: OrchestrationRequest) -> OrchestrationOutcome {
        let mut results = Vec::with_capacity(request.plan.agents.len());

        for entry in &request.plan.agents {
            let result = self.run_entry(entry, &request).await;
            if result.success {
                self.track(&entry.agent_id, &result).await;
            }
            results.push(AgentRun {
                agent_id: entry.agent_id.clone(),
                result,
            });
        }

        let ok = results.iter().filter(|r| r.result.success).count();
        let mut summary = format!("{}/{} agents succeeded", ok, results.len());
        if let Some(annotation) = request
            .external_context
            .as_ref()
            .and_then(ExternalContext::annotation)
        {
            summary.push_str("; ");
            summary.push_str(&annotation);
        }

        info!(%summary, "Orchestration finished");
        OrchestrationOutcome { results, summary }
    }

    async fn run_entry(&self, entry: &AgentPlanEntry, request: &OrchestrationRequest) -> ExecutionResult {
        let Some(agent) = self.agents.get(&entry.agent_id) else {
            warn!(agent = %entry.agent_id, "Agent not registered");
            return ExecutionResult::failure(Diagnostic::error(format!(
                "agent not found: {}",
                entry.agent_id
            )));
        };

        let language = request.metadata.language.as_str();
        if !agent.profile().supports_language(language) {
            info!(agent = %entry.agent_id, language, "Skipping agent for unsupported language");
            return ExecutionResult::failure(Diagnostic::new(
                Severity::Info,
                format!("unsupported language: {}", language),
            ));
        }

        let ctx = ExecutionContext {
            workspace_path: request.workspace_path.clone(),
            metadata: merged_metadata(&request.metadata, entry),
            user_intent: request.user_intent.clone(),
            external_context: request.external_context.clone(),
        };

        debug!(agent = %entry.agent_id, "Running agent");
        match AssertUnwindSafe(agent.run(&ctx)).catch_unwind().await {
            Ok(Ok(result)) => {
                debug!(agent = %entry.agent_id, success = result.success, "Agent finished");
                result
            }
            Ok(Err(e)) => {
                let message = format!("{:#}", e);
                error!(agent = %entry.agent_id, error = %message, "Agent failed");
                ExecutionResult::failure(Diagnostic::error(format!("execution failed: {}", message)))
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(agent = %entry.agent_id, panic = %message, "Agent panicked");
                ExecutionResult::failure(Diagnostic::error(format!("execution failed: {}", message)))
            }
        }
    }

    async fn track(&self, agent_id: &str, result: &ExecutionResult) {
        if let Some(tracker) = &self.tracker {
            if let Err(e) = tracker.record_completion(agent_id, result).await {
                warn!(agent = %agent_id, error = %e, "Task tracker failed, continuing");
            }
        }
    }
}

/// Descriptor fields overlaid with the entry config; the entry wins on conflicts.
fn merged_metadata(
    descriptor: &WorkspaceDescriptor,
    entry: &AgentPlanEntry,
) -> serde_json::Map<String, serde_json::Value> {
    let mut metadata = descriptor.to_metadata();
    for (key, value) in &entry.config {
        metadata.insert(key.clone(), value.clone());
    }
    metadata
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "agent panicked".to_string()
    }
}
