//! End-to-end request handling
//!
//! scan → route → estimate signals → fallback rules → orchestrate → record.
//! Only an invalid workspace path is fatal; everything downstream degrades
//! into data on the outcome.

use crate::agents::{
    AgentRegistry, Change, Diagnostic, ExternalContext, PersonaAgent, PhaseAuditAgent,
};
use crate::config::RouterConfig;
use crate::history::{JsonlRunHistory, RunHistory, RunRecord};
use crate::llm::{ChatClient, GenAIChatClient};
use crate::orchestrator::{AgentRun, OrchestrationRequest, Orchestrator, TaskTracker};
use crate::phase::{Phase, PhaseClassifier};
use crate::routing::{DispatchPlan, FallbackDecision, FallbackOptions, RouteRequest, Router};
use crate::scoring::ScoreSignals;
use crate::telemetry::{JsonlTelemetry, NoopTelemetry, TelemetrySink};
use crate::workspace::{ScanError, Scanner, WorkspaceDescriptor};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{info, warn};

/// Neutral prior used when neither the caller nor the run history has a value
const NEUTRAL_SIGNAL: f64 = 0.5;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Scan(#[from] ScanError),
}

/// Caller-provided signal values that replace the estimated ones
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalOverrides {
    pub keywords_score: Option<f64>,
    pub profile_match_score: Option<f64>,
    pub historical_success_score: Option<f64>,
    pub complexity_estimate: Option<f64>,
}

impl SignalOverrides {
    fn apply(&self, mut signals: ScoreSignals) -> ScoreSignals {
        if let Some(v) = self.keywords_score {
            signals.keywords_score = v;
        }
        if let Some(v) = self.profile_match_score {
            signals.profile_match_score = v;
        }
        if let Some(v) = self.historical_success_score {
            signals.historical_success_score = v;
        }
        if let Some(v) = self.complexity_estimate {
            signals.complexity_estimate = v;
        }
        signals
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineRequest {
    pub workspace_path: PathBuf,
    pub user_intent: String,
    pub max_agents: Option<usize>,
    pub signals: SignalOverrides,
    pub prompt_id: Option<String>,
    /// Forwarded to every plan entry as the `phase` config key
    pub phase: Option<Phase>,
    pub external_context: Option<ExternalContext>,
}

impl PipelineRequest {
    pub fn new(workspace_path: impl Into<PathBuf>, user_intent: impl Into<String>) -> Self {
        Self {
            workspace_path: workspace_path.into(),
            user_intent: user_intent.into(),
            ..Default::default()
        }
    }
}

/// Everything decided before any agent runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePreview {
    pub workspace: WorkspaceDescriptor,
    pub plan: DispatchPlan,
    pub signals: ScoreSignals,
    pub decision: FallbackDecision,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutcome {
    pub summary: String,
    pub diagnostics: Vec<Diagnostic>,
    pub changes: Vec<Change>,
    pub memory_reference: Option<String>,
    pub decision: FallbackDecision,
    pub plan: DispatchPlan,
    pub workspace: WorkspaceDescriptor,
    pub results: Vec<AgentRun>,
}

impl PipelineOutcome {
    pub fn failed_entries(&self) -> usize {
        self.results.iter().filter(|r| !r.result.success).count()
    }
}

pub struct Pipeline {
    scanner: Scanner,
    router: Router,
    orchestrator: Orchestrator,
    history: Option<Arc<dyn RunHistory>>,
}

impl Pipeline {
    pub fn new(scanner: Scanner, router: Router, orchestrator: Orchestrator) -> Self {
        Self {
            scanner,
            router,
            orchestrator,
            history: None,
        }
    }

    pub fn with_history(mut self, history: Arc<dyn RunHistory>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn with_tracker(mut self, tracker: Arc<dyn TaskTracker>) -> Self {
        self.orchestrator = self.orchestrator.with_tracker(tracker);
        self
    }

    /// Wires the default detectors, built-in and persona agents, telemetry
    /// and history from `config`. Persona agents talk to a `genai` client.
    pub fn from_config(config: &RouterConfig) -> Self {
        let client: Option<Arc<dyn ChatClient>> = if config.agents.is_empty() {
            None
        } else {
            Some(Arc::new(GenAIChatClient::new(
                config.llm.provider,
                config.llm.model.clone(),
                Duration::from_secs(config.llm.timeout_secs),
            )))
        };
        Self::from_config_with_client(config, client)
    }

    pub fn from_config_with_client(
        config: &RouterConfig,
        client: Option<Arc<dyn ChatClient>>,
    ) -> Self {
        let agents = Arc::new(build_agent_registry(config, client));

        let telemetry: Arc<dyn TelemetrySink> = if config.telemetry_enabled {
            Arc::new(JsonlTelemetry::open(&config.telemetry_path))
        } else {
            Arc::new(NoopTelemetry)
        };

        let router = Router::from_config(agents.clone(), config).with_telemetry(telemetry);
        let pipeline = Self::new(Scanner::new(), router, Orchestrator::new(agents));

        match JsonlRunHistory::open(&config.history_path) {
            Ok(history) => pipeline.with_history(Arc::new(history)),
            Err(e) => {
                warn!(
                    path = %config.history_path.display(),
                    error = %e,
                    "Run history unavailable, runs will not be recorded"
                );
                pipeline
            }
        }
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn scanner(&self) -> &Scanner {
        &self.scanner
    }

    /// Scans, plans and scores without running any agent.
    pub fn preview(&self, request: &PipelineRequest) -> Result<RoutePreview, PipelineError> {
        let workspace_path = canonical(&request.workspace_path);
        let workspace = self.scanner.scan(&workspace_path)?;

        let mut plan = self.router.route(&RouteRequest {
            metadata: workspace.clone(),
            user_intent: request.user_intent.clone(),
            max_agents: request.max_agents,
        });
        if let Some(phase) = request.phase {
            for entry in &mut plan.agents {
                entry.config.insert("phase".to_string(), json!(phase));
            }
        }

        let historical = self
            .history
            .as_ref()
            .and_then(|h| h.success_rate(&workspace_path))
            .unwrap_or(NEUTRAL_SIGNAL);
        let estimated =
            self.router
                .estimate_signals(&plan, &workspace, historical, NEUTRAL_SIGNAL);
        let signals = request.signals.apply(estimated);

        let decision = self.router.apply_fallback_rules(&FallbackOptions {
            signals,
            user_intent: request.user_intent.clone(),
            prompt_id: request.prompt_id.clone(),
        });

        Ok(RoutePreview {
            workspace,
            plan,
            signals,
            decision,
        })
    }

    pub async fn run(&self, request: PipelineRequest) -> Result<PipelineOutcome, PipelineError> {
        let start = Instant::now();
        let RoutePreview {
            workspace,
            plan,
            decision,
            ..
        } = self.preview(&request)?;
        let workspace_path = canonical(&request.workspace_path);

        let outcome = self
            .orchestrator
            .orchestrate(OrchestrationRequest {
                workspace_path: workspace_path.clone(),
                metadata: workspace.clone(),
                plan: plan.clone(),
                user_intent: request.user_intent.clone(),
                external_context: request.external_context.clone(),
            })
            .await;

        let memory_reference = self.history.as_ref().and_then(|history| {
            let record = RunRecord {
                workspace_path: workspace_path.clone(),
                agent_ids: plan.agents.iter().map(|e| e.agent_id.clone()).collect(),
                user_intent: request.user_intent.clone(),
                success: outcome.all_succeeded(),
                summary: outcome.summary.clone(),
            };
            match history.record(&record) {
                Ok(reference) => Some(reference),
                Err(e) => {
                    warn!(error = %e, "Failed to record run");
                    None
                }
            }
        });

        info!(
            route = %decision.route,
            summary = %outcome.summary,
            duration_ms = start.elapsed().as_millis() as u64,
            "Pipeline complete"
        );

        Ok(PipelineOutcome {
            summary: outcome.summary.clone(),
            diagnostics: outcome.diagnostics(),
            changes: outcome.changes(),
            memory_reference,
            decision,
            plan,
            workspace,
            results: outcome.results,
        })
    }
}

/// Built-in agents first, then `[[agents]]` personas in file order. A persona
/// that cannot be built is skipped with a warning.
pub fn build_agent_registry(
    config: &RouterConfig,
    client: Option<Arc<dyn ChatClient>>,
) -> AgentRegistry {
    let mut registry = AgentRegistry::new();
    registry.register(Arc::new(PhaseAuditAgent::new(PhaseClassifier::new(
        config.phase.clone(),
    ))));

    if config.agents.is_empty() {
        return registry;
    }
    let Some(client) = client else {
        warn!("Persona agents configured without a chat client, skipping them");
        return registry;
    };

    for definition in &config.agents {
        match PersonaAgent::from_definition(definition, client.clone(), config.base_dir()) {
            Ok(agent) => registry.register(Arc::new(agent)),
            Err(e) => {
                let message = format!("{:#}", e);
                warn!(agent = %definition.id, error = %message, "Skipping persona agent");
            }
        }
    }
    registry
}

fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
