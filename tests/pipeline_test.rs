//! End-to-end pipeline runs with persona agents backed by a scripted model

mod support;

use async_trait::async_trait;
use pathfinder::agents::{
    ExecutionResult, ExternalContext, PersonaDefinition, Severity, PHASE_AUDIT_AGENT_ID,
};
use pathfinder::config::RouterConfig;
use pathfinder::history::JsonlRunHistory;
use pathfinder::llm::{BackendError, ChatClient, MessageRole, MockChatClient};
use pathfinder::orchestrator::TaskTracker;
use pathfinder::phase::Phase;
use pathfinder::pipeline::{Pipeline, PipelineRequest, SignalOverrides};
use pathfinder::routing::Route;
use std::sync::{Arc, Mutex};
use support::copy_fixture;
use tempfile::TempDir;

fn reviewer() -> PersonaDefinition {
    PersonaDefinition {
        id: "api-reviewer".to_string(),
        description: "Reviews HTTP APIs".to_string(),
        keywords: vec!["review".to_string(), "api".to_string()],
        languages: vec!["python".to_string()],
        capabilities: vec!["api".to_string()],
        persona: Some("You review Python web APIs.".to_string()),
        ..Default::default()
    }
}

fn config(state: &TempDir) -> RouterConfig {
    RouterConfig {
        telemetry_path: state.path().join("telemetry.jsonl"),
        history_path: state.path().join("history.jsonl"),
        agents: vec![reviewer()],
        ..Default::default()
    }
}

#[derive(Default)]
struct RecordingTracker {
    completed: Mutex<Vec<String>>,
}

#[async_trait]
impl TaskTracker for RecordingTracker {
    async fn record_completion(&self, agent_id: &str, _result: &ExecutionResult) -> anyhow::Result<()> {
        self.completed.lock().unwrap().push(agent_id.to_string());
        Ok(())
    }
}

#[tokio::test]
async fn test_persona_run_end_to_end() {
    let state = TempDir::new().unwrap();
    let workspace = copy_fixture("python-fastapi");
    let client = Arc::new(MockChatClient::with_responses([
        "Looks reasonable.\nwarning: no authentication on /items",
    ]));
    let pipeline = Pipeline::from_config_with_client(
        &config(&state),
        Some(client.clone() as Arc<dyn ChatClient>),
    );

    let mut request = PipelineRequest::new(workspace.path(), "review the api");
    request.external_context = Some(ExternalContext {
        knowledge_base: Some("team-wiki".to_string()),
        snippets: vec!["Prefer dependency injection".to_string()],
    });
    let outcome = pipeline.run(request).await.unwrap();

    assert_eq!(outcome.plan.agent_ids(), vec!["api-reviewer"]);
    assert_eq!(outcome.summary, "1/1 agents succeeded; team-wiki");
    assert_eq!(outcome.diagnostics.len(), 1);
    assert_eq!(outcome.diagnostics[0].severity, Severity::Warning);
    assert_eq!(
        outcome.diagnostics[0].message,
        "api-reviewer: no authentication on /items"
    );
    assert!(outcome.memory_reference.is_some());

    let requests = client.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0][0].role, MessageRole::System);
    assert!(requests[0][1].content.contains("Prefer dependency injection"));
    assert!(requests[0][1].content.contains("fastapi"));
}

#[tokio::test]
async fn test_failed_backend_is_isolated() {
    let state = TempDir::new().unwrap();
    let workspace = copy_fixture("python-fastapi");
    let client = Arc::new(MockChatClient::new());
    client.add_error(BackendError::TimeoutError { seconds: 5 });
    let pipeline = Pipeline::from_config_with_client(
        &config(&state),
        Some(client as Arc<dyn ChatClient>),
    );

    let outcome = pipeline
        .run(PipelineRequest::new(workspace.path(), "review the api before release"))
        .await
        .unwrap();

    assert_eq!(outcome.plan.agent_ids(), vec!["api-reviewer", PHASE_AUDIT_AGENT_ID]);
    assert_eq!(outcome.summary, "1/2 agents succeeded");
    assert_eq!(outcome.failed_entries(), 1);
    assert!(!outcome.results[0].result.success);
    assert!(outcome.results[0].result.diagnostics[0]
        .message
        .starts_with("execution failed: api-reviewer could not reach its model"));
    assert!(outcome.results[1].result.success);

    let runs = JsonlRunHistory::load(&state.path().join("history.jsonl")).unwrap();
    assert_eq!(runs.len(), 1);
    assert!(!runs[0].record.success);
}

#[tokio::test]
async fn test_language_mismatch_is_reported() {
    let state = TempDir::new().unwrap();
    let workspace = copy_fixture("go-gin");
    let pipeline = Pipeline::from_config_with_client(
        &config(&state),
        Some(Arc::new(MockChatClient::new()) as Arc<dyn ChatClient>),
    );

    let outcome = pipeline
        .run(PipelineRequest::new(workspace.path(), "review the api"))
        .await
        .unwrap();

    assert_eq!(outcome.summary, "0/1 agents succeeded");
    let diagnostic = &outcome.results[0].result.diagnostics[0];
    assert_eq!(diagnostic.severity, Severity::Info);
    assert_eq!(diagnostic.message, "unsupported language: go");
}

#[tokio::test]
async fn test_history_feeds_next_decision() {
    let state = TempDir::new().unwrap();
    let workspace = copy_fixture("python-fastapi");
    let pipeline = Pipeline::from_config_with_client(&config(&state), None);

    let first = pipeline
        .preview(&PipelineRequest::new(workspace.path(), "audit readiness"))
        .unwrap();
    assert_eq!(first.signals.historical_success_score, 0.5);

    pipeline
        .run(PipelineRequest::new(workspace.path(), "audit readiness"))
        .await
        .unwrap();

    let second = pipeline
        .preview(&PipelineRequest::new(workspace.path(), "audit readiness"))
        .unwrap();
    assert_eq!(second.signals.historical_success_score, 1.0);
    assert!(second.decision.score > first.decision.score);
}

#[tokio::test]
async fn test_overrides_and_phase_hint() {
    let state = TempDir::new().unwrap();
    let workspace = copy_fixture("python-fastapi");
    let pipeline = Pipeline::from_config_with_client(&config(&state), None);

    let mut request = PipelineRequest::new(workspace.path(), "phase audit");
    request.phase = Some(Phase::Ship);
    request.prompt_id = Some("fixed-id".to_string());
    request.signals = SignalOverrides {
        keywords_score: Some(1.0),
        profile_match_score: Some(1.0),
        historical_success_score: Some(1.0),
        complexity_estimate: Some(1.0),
    };

    let outcome = pipeline.run(request).await.unwrap();
    assert_eq!(outcome.decision.route, Route::CandidateAutoApply);
    assert_eq!(outcome.decision.score, 1.0);
    assert_eq!(outcome.decision.prompt_id, "fixed-id");
    assert_eq!(outcome.results[0].result.summary, "phase: ship (confidence 1.00)");
}

#[tokio::test]
async fn test_tracker_sees_successful_entries() {
    let state = TempDir::new().unwrap();
    let workspace = copy_fixture("python-fastapi");
    let tracker = Arc::new(RecordingTracker::default());
    let pipeline = Pipeline::from_config_with_client(
        &config(&state),
        Some(Arc::new(MockChatClient::with_responses(["fine"])) as Arc<dyn ChatClient>),
    )
    .with_tracker(tracker.clone());

    pipeline
        .run(PipelineRequest::new(workspace.path(), "review api readiness"))
        .await
        .unwrap();

    assert_eq!(
        *tracker.completed.lock().unwrap(),
        vec!["api-reviewer".to_string(), PHASE_AUDIT_AGENT_ID.to_string()]
    );
}
