//! pathfinder - local decision engine for routing work to specialized agents
//!
//! Given a workspace on disk and a natural-language request, pathfinder
//! describes the workspace, picks the agents best suited to the request,
//! scores how confident that choice is and runs the selected agents one after
//! another, collecting their results.
//!
//! # Core Concepts
//!
//! - **Detectors**: per-ecosystem probes that turn manifest files into
//!   language, framework, capability and signal tags
//! - **Workspace descriptor**: the merged, deterministic result of a scan
//! - **Phase**: `discovery`, `build` or `ship`, classified from cheap
//!   filesystem and history facts
//! - **Dispatch plan**: the ordered agents selected for a request
//! - **Route**: `candidate_auto_apply`, `fallback_llm` or `clarify_needed`,
//!   picked from a weighted confidence score
//!
//! # Example Usage
//!
//! ```no_run
//! use pathfinder::{Pipeline, PipelineRequest, RouterConfig};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = RouterConfig::load(None);
//! let pipeline = Pipeline::from_config(&config);
//!
//! let outcome = pipeline
//!     .run(PipelineRequest::new(".", "audit release readiness"))
//!     .await?;
//! println!("{} ({})", outcome.summary, outcome.decision.route);
//! # Ok(())
//! # }
//! ```
//!
//! # Project Structure
//!
//! - [`detectors`] and [`workspace`]: scanning
//! - [`phase`]: lifecycle classification
//! - [`scoring`], [`routing`] and [`telemetry`]: agent selection and route decisions
//! - [`agents`], [`llm`] and [`orchestrator`]: agent execution
//! - [`pipeline`] and [`history`]: the end-to-end flow and its run log

pub mod agents;
pub mod cli;
pub mod config;
pub mod detectors;
pub mod history;
pub mod llm;
pub mod orchestrator;
pub mod phase;
pub mod pipeline;
pub mod routing;
pub mod scoring;
pub mod telemetry;
pub mod util;
pub mod workspace;

pub use agents::{
    Agent, AgentProfile, AgentRegistry, Diagnostic, ExecutionContext, ExecutionResult,
    ExternalContext, PersonaAgent, PhaseAuditAgent, Severity,
};
pub use config::{ConfigError, RouterConfig};
pub use detectors::{Detector, DetectorRegistry, DetectorResult};
pub use history::{JsonlRunHistory, RunHistory, RunRecord};
pub use llm::{BackendError, ChatClient, GenAIChatClient, MockChatClient, Provider};
pub use orchestrator::{OrchestrationOutcome, OrchestrationRequest, Orchestrator, TaskTracker};
pub use phase::{Phase, PhaseClassifier, PhaseHints, PhaseSignals, PhaseVerdict};
pub use pipeline::{Pipeline, PipelineError, PipelineOutcome, PipelineRequest, RoutePreview};
pub use routing::{
    DispatchPlan, FallbackDecision, FallbackOptions, Route, RouteDecision, RouteRequest, Router,
};
pub use scoring::{ConfidenceLevel, ScoreSignals, ScoreWeights, ScoringEngine};
pub use telemetry::{JsonlTelemetry, NoopTelemetry, RouteTelemetryEvent, TelemetrySink};
pub use util::{init_default, init_from_env, init_logging, LoggingConfig};
pub use workspace::{ScanError, Scanner, WorkspaceDescriptor};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_name_is_pathfinder() {
        assert_eq!(NAME, "pathfinder");
    }
}
