use super::{Agent, AgentProfile, Diagnostic, ExecutionContext, ExecutionResult};
use crate::phase::{Phase, PhaseClassifier, PhaseHints};
use async_trait::async_trait;
use tracing::{debug, warn};

pub const PHASE_AUDIT_AGENT_ID: &str = "phase-audit";

const WARNING_PREFIX: &str = "warning: ";

/// Reports the workspace lifecycle phase and the gaps that hold it back.
///
/// A `phase` string in the context metadata forces the verdict the same way
/// [`PhaseHints`] does.
pub struct PhaseAuditAgent {
    profile: AgentProfile,
    classifier: PhaseClassifier,
}

impl PhaseAuditAgent {
    pub fn new(classifier: PhaseClassifier) -> Self {
        let profile = AgentProfile::new(
            PHASE_AUDIT_AGENT_ID,
            "Assesses project maturity and release readiness",
        )
        .with_keywords([
            "phase",
            "maturity",
            "readiness",
            "ship",
            "release",
            "audit",
            "launch",
            "production ready",
        ]);

        Self {
            profile,
            classifier,
        }
    }

    fn hints(ctx: &ExecutionContext) -> Option<PhaseHints> {
        let raw = ctx.metadata_str("phase")?;
        match raw.parse::<Phase>() {
            Ok(phase) => Some(PhaseHints::force(phase)),
            Err(e) => {
                warn!(value = raw, error = %e, "Ignoring unparseable phase hint");
                None
            }
        }
    }
}

impl Default for PhaseAuditAgent {
    fn default() -> Self {
        Self::new(PhaseClassifier::default())
    }
}

#[async_trait]
impl Agent for PhaseAuditAgent {
    fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    async fn run(&self, ctx: &ExecutionContext) -> anyhow::Result<ExecutionResult> {
        let hints = Self::hints(ctx);
        let verdict = self
            .classifier
            .detect_phase(&ctx.workspace_path, hints.as_ref())?;

        debug!(phase = %verdict.phase, recommendations = verdict.recommendations.len(), "Phase audit complete");

        let mut result = ExecutionResult::success(format!(
            "phase: {} (confidence {:.2})",
            verdict.phase, verdict.confidence
        ));
        for recommendation in &verdict.recommendations {
            let diagnostic = match recommendation.strip_prefix(WARNING_PREFIX) {
                Some(message) => Diagnostic::warning(message),
                None => Diagnostic::info(recommendation.as_str()),
            };
            result = result.with_diagnostic(diagnostic);
        }
        Ok(result)
    }
}
