//! Output formatting for multiple formats
//!
//! Every command result can be rendered as JSON, YAML or human-readable text.
//! JSON and YAML are plain serializations of the result types; the human
//! format is a compact report meant for terminals.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::agents::Severity;
use crate::config::RouterConfig;
use crate::phase::PhaseVerdict;
use crate::pipeline::{PipelineOutcome, RoutePreview};
use crate::routing::DispatchPlan;
use crate::workspace::WorkspaceDescriptor;

const RULE: &str = "\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// YAML format (human-friendly, version-control friendly)
    Yaml,
    /// Human-readable formatted text
    Human,
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn format_scan(&self, workspace: &WorkspaceDescriptor) -> Result<String> {
        self.render(workspace, "workspace descriptor", || human_workspace(workspace))
    }

    pub fn format_phase(&self, verdict: &PhaseVerdict) -> Result<String> {
        self.render(verdict, "phase verdict", || human_phase(verdict))
    }

    pub fn format_route(&self, preview: &RoutePreview) -> Result<String> {
        self.render(preview, "route preview", || human_route(preview))
    }

    pub fn format_run(&self, outcome: &PipelineOutcome) -> Result<String> {
        self.render(outcome, "pipeline outcome", || human_run(outcome))
    }

    pub fn format_config(&self, config: &RouterConfig) -> Result<String> {
        self.render(config, "configuration", || config.to_string())
    }

    fn render<T: Serialize>(
        &self,
        value: &T,
        what: &str,
        human: impl FnOnce() -> String,
    ) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(value)
                .with_context(|| format!("Failed to serialize {} to JSON", what)),
            OutputFormat::Yaml => serde_yaml::to_string(value)
                .with_context(|| format!("Failed to serialize {} to YAML", what)),
            OutputFormat::Human => Ok(human()),
        }
    }
}

fn join_or_none<'a>(items: impl IntoIterator<Item = &'a String>) -> String {
    let items: Vec<&str> = items.into_iter().map(String::as_str).collect();
    if items.is_empty() {
        "(none)".to_string()
    } else {
        items.join(", ")
    }
}

fn confidence_bar(confidence: f64) -> String {
    let filled = ((confidence.clamp(0.0, 1.0)) * 10.0) as usize;
    "\u{2588}".repeat(filled) + &"\u{2591}".repeat(10 - filled)
}

fn human_workspace(workspace: &WorkspaceDescriptor) -> String {
    let mut output = String::new();
    output.push_str("Workspace\n");
    output.push_str(RULE);
    output.push_str("\n\n");
    output.push_str(&format!("Language:      {}\n", workspace.language));
    output.push_str(&format!(
        "Framework:     {}\n",
        workspace.framework.as_deref().unwrap_or("(none)")
    ));
    output.push_str(&format!(
        "Project Type:  {}\n",
        workspace.project_type.as_str()
    ));
    output.push_str(&format!(
        "Capabilities:  {}\n",
        join_or_none(&workspace.capabilities)
    ));
    output.push_str(&format!("Signals:       {}\n", join_or_none(&workspace.signals)));
    output
}

fn human_phase(verdict: &PhaseVerdict) -> String {
    let mut output = String::new();
    output.push_str(&format!("Lifecycle Phase: {}\n", verdict.phase));
    output.push_str(RULE);
    output.push_str("\n\n");
    output.push_str(&format!(
        "Confidence: {} {}%\n\n",
        confidence_bar(verdict.confidence),
        (verdict.confidence * 100.0).round() as u32
    ));

    let s = &verdict.signals;
    output.push_str("Signals:\n");
    output.push_str(&format!("\u{251C}\u{2500} Files:         {}\n", s.file_count));
    output.push_str(&format!("\u{251C}\u{2500} Test files:    {}\n", s.test_count));
    output.push_str(&format!("\u{251C}\u{2500} Dependencies:  {}\n", s.dependency_count));
    output.push_str(&format!("\u{251C}\u{2500} Commits:       {}\n", s.commit_count));
    output.push_str(&format!("\u{251C}\u{2500} CI:            {}\n", yes_no(s.has_ci)));
    output.push_str(&format!("\u{251C}\u{2500} Container:     {}\n", yes_no(s.has_container)));
    output.push_str(&format!("\u{251C}\u{2500} Deployment:    {}\n", yes_no(s.has_deploy)));
    output.push_str(&format!(
        "\u{2514}\u{2500} README:        {}\n\n",
        if s.has_complete_readme { "complete" } else { "incomplete" }
    ));

    output.push_str(&format!(
        "Scores: discovery={} build={} ship={}\n",
        verdict.scores.discovery, verdict.scores.build, verdict.scores.ship
    ));

    if !verdict.recommendations.is_empty() {
        output.push_str("\nRecommendations:\n");
        for recommendation in &verdict.recommendations {
            output.push_str(&format!("  - {}\n", recommendation));
        }
    }
    output
}

fn human_plan(plan: &DispatchPlan, output: &mut String) {
    output.push_str("Dispatch Plan:\n");
    if plan.is_empty() {
        output.push_str(&format!("  (empty: {})\n", plan.reason));
        return;
    }
    for (i, entry) in plan.agents.iter().enumerate() {
        let connector = if i == plan.agents.len() - 1 {
            "\u{2514}"
        } else {
            "\u{251C}"
        };
        output.push_str(&format!(
            "{}\u{2500} {} (relevance {:.2}; matched {})\n",
            connector,
            entry.agent_id,
            entry.relevance(),
            entry.matched_keywords().join(", ")
        ));
    }
    output.push_str(&format!("Reason: {}\n", plan.reason));
}

fn human_route(preview: &RoutePreview) -> String {
    let decision = &preview.decision;
    let mut output = String::new();
    output.push_str(&format!("Route: {}\n", decision.route));
    output.push_str(RULE);
    output.push_str("\n\n");
    output.push_str(&format!(
        "Score: {} {:.4} ({})\n",
        confidence_bar(decision.score),
        decision.score,
        decision.level
    ));
    output.push_str(&format!("{}\n\n", decision.label));

    let s = &preview.signals;
    output.push_str(&format!(
        "Signals: keywords={:.2} profile_match={:.2} historical_success={:.2} complexity={:.2}\n\n",
        s.keywords_score, s.profile_match_score, s.historical_success_score, s.complexity_estimate
    ));

    human_plan(&preview.plan, &mut output);
    output.push_str(&format!("\nPrompt ID: {}\n", decision.prompt_id));
    output
}

fn human_run(outcome: &PipelineOutcome) -> String {
    let mut output = String::new();
    if outcome.failed_entries() == 0 {
        output.push_str(&format!("\u{2713} {}\n", outcome.summary));
    } else {
        output.push_str(&format!("\u{26A0} {}\n", outcome.summary));
    }
    output.push_str(RULE);
    output.push_str("\n\n");
    output.push_str(&format!(
        "Route: {} (score {:.4}, {})\n\n",
        outcome.decision.route, outcome.decision.score, outcome.decision.level
    ));

    human_plan(&outcome.plan, &mut output);

    if !outcome.results.is_empty() {
        output.push_str("\nResults:\n");
        for run in &outcome.results {
            let mark = if run.result.success { "\u{2713}" } else { "\u{2717}" };
            output.push_str(&format!("  {} {}: {}\n", mark, run.agent_id, run.result.summary));
        }
    }

    let problems: Vec<_> = outcome
        .diagnostics
        .iter()
        .filter(|d| d.severity != Severity::Info)
        .collect();
    if !problems.is_empty() {
        output.push_str("\nDiagnostics:\n");
        for diagnostic in problems {
            output.push_str(&format!("  {}\n", diagnostic));
        }
    }

    if !outcome.changes.is_empty() {
        output.push_str("\nChanges:\n");
        for change in &outcome.changes {
            output.push_str(&format!("  - {}: {}\n", change.file, change.description));
        }
    }

    if let Some(reference) = &outcome.memory_reference {
        output.push_str(&format!("\nRecorded as {}\n", reference));
    }
    output
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}
