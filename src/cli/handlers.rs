//! Command handlers
//!
//! Each handler prints its result on stdout and returns the process exit
//! code: 0 on success, 1 on a fatal error, 2 when a run finished with failed
//! agent entries.

use super::commands::{PhaseArgs, RouteArgs, RunArgs, ScanArgs};
use super::output::{OutputFormat, OutputFormatter};
use crate::agents::ExternalContext;
use crate::config::RouterConfig;
use crate::phase::{PhaseClassifier, PhaseHints};
use crate::pipeline::{Pipeline, PipelineRequest, SignalOverrides};
use crate::workspace::Scanner;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_FAILED_ENTRIES: i32 = 2;

pub fn handle_scan(args: &ScanArgs, format: OutputFormat) -> i32 {
    let path = workspace_path(args.workspace_path.as_deref());
    match Scanner::new().scan(&path) {
        Ok(workspace) => emit(OutputFormatter::new(format).format_scan(&workspace)),
        Err(e) => fail(&e.to_string()),
    }
}

pub fn handle_phase(args: &PhaseArgs, config: &RouterConfig, format: OutputFormat) -> i32 {
    let path = workspace_path(args.workspace_path.as_deref());
    let classifier = PhaseClassifier::new(config.phase.clone());
    let hints = args.phase.map(PhaseHints::force);

    match classifier.detect_phase(&path, hints.as_ref()) {
        Ok(verdict) => emit(OutputFormatter::new(format).format_phase(&verdict)),
        Err(e) => fail(&e.to_string()),
    }
}

pub fn handle_route(args: &RouteArgs, config: &RouterConfig, format: OutputFormat) -> i32 {
    let pipeline = Pipeline::from_config(config);
    match pipeline.preview(&pipeline_request(args)) {
        Ok(preview) => emit(OutputFormatter::new(format).format_route(&preview)),
        Err(e) => fail(&e.to_string()),
    }
}

pub async fn handle_run(args: &RunArgs, config: &RouterConfig, format: OutputFormat) -> i32 {
    let pipeline = Pipeline::from_config(config);

    let mut request = pipeline_request(&args.route);
    if args.knowledge_base.is_some() || !args.snippets.is_empty() {
        request.external_context = Some(ExternalContext {
            knowledge_base: args.knowledge_base.clone(),
            snippets: args.snippets.clone(),
        });
    }

    let outcome = match pipeline.run(request).await {
        Ok(outcome) => outcome,
        Err(e) => return fail(&e.to_string()),
    };

    let code = emit(OutputFormatter::new(format).format_run(&outcome));
    if code != EXIT_SUCCESS {
        return code;
    }
    if outcome.failed_entries() > 0 {
        debug!(failed = outcome.failed_entries(), "Run finished with failed entries");
        return EXIT_FAILED_ENTRIES;
    }
    EXIT_SUCCESS
}

pub fn handle_config(config: &RouterConfig, format: OutputFormat) -> i32 {
    emit(OutputFormatter::new(format).format_config(config))
}

fn pipeline_request(args: &RouteArgs) -> PipelineRequest {
    PipelineRequest {
        workspace_path: workspace_path(args.workspace_path.as_deref()),
        user_intent: args.intent.clone(),
        max_agents: args.max_agents,
        signals: SignalOverrides {
            keywords_score: args.signals.keywords_score,
            profile_match_score: args.signals.profile_match_score,
            historical_success_score: args.signals.historical_success_score,
            complexity_estimate: args.signals.complexity_estimate,
        },
        prompt_id: args.prompt_id.clone(),
        phase: args.phase,
        external_context: None,
    }
}

fn workspace_path(path: Option<&Path>) -> PathBuf {
    path.map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn emit(rendered: anyhow::Result<String>) -> i32 {
    match rendered {
        Ok(text) => {
            println!("{}", text.trim_end());
            EXIT_SUCCESS
        }
        Err(e) => fail(&format!("{:#}", e)),
    }
}

fn fail(message: &str) -> i32 {
    error!("{}", message);
    eprintln!("Error: {}", message);
    EXIT_FAILURE
}
