//! CLI integration tests
//!
//! Runs the compiled binary against fixture workspaces and checks output
//! formats and exit codes.

mod support;

use std::process::{Command, Output};
use support::{copy_fixture, fixture_path, pathfinder_binary, write_config};
use tempfile::TempDir;

fn run(args: &[&str], config_dir: &TempDir, extra_config: &str) -> Output {
    let config = write_config(config_dir.path(), extra_config);
    Command::new(pathfinder_binary())
        .arg("--config")
        .arg(&config)
        .arg("-q")
        .args(args)
        .env_remove("PATHFINDER_AUTO_APPLY_THRESHOLD")
        .env_remove("PATHFINDER_LLM_FALLBACK_THRESHOLD")
        .env_remove("PATHFINDER_TELEMETRY")
        .output()
        .expect("Failed to execute pathfinder")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}

#[test]
fn test_cli_help() {
    let output = Command::new(pathfinder_binary())
        .arg("--help")
        .output()
        .expect("Failed to execute pathfinder");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["scan", "phase", "route", "run", "config"] {
        assert!(stdout.contains(command), "help is missing {}", command);
    }
}

#[test]
fn test_cli_version() {
    let output = Command::new(pathfinder_binary())
        .arg("--version")
        .output()
        .expect("Failed to execute pathfinder");

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_scan_json() {
    let state = TempDir::new().unwrap();
    let path = fixture_path("ts-nest");
    let output = run(
        &["scan", path.to_str().unwrap(), "--format", "json"],
        &state,
        "",
    );

    assert_eq!(output.status.code(), Some(0));
    let json = stdout_json(&output);
    assert_eq!(json["language"], "typescript");
    assert_eq!(json["framework"], "nestjs");
    assert_eq!(json["project_type"], "api");
}

#[test]
fn test_scan_yaml() {
    let state = TempDir::new().unwrap();
    let path = fixture_path("rust-clap");
    let output = run(
        &["scan", path.to_str().unwrap(), "--format", "yaml"],
        &state,
        "",
    );

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("language: rust"));
    assert!(stdout.contains("project_type: cli"));
}

#[test]
fn test_scan_invalid_path_exits_1() {
    let state = TempDir::new().unwrap();
    let output = run(&["scan", "/definitely/not/a/workspace"], &state, "");

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error:"));
}

#[test]
fn test_phase_human_with_override() {
    let state = TempDir::new().unwrap();
    let path = fixture_path("plain-docs");
    let output = run(
        &["phase", path.to_str().unwrap(), "--phase", "build"],
        &state,
        "",
    );

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("Lifecycle Phase: build"));
    assert!(stdout.contains("100%"));
}

#[test]
fn test_route_writes_telemetry() {
    let state = TempDir::new().unwrap();
    let path = fixture_path("node-express");
    let output = run(
        &[
            "route",
            path.to_str().unwrap(),
            "--intent",
            "audit release readiness",
            "--prompt-id",
            "cli-1",
            "--format",
            "json",
        ],
        &state,
        "",
    );

    assert_eq!(output.status.code(), Some(0));
    let json = stdout_json(&output);
    assert_eq!(json["decision"]["prompt_id"], "cli-1");
    assert_eq!(json["plan"]["agents"][0]["agent_id"], "phase-audit");

    let telemetry = std::fs::read_to_string(state.path().join("telemetry.jsonl")).unwrap();
    let event: serde_json::Value = serde_json::from_str(telemetry.lines().next().unwrap()).unwrap();
    assert_eq!(event["event"], "route_decision");
    assert_eq!(event["prompt_id"], "cli-1");
    assert_eq!(event["route"], json["decision"]["route"]);
}

#[test]
fn test_route_respects_disabled_telemetry() {
    let state = TempDir::new().unwrap();
    let path = fixture_path("node-express");
    let output = run(
        &["route", path.to_str().unwrap(), "--intent", "audit"],
        &state,
        "telemetry_enabled = false\n",
    );

    assert_eq!(output.status.code(), Some(0));
    assert!(!state.path().join("telemetry.jsonl").exists());
}

#[test]
fn test_run_success_records_history() {
    let state = TempDir::new().unwrap();
    let workspace = copy_fixture("python-fastapi");
    let output = run(
        &[
            "run",
            workspace.path().to_str().unwrap(),
            "--intent",
            "phase audit",
            "--format",
            "json",
        ],
        &state,
        "",
    );

    assert_eq!(output.status.code(), Some(0));
    let json = stdout_json(&output);
    assert_eq!(json["summary"], "1/1 agents succeeded");
    assert!(json["memory_reference"].is_string());

    let history = std::fs::read_to_string(state.path().join("history.jsonl")).unwrap();
    assert_eq!(history.lines().count(), 1);
}

#[test]
fn test_run_with_failed_entry_exits_2() {
    let state = TempDir::new().unwrap();
    let workspace = copy_fixture("go-gin");
    // python-only persona on a go workspace: skipped as unsupported
    let agents = r#"
[[agents]]
id = "django-helper"
keywords = ["django", "migration"]
languages = ["python"]
persona = "You help with Django."
"#;
    let output = run(
        &[
            "run",
            workspace.path().to_str().unwrap(),
            "--intent",
            "write a migration",
        ],
        &state,
        agents,
    );

    assert_eq!(output.status.code(), Some(2));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("0/1 agents succeeded"));
}

#[test]
fn test_config_json_reflects_file() {
    let state = TempDir::new().unwrap();
    let output = run(
        &["config", "--format", "json"],
        &state,
        "max_agents = 5\nauto_apply_threshold = 0.9\n",
    );

    assert_eq!(output.status.code(), Some(0));
    let json = stdout_json(&output);
    assert_eq!(json["max_agents"], 5);
    assert_eq!(json["auto_apply_threshold"], 0.9);
}

#[test]
fn test_invalid_config_falls_back_to_defaults() {
    let state = TempDir::new().unwrap();
    let output = run(
        &["config", "--format", "json"],
        &state,
        "auto_apply_threshold = 0.2\nllm_fallback_threshold = 0.6\n",
    );

    assert_eq!(output.status.code(), Some(0));
    let json = stdout_json(&output);
    assert_eq!(json["auto_apply_threshold"], 0.8);
    assert_eq!(json["max_agents"], 3);
}
