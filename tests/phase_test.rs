//! Lifecycle phase detection on real directory trees

mod support;

use pathfinder::phase::signals::COMPLETE_README_CHARS;
use pathfinder::phase::{Phase, PhaseClassifier, PhaseHints, PhaseRules};
use pathfinder::workspace::ScanError;
use support::{copy_fixture, fixture_path, write_file};
use tempfile::TempDir;

fn classifier() -> PhaseClassifier {
    PhaseClassifier::default().without_history()
}

fn shipping_workspace() -> TempDir {
    let dir = copy_fixture("node-express");
    let root = dir.path();
    for i in 0..60 {
        write_file(root, &format!("src/routes/route_{}.js", i), "module.exports = {}\n");
    }
    for i in 0..6 {
        write_file(root, &format!("src/routes/route_{}.test.js", i), "test('ok', () => {})\n");
    }
    write_file(root, ".github/workflows/ci.yml", "on: push\n");
    write_file(root, "Dockerfile", "FROM node:20\n");
    write_file(root, "fly.toml", "app = 'orders'\n");
    write_file(root, "README.md", &"Orders API. ".repeat(COMPLETE_README_CHARS / 10));
    dir
}

#[test]
fn test_fresh_fixture_is_discovery() {
    let verdict = classifier()
        .detect_phase(&fixture_path("plain-docs"), None)
        .unwrap();

    assert_eq!(verdict.phase, Phase::Discovery);
    assert_eq!(verdict.signals.file_count, 1);
    assert_eq!(verdict.signals.test_count, 0);
    assert!(verdict.confidence > 0.0 && verdict.confidence <= 0.9);
    assert!(!verdict.recommendations.is_empty());
}

#[test]
fn test_shipping_workspace_is_ship() {
    let dir = shipping_workspace();
    let verdict = classifier().detect_phase(dir.path(), None).unwrap();

    assert_eq!(verdict.phase, Phase::Ship);
    assert!(verdict.signals.has_ci);
    assert!(verdict.signals.has_container);
    assert!(verdict.signals.has_deploy);
    assert!(verdict.signals.has_complete_readme);
    assert_eq!(verdict.signals.test_count, 6);
    assert!(verdict.confidence <= 0.9);
}

#[test]
fn test_dependency_directories_are_not_counted() {
    let dir = copy_fixture("node-react");
    for i in 0..100 {
        write_file(dir.path(), &format!("node_modules/pkg{}/index.js", i), "");
    }
    let verdict = classifier().detect_phase(dir.path(), None).unwrap();

    assert_eq!(verdict.signals.file_count, 2);
    assert_eq!(verdict.phase, Phase::Discovery);
}

#[test]
fn test_hint_forces_phase() {
    let verdict = classifier()
        .detect_phase(&fixture_path("plain-docs"), Some(&PhaseHints::force(Phase::Ship)))
        .unwrap();

    assert_eq!(verdict.phase, Phase::Ship);
    assert_eq!(verdict.confidence, 1.0);
    assert!(verdict
        .recommendations
        .iter()
        .any(|r| r.starts_with("warning: ")));
}

#[test]
fn test_custom_rules_change_the_verdict() {
    let rules = PhaseRules {
        small_file_count: 1,
        medium_file_count: 1,
        ..Default::default()
    };
    let verdict = PhaseClassifier::new(rules)
        .without_history()
        .detect_phase(&fixture_path("rust-clap"), None)
        .unwrap();

    assert_eq!(verdict.scores.discovery, 6);
    assert_eq!(verdict.scores.build, 2);
}

#[test]
fn test_invalid_path_is_an_error() {
    let err = classifier()
        .detect_phase(&fixture_path("nope"), None)
        .unwrap_err();
    assert!(matches!(err, ScanError::InvalidPath { .. }));
}
