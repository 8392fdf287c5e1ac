//! Filesystem and history measurements feeding the phase classifier

use super::PhaseSignals;
use crate::detectors::manifest::count_dependencies;
use ignore::WalkBuilder;
use std::path::Path;
use std::process::Command;
use tracing::{debug, warn};

/// Dependency, VCS and build output directories that never count as project files
pub const EXCLUDED_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    "dist",
    "build",
    "target",
    "__pycache__",
    ".venv",
    "venv",
    "vendor",
    "coverage",
    ".next",
    ".cache",
];

pub const CI_PATHS: &[&str] = &[
    ".github/workflows",
    ".gitlab-ci.yml",
    ".circleci",
    "Jenkinsfile",
    "azure-pipelines.yml",
    ".travis.yml",
    "bitbucket-pipelines.yml",
];

pub const CONTAINER_FILES: &[&str] = &[
    "Dockerfile",
    "Containerfile",
    "docker-compose.yml",
    "docker-compose.yaml",
    "compose.yml",
    "compose.yaml",
];

pub const DEPLOY_PATHS: &[&str] = &[
    "vercel.json",
    "netlify.toml",
    "fly.toml",
    "render.yaml",
    "app.yaml",
    "Procfile",
    "serverless.yml",
    "railway.json",
    "k8s",
    "kubernetes",
    "helm",
    "terraform",
];

pub const README_FILES: &[&str] = &["README.md", "README", "README.rst", "readme.md"];

/// README length (in characters) above which it counts as complete
pub const COMPLETE_README_CHARS: usize = 500;

/// Measures every phase signal for `workspace`. Individual probes never fail;
/// anything unreadable contributes its zero value.
pub fn measure(workspace: &Path, count_commits: bool) -> PhaseSignals {
    let (file_count, test_count) = count_files(workspace);

    let signals = PhaseSignals {
        file_count,
        test_count,
        has_ci: any_exists(workspace, CI_PATHS),
        has_container: any_exists(workspace, CONTAINER_FILES),
        has_deploy: any_exists(workspace, DEPLOY_PATHS),
        has_complete_readme: has_complete_readme(workspace),
        dependency_count: count_dependencies(workspace),
        commit_count: if count_commits {
            commit_count(workspace)
        } else {
            0
        },
    };

    debug!(workspace = %workspace.display(), ?signals, "Measured phase signals");
    signals
}

fn any_exists(workspace: &Path, candidates: &[&str]) -> bool {
    candidates.iter().any(|c| workspace.join(c).exists())
}

/// Walks the tree and returns `(files, test files)`.
///
/// Ignore files are deliberately not honoured so the counts only depend on
/// what is on disk.
fn count_files(workspace: &Path) -> (usize, usize) {
    let mut files = 0;
    let mut tests = 0;

    let walker = WalkBuilder::new(workspace)
        .hidden(false)
        .ignore(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .parents(false)
        .filter_entry(|entry| {
            if entry.depth() == 0 {
                return true;
            }
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            let name = entry.file_name().to_string_lossy();
            !(is_dir && EXCLUDED_DIRS.contains(&&*name))
        })
        .build();

    for result in walker {
        let entry = match result {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = %err, "Failed to read directory entry");
                continue;
            }
        };
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        files += 1;

        let relative = entry
            .path()
            .strip_prefix(workspace)
            .unwrap_or(entry.path())
            .to_string_lossy();
        if is_test_file(&relative) {
            tests += 1;
        }
    }

    (files, tests)
}

/// Test naming conventions, matched case-insensitively on the relative path.
pub fn is_test_file(relative_path: &str) -> bool {
    let path = relative_path.replace('\\', "/").to_lowercase();
    let file_name = path.rsplit('/').next().unwrap_or(&path);

    if file_name.contains(".test.")
        || file_name.contains(".spec.")
        || file_name.ends_with("_test.py")
        || file_name.ends_with("test.py")
        || file_name.ends_with("_test.go")
    {
        return true;
    }

    let mut segments: Vec<&str> = path.split('/').collect();
    segments.pop();
    segments
        .iter()
        .any(|s| matches!(*s, "test" | "tests" | "__tests__"))
}

fn has_complete_readme(workspace: &Path) -> bool {
    README_FILES
        .iter()
        .find_map(|name| std::fs::read_to_string(workspace.join(name)).ok())
        .map(|content| content.chars().count() > COMPLETE_README_CHARS)
        .unwrap_or(false)
}

/// Number of `HEAD` commits touching the workspace, or 0 when git or the
/// history is unavailable.
///
/// A workspace nested inside a larger repository only counts the commits
/// that changed files under it.
pub fn commit_count(workspace: &Path) -> usize {
    let Some(toplevel) = git_output(workspace, &["rev-parse", "--show-toplevel"]) else {
        return 0;
    };
    let at_root = match (Path::new(&toplevel).canonicalize(), workspace.canonicalize()) {
        (Ok(top), Ok(root)) => top == root,
        _ => false,
    };

    let mut args = vec!["rev-list", "--count", "HEAD"];
    if !at_root {
        args.extend(["--", "."]);
    }
    git_output(workspace, &args)
        .and_then(|count| count.parse().ok())
        .unwrap_or(0)
}

fn git_output(workspace: &Path, args: &[&str]) -> Option<String> {
    match Command::new("git").args(args).current_dir(workspace).output() {
        Ok(output) if output.status.success() => {
            Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
        }
        Ok(output) => {
            debug!(
                command = %args.join(" "),
                status = ?output.status.code(),
                "git command failed, assuming no history"
            );
            None
        }
        Err(e) => {
            debug!(error = %e, "git unavailable, assuming no history");
            None
        }
    }
}
