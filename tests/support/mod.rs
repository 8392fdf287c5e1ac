#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("workspaces")
        .join(name)
}

pub fn pathfinder_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_pathfinder"))
}

/// Copies a fixture into a fresh temp dir so tests can add files to it
pub fn copy_fixture(name: &str) -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    copy_dir(&fixture_path(name), dir.path());
    dir
}

fn copy_dir(from: &Path, to: &Path) {
    fs::create_dir_all(to).expect("Failed to create directory");
    for entry in fs::read_dir(from).expect("Failed to read fixture") {
        let entry = entry.expect("Failed to read entry");
        let target = to.join(entry.file_name());
        if entry.path().is_dir() {
            copy_dir(&entry.path(), &target);
        } else {
            fs::copy(entry.path(), &target).expect("Failed to copy file");
        }
    }
}

pub fn write_file(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent");
    }
    fs::write(path, content).expect("Failed to write file");
}

/// Config file whose telemetry and history logs live inside `dir`
pub fn write_config(dir: &Path, extra: &str) -> PathBuf {
    let path = dir.join("pathfinder.toml");
    let content = format!(
        "telemetry_path = {:?}\nhistory_path = {:?}\n{}",
        dir.join("telemetry.jsonl").to_string_lossy(),
        dir.join("history.jsonl").to_string_lossy(),
        extra
    );
    fs::write(&path, content).expect("Failed to write config");
    path
}
