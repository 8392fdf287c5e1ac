//! Manifest reading helpers shared by detectors and the phase classifier

use anyhow::{Context, Result};
use regex::Regex;
use serde_json::Value;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::OnceLock;

/// Reads a file, returning `Ok(None)` when it does not exist.
pub fn read_text(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
    }
}

pub fn read_json(path: &Path) -> Result<Option<Value>> {
    let Some(content) = read_text(path)? else {
        return Ok(None);
    };
    let value = serde_json::from_str(&content)
        .with_context(|| format!("Malformed JSON in {}", path.display()))?;
    Ok(Some(value))
}

pub fn read_toml(path: &Path) -> Result<Option<toml::Value>> {
    let Some(content) = read_text(path)? else {
        return Ok(None);
    };
    let value = toml::from_str(&content)
        .with_context(|| format!("Malformed TOML in {}", path.display()))?;
    Ok(Some(value))
}

/// Keys of the table at `path` (e.g. `["tool", "poetry", "dependencies"]`).
pub fn toml_table_keys(value: &toml::Value, path: &[&str]) -> Vec<String> {
    let mut current = value;
    for key in path {
        match current.get(key) {
            Some(next) => current = next,
            None => return Vec::new(),
        }
    }
    current
        .as_table()
        .map(|table| table.keys().cloned().collect())
        .unwrap_or_default()
}

/// `dependencies` and `devDependencies` of a `package.json`
pub fn npm_dependencies(package: &Value) -> Vec<String> {
    let mut deps = Vec::new();
    for section in ["dependencies", "devDependencies"] {
        if let Some(map) = package.get(section).and_then(Value::as_object) {
            deps.extend(map.keys().cloned());
        }
    }
    deps
}

fn requirement_regex() -> &'static Regex {
    static REQUIREMENT_REGEX: OnceLock<Regex> = OnceLock::new();
    REQUIREMENT_REGEX.get_or_init(|| {
        Regex::new(r"^([A-Za-z0-9][A-Za-z0-9._-]*)").expect("Invalid requirement regex")
    })
}

fn go_require_regex() -> &'static Regex {
    static GO_REQUIRE_REGEX: OnceLock<Regex> = OnceLock::new();
    GO_REQUIRE_REGEX.get_or_init(|| {
        Regex::new(r"^require\s+(\S+)\s+v?\S+").expect("Invalid go require regex")
    })
}

fn go_module_regex() -> &'static Regex {
    static GO_MODULE_REGEX: OnceLock<Regex> = OnceLock::new();
    GO_MODULE_REGEX
        .get_or_init(|| Regex::new(r"^(\S+)\s+v?\S+").expect("Invalid go module regex"))
}

/// Package name of a PEP 508 requirement line, normalized to lowercase with
/// dashes. Comments, blank lines and pip options yield `None`.
pub fn requirement_name(line: &str) -> Option<String> {
    requirement_regex()
        .captures(line.trim())
        .map(|caps| caps[1].to_lowercase().replace('_', "-"))
}

/// Module paths listed in `require` directives of a `go.mod`
pub fn go_requires(content: &str) -> Vec<String> {
    let mut modules = Vec::new();
    let mut in_block = false;

    for line in content.lines() {
        let line = line.split("//").next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with("require (") || line == "require(" {
            in_block = true;
            continue;
        }
        if in_block && line == ")" {
            in_block = false;
            continue;
        }

        let re = if in_block {
            go_module_regex()
        } else {
            go_require_regex()
        };
        if let Some(caps) = re.captures(line) {
            modules.push(caps[1].to_string());
        }
    }

    modules
}

/// Counts declared dependencies of the first manifest found in `workspace`.
///
/// Manifests are checked in a fixed order; a malformed manifest counts as
/// zero dependencies.
pub fn count_dependencies(workspace: &Path) -> usize {
    if let Ok(Some(package)) = read_json(&workspace.join("package.json")) {
        return npm_dependencies(&package).len();
    }
    if let Ok(Some(cargo)) = read_toml(&workspace.join("Cargo.toml")) {
        return toml_table_keys(&cargo, &["dependencies"]).len()
            + toml_table_keys(&cargo, &["dev-dependencies"]).len();
    }
    if let Ok(Some(pyproject)) = read_toml(&workspace.join("pyproject.toml")) {
        let declared = pyproject
            .get("project")
            .and_then(|p| p.get("dependencies"))
            .and_then(|d| d.as_array())
            .map(|d| d.len())
            .unwrap_or(0);
        let poetry = toml_table_keys(&pyproject, &["tool", "poetry", "dependencies"])
            .into_iter()
            .filter(|k| k != "python")
            .count();
        return declared + poetry;
    }
    if let Ok(Some(requirements)) = read_text(&workspace.join("requirements.txt")) {
        return requirements
            .lines()
            .filter_map(requirement_name)
            .count();
    }
    if let Ok(Some(go_mod)) = read_text(&workspace.join("go.mod")) {
        return go_requires(&go_mod).len();
    }
    0
}
