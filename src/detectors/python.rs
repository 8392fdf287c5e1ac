//! Python detector (`pyproject.toml`, `requirements.txt`, `setup.py`, `Pipfile`)

use super::manifest::{read_text, read_toml, requirement_name, toml_table_keys};
use super::{first_match, has_any, Detector, DetectorResult};
use std::path::Path;

const FRAMEWORKS: &[(&str, &str)] = &[
    ("fastapi", "fastapi"),
    ("django", "django"),
    ("flask", "flask"),
    ("streamlit", "streamlit"),
];

const API_FRAMEWORKS: &[&str] = &["fastapi", "django", "djangorestframework", "flask"];

const ML_PACKAGES: &[&str] = &[
    "torch",
    "tensorflow",
    "keras",
    "scikit-learn",
    "transformers",
    "xgboost",
    "lightgbm",
    "jax",
];

const CLI_PACKAGES: &[&str] = &["click", "typer"];

pub struct PythonDetector;

struct PythonManifests {
    deps: Vec<String>,
    has_scripts: bool,
    found: bool,
}

impl PythonDetector {
    fn collect(workspace: &Path) -> anyhow::Result<PythonManifests> {
        let mut manifests = PythonManifests {
            deps: Vec::new(),
            has_scripts: false,
            found: false,
        };

        if let Some(pyproject) = read_toml(&workspace.join("pyproject.toml"))? {
            manifests.found = true;
            if let Some(declared) = pyproject
                .get("project")
                .and_then(|p| p.get("dependencies"))
                .and_then(|d| d.as_array())
            {
                manifests.deps.extend(
                    declared
                        .iter()
                        .filter_map(|d| d.as_str())
                        .filter_map(requirement_name),
                );
            }
            manifests.deps.extend(
                toml_table_keys(&pyproject, &["tool", "poetry", "dependencies"])
                    .iter()
                    .filter_map(|k| requirement_name(k)),
            );
            manifests.has_scripts = !toml_table_keys(&pyproject, &["project", "scripts"])
                .is_empty()
                || !toml_table_keys(&pyproject, &["tool", "poetry", "scripts"]).is_empty();
        }

        if let Some(requirements) = read_text(&workspace.join("requirements.txt"))? {
            manifests.found = true;
            manifests
                .deps
                .extend(requirements.lines().filter_map(requirement_name));
        }

        if let Some(pipfile) = read_toml(&workspace.join("Pipfile"))? {
            manifests.found = true;
            manifests.deps.extend(
                toml_table_keys(&pipfile, &["packages"])
                    .iter()
                    .filter_map(|k| requirement_name(k)),
            );
        }

        if let Some(setup) = read_text(&workspace.join("setup.py"))? {
            manifests.found = true;
            let setup = setup.to_lowercase();
            let known = FRAMEWORKS
                .iter()
                .map(|(dep, _)| *dep)
                .chain(ML_PACKAGES.iter().copied())
                .chain(CLI_PACKAGES.iter().copied());
            for dep in known {
                if setup.contains(&format!("\"{}", dep)) || setup.contains(&format!("'{}", dep)) {
                    manifests.deps.push(dep.to_string());
                }
            }
            if setup.contains("entry_points") || setup.contains("console_scripts") {
                manifests.has_scripts = true;
            }
        }

        manifests.deps.sort();
        manifests.deps.dedup();
        Ok(manifests)
    }
}

impl Detector for PythonDetector {
    fn name(&self) -> &str {
        "python"
    }

    fn detect(&self, workspace: &Path) -> anyhow::Result<Option<DetectorResult>> {
        let manifests = Self::collect(workspace)?;
        if !manifests.found {
            return Ok(None);
        }

        let deps = &manifests.deps;
        let mut result = DetectorResult::language("python").with_signal("python");

        if let Some(framework) = first_match(deps, FRAMEWORKS) {
            result = result
                .with_framework(framework)
                .with_signal(format!("framework:{}", framework));
        }
        if has_any(deps, API_FRAMEWORKS) {
            result.add_capability("api");
        }
        let dataframe_stack = has_any(deps, &["numpy"]) && has_any(deps, &["pandas"]);
        if has_any(deps, ML_PACKAGES) || dataframe_stack {
            result.add_capability("ml");
        }
        if manifests.has_scripts || has_any(deps, CLI_PACKAGES) {
            result.add_capability("cli");
        }

        Ok(Some(result))
    }
}
