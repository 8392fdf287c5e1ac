//! Rust detector (`Cargo.toml`)

use super::manifest::{read_toml, toml_table_keys};
use super::{first_match, has_any, Detector, DetectorResult};
use std::path::Path;

const API_FRAMEWORKS: &[(&str, &str)] = &[
    ("axum", "axum"),
    ("actix-web", "actix"),
    ("rocket", "rocket"),
    ("warp", "warp"),
    ("poem", "poem"),
];

const CLI_CRATES: &[&str] = &["clap", "argh", "structopt"];

const ML_CRATES: &[&str] = &["candle-core", "burn", "tch", "ort", "linfa"];

pub struct RustDetector;

impl Detector for RustDetector {
    fn name(&self) -> &str {
        "rust"
    }

    fn detect(&self, workspace: &Path) -> anyhow::Result<Option<DetectorResult>> {
        let Some(cargo) = read_toml(&workspace.join("Cargo.toml"))? else {
            return Ok(None);
        };

        let mut deps = toml_table_keys(&cargo, &["dependencies"]);
        deps.extend(toml_table_keys(&cargo, &["workspace", "dependencies"]));

        let mut result = DetectorResult::language("rust").with_signal("cargo");

        if cargo.get("workspace").is_some() {
            result.add_signal("cargo-workspace");
        }
        if cargo.get("bin").is_some() || workspace.join("src/main.rs").is_file() {
            result.add_signal("binary");
        }

        if let Some(framework) = first_match(&deps, API_FRAMEWORKS) {
            result = result
                .with_framework(framework)
                .with_capability("api")
                .with_signal(format!("framework:{}", framework));
        }
        if has_any(&deps, CLI_CRATES) {
            result.add_capability("cli");
        }
        if has_any(&deps, ML_CRATES) {
            result.add_capability("ml");
        }

        Ok(Some(result))
    }
}
