//! JavaScript / TypeScript detector (`package.json`)

use super::manifest::{npm_dependencies, read_json};
use super::{first_match, has_any, Detector, DetectorResult};
use serde_json::Value;
use std::path::Path;

/// Frameworks that run a Node server process, in priority order
const SERVER_FRAMEWORKS: &[(&str, &str)] = &[
    ("next", "nextjs"),
    ("nuxt", "nuxt"),
    ("@nestjs/core", "nestjs"),
    ("express", "express"),
    ("fastify", "fastify"),
    ("koa", "koa"),
    ("hono", "hono"),
];

/// Frameworks that serve an HTTP API as their primary purpose
const API_FRAMEWORKS: &[&str] = &["@nestjs/core", "express", "fastify", "koa", "hono"];

const UI_FRAMEWORKS: &[(&str, &str)] = &[
    ("astro", "astro"),
    ("@sveltejs/kit", "sveltekit"),
    ("svelte", "svelte"),
    ("vue", "vue"),
    ("react", "react"),
];

const ML_PACKAGES: &[&str] = &[
    "@tensorflow/tfjs",
    "@tensorflow/tfjs-node",
    "onnxruntime-node",
    "@xenova/transformers",
    "openai",
];

pub struct JavaScriptDetector;

impl JavaScriptDetector {
    fn language(workspace: &Path, deps: &[String]) -> &'static str {
        if workspace.join("tsconfig.json").is_file() || has_any(deps, &["typescript"]) {
            "typescript"
        } else {
            "javascript"
        }
    }

    fn runs_node(package: &Value) -> bool {
        if package.pointer("/engines/node").is_some() {
            return true;
        }
        package
            .pointer("/scripts/start")
            .and_then(Value::as_str)
            .map(|start| start.trim_start().starts_with("node "))
            .unwrap_or(false)
    }
}

impl Detector for JavaScriptDetector {
    fn name(&self) -> &str {
        "javascript"
    }

    fn detect(&self, workspace: &Path) -> anyhow::Result<Option<DetectorResult>> {
        let Some(package) = read_json(&workspace.join("package.json"))? else {
            return Ok(None);
        };

        let deps = npm_dependencies(&package);
        let mut result = DetectorResult::language(Self::language(workspace, &deps))
            .with_signal("package.json");

        if let Some(framework) = first_match(&deps, SERVER_FRAMEWORKS) {
            result = result.with_framework(framework).with_signal("node");
        } else if let Some(framework) = first_match(&deps, UI_FRAMEWORKS) {
            result = result.with_framework(framework);
        }
        if let Some(tag) = result.framework.as_ref().map(|f| format!("framework:{}", f)) {
            result.add_signal(tag);
        }

        if has_any(&deps, API_FRAMEWORKS) {
            result.add_capability("api");
        }
        if has_any(&deps, ML_PACKAGES) {
            result.add_capability("ml");
        }
        if package.get("bin").is_some() {
            result.add_capability("cli");
        }
        if Self::runs_node(&package) {
            result.add_signal("node");
        }

        Ok(Some(result))
    }
}
