use crate::detectors::DetectorResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

pub const UNKNOWN_LANGUAGE: &str = "unknown";

/// Languages whose projects are usually served to a browser
const WEB_SCRIPTING_LANGUAGES: &[&str] = &["javascript", "typescript"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    Api,
    Ml,
    Cli,
    Landing,
    Saas,
    Unknown,
}

impl ProjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectType::Api => "api",
            ProjectType::Ml => "ml",
            ProjectType::Cli => "cli",
            ProjectType::Landing => "landing",
            ProjectType::Saas => "saas",
            ProjectType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Merged result of one scan. Sets are ordered so that two scans of the same
/// tree compare and serialize identically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceDescriptor {
    pub language: String,
    pub framework: Option<String>,
    pub capabilities: BTreeSet<String>,
    pub signals: BTreeSet<String>,
    pub project_type: ProjectType,
}

impl Default for WorkspaceDescriptor {
    fn default() -> Self {
        Self::unknown()
    }
}

impl WorkspaceDescriptor {
    pub fn unknown() -> Self {
        Self {
            language: UNKNOWN_LANGUAGE.to_string(),
            framework: None,
            capabilities: BTreeSet::new(),
            signals: BTreeSet::new(),
            project_type: ProjectType::Unknown,
        }
    }

    /// Merges detector results given in registration order.
    ///
    /// The primary result is the first one naming a framework, falling back
    /// to the first result. Signals and capabilities are unioned over all
    /// results regardless of which one is primary.
    pub fn from_results(results: &[DetectorResult]) -> Self {
        let Some(primary) = results
            .iter()
            .find(|r| r.framework.is_some())
            .or_else(|| results.first())
        else {
            return Self::unknown();
        };

        let language = primary
            .language
            .as_ref()
            .or_else(|| results.iter().find_map(|r| r.language.as_ref()))
            .map(|l| l.to_lowercase())
            .unwrap_or_else(|| UNKNOWN_LANGUAGE.to_string());

        let capabilities: BTreeSet<String> = results
            .iter()
            .flat_map(|r| r.capabilities.iter().cloned())
            .collect();
        let signals: BTreeSet<String> = results
            .iter()
            .flat_map(|r| r.signals.iter().cloned())
            .collect();

        let project_type = derive_project_type(&language, &capabilities, &signals);

        Self {
            language,
            framework: primary.framework.clone(),
            capabilities,
            signals,
            project_type,
        }
    }

    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.contains(capability)
    }

    pub fn is_unknown(&self) -> bool {
        self.language == UNKNOWN_LANGUAGE && self.framework.is_none()
    }

    /// Fields exposed to agents through their execution context
    pub fn to_metadata(&self) -> serde_json::Map<String, serde_json::Value> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        }
    }
}

/// Priority chain, first match wins: capabilities outrank language, and
/// `api` outranks `ml` outranks `cli`.
pub fn derive_project_type(
    language: &str,
    capabilities: &BTreeSet<String>,
    signals: &BTreeSet<String>,
) -> ProjectType {
    if capabilities.contains("api") {
        return ProjectType::Api;
    }
    if capabilities.contains("ml") {
        return ProjectType::Ml;
    }
    if capabilities.contains("cli") {
        return ProjectType::Cli;
    }
    if WEB_SCRIPTING_LANGUAGES.contains(&language) {
        let server_side = capabilities.contains("api") || signals.contains("node");
        return if server_side {
            ProjectType::Saas
        } else {
            ProjectType::Landing
        };
    }
    ProjectType::Unknown
}
