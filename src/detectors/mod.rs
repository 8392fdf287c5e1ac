//! Workspace detectors
//!
//! A detector inspects a workspace root and optionally reports what it found:
//! a language, a framework, capability tags (`api`, `ml`, `cli`) and free-form
//! signal tags. Detectors are independent of each other and are run in
//! registration order by the [`Scanner`](crate::workspace::Scanner), which is
//! also where their output gets merged.
//!
//! Returning `Ok(None)` means "not my kind of project". Returning `Err` means
//! the detector broke (malformed manifest, unreadable file); the scanner logs
//! it and carries on as if the detector had returned `None`.

mod go;
mod javascript;
pub mod manifest;
mod python;
mod registry;
mod rust;

pub use go::GoDetector;
pub use javascript::JavaScriptDetector;
pub use python::PythonDetector;
pub use registry::DetectorRegistry;
pub use rust::RustDetector;

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Partial description of a workspace produced by a single detector
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectorResult {
    pub language: Option<String>,
    pub framework: Option<String>,
    #[serde(default)]
    pub signals: Vec<String>,
    #[serde(default)]
    pub capabilities: Vec<String>,
}

impl DetectorResult {
    pub fn language(language: impl Into<String>) -> Self {
        Self {
            language: Some(language.into()),
            ..Default::default()
        }
    }

    pub fn with_framework(mut self, framework: impl Into<String>) -> Self {
        self.framework = Some(framework.into());
        self
    }

    pub fn with_signal(mut self, signal: impl Into<String>) -> Self {
        self.add_signal(signal);
        self
    }

    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.add_capability(capability);
        self
    }

    pub fn add_signal(&mut self, signal: impl Into<String>) {
        let signal = signal.into();
        if !self.signals.contains(&signal) {
            self.signals.push(signal);
        }
    }

    pub fn add_capability(&mut self, capability: impl Into<String>) {
        let capability = capability.into();
        if !self.capabilities.contains(&capability) {
            self.capabilities.push(capability);
        }
    }

    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|c| c == capability)
    }
}

/// A pluggable detection unit
pub trait Detector: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &str;

    fn detect(&self, workspace: &Path) -> anyhow::Result<Option<DetectorResult>>;
}

/// Looks up the first dependency name from `table` present in `deps` and
/// returns the mapped framework id.
pub(crate) fn first_match<'a>(deps: &[String], table: &[(&str, &'a str)]) -> Option<&'a str> {
    table
        .iter()
        .find(|(dep, _)| deps.iter().any(|d| d == dep))
        .map(|(_, framework)| *framework)
}

pub(crate) fn has_any(deps: &[String], names: &[&str]) -> bool {
    names.iter().any(|name| deps.iter().any(|d| d == name))
}
