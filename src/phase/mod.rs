//! Lifecycle phase detection
//!
//! Classifies a workspace as `discovery`, `build` or `ship` from cheap,
//! independently measurable facts ([`PhaseSignals`]). The verdict is a
//! heuristic: confidence never exceeds [`PhaseRules::max_confidence`] unless
//! the caller forces a phase through [`PhaseHints`].

mod classifier;
mod rules;
pub mod signals;

pub use classifier::PhaseClassifier;
pub use rules::{PhasePoints, PhaseRules};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Discovery,
    Build,
    Ship,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Discovery => "discovery",
            Phase::Build => "build",
            Phase::Ship => "ship",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "discovery" => Ok(Phase::Discovery),
            "build" => Ok(Phase::Build),
            "ship" => Ok(Phase::Ship),
            other => Err(format!(
                "Invalid phase: {}. Valid options: discovery, build, ship",
                other
            )),
        }
    }
}

/// Raw facts about a workspace
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseSignals {
    pub file_count: usize,
    pub test_count: usize,
    pub has_ci: bool,
    pub has_container: bool,
    pub has_deploy: bool,
    pub has_complete_readme: bool,
    pub dependency_count: usize,
    /// 0 when history is unavailable
    pub commit_count: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseScores {
    pub discovery: u32,
    pub build: u32,
    pub ship: u32,
}

/// Caller-supplied hints. A `phase` replaces the computed verdict.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseHints {
    pub phase: Option<Phase>,
}

impl PhaseHints {
    pub fn force(phase: Phase) -> Self {
        Self { phase: Some(phase) }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseVerdict {
    pub phase: Phase,
    pub confidence: f64,
    pub scores: PhaseScores,
    pub signals: PhaseSignals,
    /// Advisory only; warning-level entries start with `"warning: "`
    pub recommendations: Vec<String>,
}
