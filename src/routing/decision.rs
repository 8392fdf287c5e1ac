use crate::scoring::{ConfidenceLevel, ScoreComponents, ScoreSignals};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    CandidateAutoApply,
    FallbackLlm,
    ClarifyNeeded,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        match self {
            Route::CandidateAutoApply => "candidate_auto_apply",
            Route::FallbackLlm => "fallback_llm",
            Route::ClarifyNeeded => "clarify_needed",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Route::CandidateAutoApply => "Auto-apply candidate",
            Route::FallbackLlm => "LLM fallback",
            Route::ClarifyNeeded => "Clarification needed",
        }
    }

    /// Lower bounds are inclusive: `score == auto_apply` auto-applies.
    pub fn for_score(score: f64, auto_apply_threshold: f64, llm_fallback_threshold: f64) -> Self {
        if score >= auto_apply_threshold {
            Route::CandidateAutoApply
        } else if score >= llm_fallback_threshold {
            Route::FallbackLlm
        } else {
            Route::ClarifyNeeded
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDecision {
    pub route: Route,
    pub label: String,
}

impl From<Route> for RouteDecision {
    fn from(route: Route) -> Self {
        Self {
            route,
            label: route.label().to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FallbackOptions {
    pub signals: ScoreSignals,
    pub user_intent: String,
    /// Generated when absent
    pub prompt_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackDecision {
    pub score: f64,
    pub level: ConfidenceLevel,
    pub route: Route,
    pub label: String,
    pub breakdown: ScoreComponents,
    pub prompt_id: String,
}

impl FallbackDecision {
    pub fn decision(&self) -> RouteDecision {
        RouteDecision {
            route: self.route,
            label: self.label.clone(),
        }
    }
}
