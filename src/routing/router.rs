use super::decision::{FallbackDecision, FallbackOptions, Route};
use crate::agents::AgentRegistry;
use crate::config::RouterConfig;
use crate::scoring::{ScoreSignals, ScoringEngine};
use crate::telemetry::{NoopTelemetry, RouteTelemetryEvent, TelemetrySink};
use crate::workspace::WorkspaceDescriptor;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::cmp::Ordering;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, instrument};
use uuid::Uuid;

pub const NO_MATCH_REASON: &str = "no agent matched the request";

/// Jaro-Winkler similarity at which a token counts as a typo of a keyword
const FUZZY_MATCH_THRESHOLD: f64 = 0.92;
/// Shorter tokens only match exactly
const FUZZY_MIN_TOKEN_LEN: usize = 4;

const RELEVANCE_LANGUAGE_BONUS: f64 = 0.5;
const RELEVANCE_CAPABILITY_BONUS: f64 = 0.25;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteRequest {
    pub metadata: WorkspaceDescriptor,
    pub user_intent: String,
    /// Overrides the router's configured cap
    pub max_agents: Option<usize>,
}

impl RouteRequest {
    pub fn new(metadata: WorkspaceDescriptor, user_intent: impl Into<String>) -> Self {
        Self {
            metadata,
            user_intent: user_intent.into(),
            max_agents: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentPlanEntry {
    pub agent_id: String,
    pub config: Map<String, Value>,
}

impl AgentPlanEntry {
    pub fn new(agent_id: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            config: Map::new(),
        }
    }

    pub fn relevance(&self) -> f64 {
        self.config
            .get("relevance")
            .and_then(Value::as_f64)
            .unwrap_or(0.0)
    }

    pub fn matched_keywords(&self) -> Vec<&str> {
        self.config
            .get("matched_keywords")
            .and_then(Value::as_array)
            .map(|keywords| keywords.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchPlan {
    pub agents: Vec<AgentPlanEntry>,
    pub reason: String,
}

impl DispatchPlan {
    pub fn empty(reason: impl Into<String>) -> Self {
        Self {
            agents: Vec::new(),
            reason: reason.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn agent_ids(&self) -> Vec<&str> {
        self.agents.iter().map(|e| e.agent_id.as_str()).collect()
    }
}

struct Candidate {
    agent_id: String,
    relevance: f64,
    matched: Vec<String>,
}

pub struct Router {
    agents: Arc<AgentRegistry>,
    scoring: ScoringEngine,
    telemetry: Arc<dyn TelemetrySink>,
    max_agents: usize,
}

impl Router {
    pub fn new(agents: Arc<AgentRegistry>, scoring: ScoringEngine, max_agents: usize) -> Self {
        Self {
            agents,
            scoring,
            telemetry: Arc::new(NoopTelemetry),
            max_agents,
        }
    }

    pub fn from_config(agents: Arc<AgentRegistry>, config: &RouterConfig) -> Self {
        Self::new(agents, config.scoring_engine(), config.max_agents)
    }

    pub fn with_telemetry(mut self, telemetry: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn scoring(&self) -> &ScoringEngine {
        &self.scoring
    }

    pub fn agents(&self) -> &AgentRegistry {
        &self.agents
    }

    /// Builds the dispatch plan for one request.
    #[instrument(skip(self, request), fields(language = %request.metadata.language))]
    pub fn route(&self, request: &RouteRequest) -> DispatchPlan {
        let intent = request.user_intent.to_lowercase();
        let tokens = tokenize(&intent);
        let descriptor = &request.metadata;

        let mut candidates: Vec<Candidate> = Vec::new();
        for agent in self.agents.agents() {
            let profile = agent.profile();
            let matched = matched_keywords(&profile.keywords, &intent, &tokens);
            if matched.is_empty() {
                continue;
            }

            let mut relevance = matched.len() as f64;
            if profile.declares_language(&descriptor.language) {
                relevance += RELEVANCE_LANGUAGE_BONUS;
            }
            let shared_capabilities = profile
                .capabilities
                .iter()
                .filter(|c| descriptor.has_capability(c))
                .count();
            relevance += RELEVANCE_CAPABILITY_BONUS * shared_capabilities as f64;

            debug!(agent = %profile.id, relevance, ?matched, "Agent is a candidate");
            candidates.push(Candidate {
                agent_id: profile.id.clone(),
                relevance,
                matched,
            });
        }

        if candidates.is_empty() {
            info!("No agent matched the request");
            return DispatchPlan::empty(NO_MATCH_REASON);
        }

        // stable: equal relevance keeps registration order
        candidates.sort_by(|a, b| {
            b.relevance
                .partial_cmp(&a.relevance)
                .unwrap_or(Ordering::Equal)
        });
        let limit = request.max_agents.unwrap_or(self.max_agents);
        let total = candidates.len();
        candidates.truncate(limit);

        let reason = match candidates.first() {
            Some(top) => format!(
                "{} of {} matching agents selected; top '{}' matched {}",
                candidates.len(),
                total,
                top.agent_id,
                top.matched.join(", ")
            ),
            None => format!("{} agents matched but max_agents is 0", total),
        };

        let agents = candidates
            .into_iter()
            .map(|c| {
                let mut config = Map::new();
                config.insert("relevance".to_string(), json!(c.relevance));
                config.insert("matched_keywords".to_string(), json!(c.matched));
                AgentPlanEntry {
                    agent_id: c.agent_id,
                    config,
                }
            })
            .collect::<Vec<_>>();

        info!(agents = ?agents.iter().map(|a| &a.agent_id).collect::<Vec<_>>(), "Dispatch plan built");
        DispatchPlan { agents, reason }
    }

    /// Scores `options.signals` and picks the confidence tier. Emits exactly
    /// one telemetry event.
    pub fn apply_fallback_rules(&self, options: &FallbackOptions) -> FallbackDecision {
        let breakdown = self.scoring.compute_score(&options.signals);
        let route = Route::for_score(
            breakdown.score,
            self.scoring.auto_apply_threshold(),
            self.scoring.llm_fallback_threshold(),
        );
        let prompt_id = options
            .prompt_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        self.telemetry.emit(&RouteTelemetryEvent::route_decision(
            prompt_id.clone(),
            breakdown.score,
            route,
            breakdown.level,
            options.user_intent.clone(),
        ));

        info!(
            prompt_id = %prompt_id,
            score = breakdown.score,
            level = %breakdown.level,
            route = %route,
            "Route decided"
        );

        FallbackDecision {
            score: breakdown.score,
            level: breakdown.level,
            route,
            label: route.label().to_string(),
            breakdown: breakdown.breakdown,
            prompt_id,
        }
    }

    /// Derives keyword and profile signals from a plan for callers without
    /// an upstream signal source.
    pub fn estimate_signals(
        &self,
        plan: &DispatchPlan,
        metadata: &WorkspaceDescriptor,
        historical_success: f64,
        complexity: f64,
    ) -> ScoreSignals {
        let (keywords_score, profile_match_score) = match plan.agents.first() {
            None => (0.0, 0.0),
            Some(top) => {
                let hits = top.matched_keywords().len() as f64;
                let profile = match self.agents.get(&top.agent_id) {
                    Some(agent) if agent.profile().declares_language(&metadata.language) => 1.0,
                    Some(agent) if !agent.profile().restricts_languages() => 0.5,
                    _ => 0.0,
                };
                ((hits / 2.0).min(1.0), profile)
            }
        };

        ScoreSignals {
            keywords_score,
            profile_match_score,
            historical_success_score: historical_success,
            complexity_estimate: complexity,
        }
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("agents", &self.agents)
            .field("scoring", &self.scoring)
            .field("max_agents", &self.max_agents)
            .finish()
    }
}

/// Lowercase word tokens; `+ # . _ -` stay inside a token (`c++`, `node.js`).
pub fn tokenize(text: &str) -> Vec<String> {
    static TOKEN_REGEX: OnceLock<Regex> = OnceLock::new();
    let re = TOKEN_REGEX
        .get_or_init(|| Regex::new(r"[a-z0-9][a-z0-9+#._-]*").expect("Invalid token regex"));

    let lowered = text.to_lowercase();
    re.find_iter(&lowered).map(|m| m.as_str().to_string()).collect()
}

fn matched_keywords(keywords: &[String], intent: &str, tokens: &[String]) -> Vec<String> {
    let mut matched: Vec<String> = Vec::new();
    for keyword in keywords {
        let keyword = keyword.trim().to_lowercase();
        if keyword.is_empty() || matched.contains(&keyword) {
            continue;
        }

        let hit = if keyword.contains(char::is_whitespace) {
            intent.contains(&keyword)
        } else {
            tokens.iter().any(|token| token_matches(token, &keyword))
        };
        if hit {
            matched.push(keyword);
        }
    }
    matched
}

fn token_matches(token: &str, keyword: &str) -> bool {
    if token == keyword {
        return true;
    }
    token.chars().count() >= FUZZY_MIN_TOKEN_LEN
        && strsim::jaro_winkler(token, keyword) >= FUZZY_MATCH_THRESHOLD
}
