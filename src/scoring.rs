//! Confidence scoring for route decisions
//!
//! Four caller-normalised signals are combined into one weighted score and
//! bucketed into a [`ConfidenceLevel`]. Inputs are expected in `[0, 1]` but
//! are not validated; out-of-range inputs produce out-of-range scores.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_AUTO_APPLY_THRESHOLD: f64 = 0.8;
pub const DEFAULT_LLM_FALLBACK_THRESHOLD: f64 = 0.5;

/// Allowed drift of the weight sum from 1.0
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceLevel::High => "high",
            ConfidenceLevel::Medium => "medium",
            ConfidenceLevel::Low => "low",
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreSignals {
    pub keywords_score: f64,
    pub profile_match_score: f64,
    pub historical_success_score: f64,
    pub complexity_estimate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub keywords: f64,
    pub profile_match: f64,
    pub historical_success: f64,
    pub complexity: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            keywords: 0.4,
            profile_match: 0.3,
            historical_success: 0.2,
            complexity: 0.1,
        }
    }
}

impl ScoreWeights {
    pub fn sum(&self) -> f64 {
        self.keywords + self.profile_match + self.historical_success + self.complexity
    }

    /// Every weight must be positive and the weights must sum to 1.
    pub fn validate(&self) -> Result<(), String> {
        let weights = [
            ("keywords", self.keywords),
            ("profile_match", self.profile_match),
            ("historical_success", self.historical_success),
            ("complexity", self.complexity),
        ];
        for (name, value) in weights {
            if value.is_nan() || value <= 0.0 {
                return Err(format!("weight '{}' must be positive, got {}", name, value));
            }
        }

        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(format!("weights must sum to 1.0, got {}", sum));
        }
        Ok(())
    }
}

/// Weighted components; each entry is `weight * input`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponents {
    pub keywords: f64,
    pub profile_match: f64,
    pub historical_success: f64,
    pub complexity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub score: f64,
    pub level: ConfidenceLevel,
    pub breakdown: ScoreComponents,
}

#[derive(Debug, Clone)]
pub struct ScoringEngine {
    weights: ScoreWeights,
    auto_apply_threshold: f64,
    llm_fallback_threshold: f64,
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::new(
            ScoreWeights::default(),
            DEFAULT_AUTO_APPLY_THRESHOLD,
            DEFAULT_LLM_FALLBACK_THRESHOLD,
        )
    }
}

impl ScoringEngine {
    pub fn new(weights: ScoreWeights, auto_apply_threshold: f64, llm_fallback_threshold: f64) -> Self {
        Self {
            weights,
            auto_apply_threshold,
            llm_fallback_threshold,
        }
    }

    pub fn weights(&self) -> &ScoreWeights {
        &self.weights
    }

    pub fn auto_apply_threshold(&self) -> f64 {
        self.auto_apply_threshold
    }

    pub fn llm_fallback_threshold(&self) -> f64 {
        self.llm_fallback_threshold
    }

    pub fn compute_score(&self, signals: &ScoreSignals) -> ScoreBreakdown {
        let w = &self.weights;
        let breakdown = ScoreComponents {
            keywords: w.keywords * signals.keywords_score,
            profile_match: w.profile_match * signals.profile_match_score,
            historical_success: w.historical_success * signals.historical_success_score,
            complexity: w.complexity * signals.complexity_estimate,
        };

        let raw = breakdown.keywords
            + breakdown.profile_match
            + breakdown.historical_success
            + breakdown.complexity;
        let score = round4(raw);

        ScoreBreakdown {
            score,
            level: self.level_for(score),
            breakdown,
        }
    }

    /// Lower bounds are inclusive.
    pub fn level_for(&self, score: f64) -> ConfidenceLevel {
        if score >= self.auto_apply_threshold {
            ConfidenceLevel::High
        } else if score >= self.llm_fallback_threshold {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use yare::parameterized;

    fn signals(k: f64, p: f64, h: f64, c: f64) -> ScoreSignals {
        ScoreSignals {
            keywords_score: k,
            profile_match_score: p,
            historical_success_score: h,
            complexity_estimate: c,
        }
    }

    #[test]
    fn test_default_weights_are_valid() {
        assert!(ScoreWeights::default().validate().is_ok());
        assert!((ScoreWeights::default().sum() - 1.0).abs() < WEIGHT_SUM_TOLERANCE);
    }

    #[test]
    fn test_weight_validation_rejects_bad_tables() {
        let zero = ScoreWeights {
            complexity: 0.0,
            keywords: 0.5,
            ..Default::default()
        };
        assert!(zero.validate().unwrap_err().contains("complexity"));

        let heavy = ScoreWeights {
            keywords: 0.9,
            ..Default::default()
        };
        assert!(heavy.validate().unwrap_err().contains("sum"));
    }

    #[test]
    fn test_breakdown_holds_weighted_components() {
        let result = ScoringEngine::default().compute_score(&signals(1.0, 1.0, 0.5, 0.0));
        assert!((result.breakdown.keywords - 0.4).abs() < 1e-9);
        assert!((result.breakdown.profile_match - 0.3).abs() < 1e-9);
        assert!((result.breakdown.historical_success - 0.1).abs() < 1e-9);
        assert_eq!(result.breakdown.complexity, 0.0);
        assert_eq!(result.score, 0.8);
        assert_eq!(result.level, ConfidenceLevel::High);
    }

    #[parameterized(
        all_max = { signals(1.0, 1.0, 1.0, 1.0), 1.0, ConfidenceLevel::High },
        all_zero = { signals(0.0, 0.0, 0.0, 0.0), 0.0, ConfidenceLevel::Low },
        exactly_fallback = { signals(1.0, 0.0, 0.5, 0.0), 0.5, ConfidenceLevel::Medium },
        just_below_fallback = { signals(1.0, 0.0, 0.0, 0.9), 0.49, ConfidenceLevel::Low },
        just_below_auto = { signals(1.0, 1.0, 0.0, 0.9), 0.79, ConfidenceLevel::Medium },
    )]
    fn test_score_levels(input: ScoreSignals, expected: f64, level: ConfidenceLevel) {
        let result = ScoringEngine::default().compute_score(&input);
        assert_eq!(result.score, expected);
        assert_eq!(result.level, level);
    }

    #[test]
    fn test_score_is_monotone_in_each_input() {
        let engine = ScoringEngine::default();
        let steps: Vec<f64> = (0..=10).map(|i| i as f64 / 10.0).collect();
        let base = [0.3, 0.6, 0.2, 0.9];

        for dim in 0..4 {
            let mut previous = f64::NEG_INFINITY;
            for &step in &steps {
                let mut values = base;
                values[dim] = step;
                let score = engine
                    .compute_score(&signals(values[0], values[1], values[2], values[3]))
                    .score;
                assert!(score >= previous, "dimension {} not monotone at {}", dim, step);
                previous = score;
            }
        }
    }

    #[test]
    fn test_score_stays_in_unit_interval() {
        let engine = ScoringEngine::default();
        let steps = [0.0, 0.25, 0.5, 0.75, 1.0];
        for &k in &steps {
            for &p in &steps {
                for &h in &steps {
                    for &c in &steps {
                        let result = engine.compute_score(&signals(k, p, h, c));
                        assert!((0.0..=1.0).contains(&result.score));
                    }
                }
            }
        }
    }

    #[test]
    fn test_out_of_range_inputs_are_not_clamped() {
        let result = ScoringEngine::default().compute_score(&signals(2.0, 0.0, 0.0, 0.0));
        assert_eq!(result.score, 0.8);
    }

    #[test]
    fn test_custom_thresholds_drive_level() {
        let engine = ScoringEngine::new(ScoreWeights::default(), 0.6, 0.3);
        assert_eq!(engine.level_for(0.6), ConfidenceLevel::High);
        assert_eq!(engine.level_for(0.3), ConfidenceLevel::Medium);
        assert_eq!(engine.level_for(0.29), ConfidenceLevel::Low);
    }
}
