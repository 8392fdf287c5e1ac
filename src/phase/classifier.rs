use super::signals::measure;
use super::{Phase, PhaseHints, PhaseRules, PhaseScores, PhaseSignals, PhaseVerdict};
use crate::workspace::{validate_workspace, ScanError};
use std::path::Path;
use tracing::{debug, info};

const WARNING_PREFIX: &str = "warning: ";

pub struct PhaseClassifier {
    rules: PhaseRules,
    count_commits: bool,
}

impl Default for PhaseClassifier {
    fn default() -> Self {
        Self::new(PhaseRules::default())
    }
}

impl PhaseClassifier {
    pub fn new(rules: PhaseRules) -> Self {
        Self {
            rules,
            count_commits: true,
        }
    }

    /// Skips the `git rev-list` probe; commit count is reported as 0.
    pub fn without_history(mut self) -> Self {
        self.count_commits = false;
        self
    }

    pub fn rules(&self) -> &PhaseRules {
        &self.rules
    }

    /// Measures `workspace_path` as it is right now and classifies it.
    pub fn detect_phase(
        &self,
        workspace_path: &Path,
        hints: Option<&PhaseHints>,
    ) -> Result<PhaseVerdict, ScanError> {
        validate_workspace(workspace_path)?;
        let signals = measure(workspace_path, self.count_commits);
        let verdict = self.classify(signals, hints);

        info!(
            workspace = %workspace_path.display(),
            phase = %verdict.phase,
            confidence = verdict.confidence,
            "Phase detected"
        );
        Ok(verdict)
    }

    /// Classifies already measured signals.
    pub fn classify(&self, signals: PhaseSignals, hints: Option<&PhaseHints>) -> PhaseVerdict {
        if let Some(phase) = hints.and_then(|h| h.phase) {
            debug!(%phase, "Phase forced by hint");
            let recommendations = self.recommendations(phase, &signals);
            return PhaseVerdict {
                phase,
                confidence: 1.0,
                scores: PhaseScores::default(),
                signals,
                recommendations,
            };
        }

        let scores = self.score(&signals);
        let phase = pick_phase(&scores);
        let confidence = self.confidence(phase, &scores);
        let recommendations = self.recommendations(phase, &signals);

        debug!(?scores, %phase, confidence, "Phase scored");

        PhaseVerdict {
            phase,
            confidence,
            scores,
            signals,
            recommendations,
        }
    }

    pub fn score(&self, s: &PhaseSignals) -> PhaseScores {
        let r = &self.rules;
        let p = &r.points;
        let mut scores = PhaseScores::default();

        if s.file_count < r.small_file_count {
            scores.discovery += p.discovery_small_files;
        } else if s.file_count < r.medium_file_count {
            scores.discovery += p.discovery_medium_files;
        }
        if s.test_count == 0 {
            scores.discovery += p.discovery_no_tests;
        }
        if !s.has_ci {
            scores.discovery += p.discovery_no_ci;
        }
        if !s.has_container {
            scores.discovery += p.discovery_no_container;
        }
        if s.commit_count < r.early_commit_count {
            scores.discovery += p.discovery_early_history;
        }
        if s.dependency_count < r.dependency_threshold {
            scores.discovery += p.discovery_few_dependencies;
        }

        if (r.small_file_count..=r.large_file_count).contains(&s.file_count) {
            scores.build += p.build_mid_files;
        }
        if (1..=r.max_build_tests).contains(&s.test_count) {
            scores.build += p.build_some_tests;
        }
        if s.has_ci {
            scores.build += p.build_ci;
        }
        if s.dependency_count >= r.dependency_threshold {
            scores.build += p.build_dependencies;
        }
        if (r.early_commit_count..=r.mature_commit_count).contains(&s.commit_count) {
            scores.build += p.build_active_history;
        }

        if s.file_count > r.ship_file_count {
            scores.ship += p.ship_many_files;
        }
        if s.test_count >= r.min_ship_tests {
            scores.ship += p.ship_tests;
        }
        if s.has_ci {
            scores.ship += p.ship_ci;
        }
        if s.has_container {
            scores.ship += p.ship_container;
        }
        if s.has_deploy {
            scores.ship += p.ship_deploy;
        }
        if s.has_complete_readme {
            scores.ship += p.ship_readme;
        }
        if s.commit_count > r.mature_commit_count {
            scores.ship += p.ship_mature_history;
        }

        scores
    }

    fn confidence(&self, phase: Phase, scores: &PhaseScores) -> f64 {
        let points = &self.rules.points;
        let (raw, max) = match phase {
            Phase::Discovery => (scores.discovery, points.discovery_max()),
            Phase::Build => (scores.build, points.build_max()),
            Phase::Ship => (scores.ship, points.ship_max()),
        };
        if max == 0 {
            return 0.0;
        }
        (raw as f64 / max as f64).min(self.rules.max_confidence)
    }

    fn recommendations(&self, phase: Phase, s: &PhaseSignals) -> Vec<String> {
        let min_tests = self.rules.min_ship_tests;
        let mut out = Vec::new();

        match phase {
            Phase::Discovery => {
                if !s.has_complete_readme {
                    out.push(
                        "Write a README describing the problem, the intended users and how to run the project"
                            .to_string(),
                    );
                }
                if s.test_count == 0 {
                    out.push("Add a first smoke test before the codebase grows".to_string());
                }
            }
            Phase::Build => {
                if !s.has_ci {
                    out.push("Set up CI to run tests on every push".to_string());
                }
                if s.test_count < min_tests {
                    out.push(format!(
                        "Grow the test suite (currently {} test files, aim for at least {})",
                        s.test_count, min_tests
                    ));
                }
                if !s.has_container {
                    out.push("Add a Dockerfile so the build is reproducible".to_string());
                }
            }
            Phase::Ship => {
                if !s.has_ci {
                    out.push(format!(
                        "{}shipping without CI; add a pipeline that gates releases",
                        WARNING_PREFIX
                    ));
                }
                if s.test_count < min_tests {
                    out.push(format!(
                        "{}only {} test files for a shipping project",
                        WARNING_PREFIX, s.test_count
                    ));
                }
                if !s.has_deploy {
                    out.push("Add deployment configuration (e.g. fly.toml, vercel.json, k8s manifests)".to_string());
                }
                if !s.has_complete_readme {
                    out.push("Complete the README with setup, usage and operations notes".to_string());
                }
            }
        }

        out
    }
}

/// Strictly greatest score wins; any tie falls back to `build`.
fn pick_phase(scores: &PhaseScores) -> Phase {
    if scores.discovery > scores.build && scores.discovery > scores.ship {
        Phase::Discovery
    } else if scores.ship > scores.build && scores.ship > scores.discovery {
        Phase::Ship
    } else {
        Phase::Build
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> PhaseClassifier {
        PhaseClassifier::default().without_history()
    }

    #[test]
    fn test_fresh_workspace_is_discovery() {
        let signals = PhaseSignals {
            file_count: 5,
            test_count: 0,
            has_ci: false,
            has_container: false,
            ..Default::default()
        };
        let verdict = classifier().classify(signals, None);

        assert_eq!(verdict.phase, Phase::Discovery);
        assert!(verdict.confidence <= 0.9);
        assert!(verdict.scores.discovery > verdict.scores.build);
    }

    #[test]
    fn test_mature_workspace_is_ship() {
        let signals = PhaseSignals {
            file_count: 80,
            test_count: 5,
            has_ci: true,
            has_container: true,
            has_complete_readme: true,
            ..Default::default()
        };
        let verdict = classifier().classify(signals, None);

        assert_eq!(verdict.phase, Phase::Ship);
        assert!(verdict.confidence <= 0.9);
        assert!(verdict.confidence > 0.0);
    }

    #[test]
    fn test_ci_with_some_tests_is_build() {
        let signals = PhaseSignals {
            file_count: 40,
            test_count: 3,
            has_ci: true,
            dependency_count: 8,
            commit_count: 30,
            ..Default::default()
        };
        let verdict = classifier().classify(signals, None);
        assert_eq!(verdict.phase, Phase::Build);
    }

    #[test]
    fn test_confidence_is_capped() {
        let signals = PhaseSignals {
            file_count: 500,
            test_count: 50,
            has_ci: true,
            has_container: true,
            has_deploy: true,
            has_complete_readme: true,
            dependency_count: 40,
            commit_count: 900,
        };
        let verdict = classifier().classify(signals, None);
        assert_eq!(verdict.phase, Phase::Ship);
        assert_eq!(verdict.confidence, 0.9);
    }

    #[test]
    fn test_hint_overrides_with_full_confidence() {
        let signals = PhaseSignals {
            file_count: 5,
            ..Default::default()
        };
        let verdict = classifier().classify(signals, Some(&PhaseHints::force(Phase::Ship)));

        assert_eq!(verdict.phase, Phase::Ship);
        assert_eq!(verdict.confidence, 1.0);
        assert_eq!(verdict.scores, PhaseScores::default());
    }

    #[test]
    fn test_empty_hint_does_not_override() {
        let verdict = classifier().classify(PhaseSignals::default(), Some(&PhaseHints::default()));
        assert_eq!(verdict.phase, Phase::Discovery);
        assert!(verdict.confidence < 1.0);
    }

    #[test]
    fn test_ties_default_to_build() {
        let tie = PhaseScores {
            discovery: 3,
            build: 3,
            ship: 3,
        };
        assert_eq!(pick_phase(&tie), Phase::Build);

        let zero = PhaseScores::default();
        assert_eq!(pick_phase(&zero), Phase::Build);

        let partial = PhaseScores {
            discovery: 4,
            build: 1,
            ship: 4,
        };
        assert_eq!(pick_phase(&partial), Phase::Build);
    }

    #[test]
    fn test_ship_without_ci_warns() {
        let signals = PhaseSignals {
            file_count: 120,
            test_count: 10,
            has_container: true,
            has_deploy: true,
            has_complete_readme: true,
            ..Default::default()
        };
        let verdict = classifier().classify(signals, None);

        assert_eq!(verdict.phase, Phase::Ship);
        assert!(verdict
            .recommendations
            .iter()
            .any(|r| r.starts_with(WARNING_PREFIX) && r.contains("CI")));
    }

    #[test]
    fn test_recommendations_follow_forced_phase() {
        let verdict = classifier().classify(
            PhaseSignals::default(),
            Some(&PhaseHints::force(Phase::Build)),
        );
        assert!(verdict
            .recommendations
            .iter()
            .any(|r| r.contains("Set up CI")));
    }
}
