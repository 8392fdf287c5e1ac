//! Tunable weights for lifecycle phase scoring
//!
//! Every number the classifier uses lives here. Thresholds pick which rules
//! fire; points decide how much each fired rule is worth. A phase's
//! normaliser is the most points it could ever collect, so confidence stays
//! comparable when points are retuned.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseRules {
    /// Below this many files a workspace looks freshly started
    pub small_file_count: usize,
    /// Below this many files (but not small) discovery still gets partial credit
    pub medium_file_count: usize,
    /// Upper bound of the file range that favours `build`
    pub large_file_count: usize,
    /// Above this many files `ship` gets credit
    pub ship_file_count: usize,
    /// Test count at which `ship` gets credit (and recommendations stop nagging)
    pub min_ship_tests: usize,
    /// Upper bound of the test range that favours `build`
    pub max_build_tests: usize,
    pub dependency_threshold: usize,
    pub early_commit_count: usize,
    pub mature_commit_count: usize,
    /// Ceiling on computed confidence; only an explicit override reaches 1.0
    pub max_confidence: f64,
    pub points: PhasePoints,
}

impl Default for PhaseRules {
    fn default() -> Self {
        Self {
            small_file_count: 20,
            medium_file_count: 50,
            large_file_count: 200,
            ship_file_count: 50,
            min_ship_tests: 5,
            max_build_tests: 20,
            dependency_threshold: 5,
            early_commit_count: 10,
            mature_commit_count: 100,
            max_confidence: 0.9,
            points: PhasePoints::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhasePoints {
    pub discovery_small_files: u32,
    pub discovery_medium_files: u32,
    pub discovery_no_tests: u32,
    pub discovery_no_ci: u32,
    pub discovery_no_container: u32,
    pub discovery_early_history: u32,
    pub discovery_few_dependencies: u32,

    pub build_mid_files: u32,
    pub build_some_tests: u32,
    pub build_ci: u32,
    pub build_dependencies: u32,
    pub build_active_history: u32,

    pub ship_many_files: u32,
    pub ship_tests: u32,
    pub ship_ci: u32,
    pub ship_container: u32,
    pub ship_deploy: u32,
    pub ship_readme: u32,
    pub ship_mature_history: u32,
}

impl Default for PhasePoints {
    fn default() -> Self {
        Self {
            discovery_small_files: 3,
            discovery_medium_files: 1,
            discovery_no_tests: 2,
            discovery_no_ci: 1,
            discovery_no_container: 1,
            discovery_early_history: 1,
            discovery_few_dependencies: 1,

            build_mid_files: 2,
            build_some_tests: 2,
            build_ci: 2,
            build_dependencies: 1,
            build_active_history: 1,

            ship_many_files: 2,
            ship_tests: 2,
            ship_ci: 1,
            ship_container: 2,
            ship_deploy: 2,
            ship_readme: 1,
            ship_mature_history: 1,
        }
    }
}

impl PhasePoints {
    pub fn discovery_max(&self) -> u32 {
        self.discovery_small_files.max(self.discovery_medium_files)
            + self.discovery_no_tests
            + self.discovery_no_ci
            + self.discovery_no_container
            + self.discovery_early_history
            + self.discovery_few_dependencies
    }

    pub fn build_max(&self) -> u32 {
        self.build_mid_files
            + self.build_some_tests
            + self.build_ci
            + self.build_dependencies
            + self.build_active_history
    }

    pub fn ship_max(&self) -> u32 {
        self.ship_many_files
            + self.ship_tests
            + self.ship_ci
            + self.ship_container
            + self.ship_deploy
            + self.ship_readme
            + self.ship_mature_history
    }
}
