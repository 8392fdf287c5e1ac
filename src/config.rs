//! Configuration management for pathfinder
//!
//! Settings live in a TOML file. Every field is optional; missing fields take
//! the defaults below, and a file that cannot be read, parsed, or validated
//! is replaced wholesale by the defaults (with a warning) so routing always
//! has a usable configuration.
//!
//! # File resolution
//!
//! 1. the explicit path (`--config`)
//! 2. `PATHFINDER_CONFIG`
//! 3. `<config_dir>/pathfinder/config.toml`
//!
//! # Environment overrides
//!
//! Applied after the file is loaded, then re-validated:
//! - `PATHFINDER_TELEMETRY`: enable/disable telemetry (true|false)
//! - `PATHFINDER_AUTO_APPLY_THRESHOLD`
//! - `PATHFINDER_LLM_FALLBACK_THRESHOLD`
//!
//! # Example
//!
//! ```toml
//! auto_apply_threshold = 0.85
//! max_agents = 2
//!
//! [weights]
//! keywords = 0.5
//! profile_match = 0.2
//! historical_success = 0.2
//! complexity = 0.1
//!
//! [llm]
//! provider = "ollama"
//! model = "qwen2.5-coder:7b"
//!
//! [[agents]]
//! id = "api-reviewer"
//! description = "Reviews HTTP API changes"
//! keywords = ["endpoint", "api", "route"]
//! capabilities = ["api"]
//! persona_file = "personas/api-reviewer.md"
//! ```

use crate::agents::PersonaDefinition;
use crate::llm::Provider;
use crate::phase::PhaseRules;
use crate::scoring::{
    ScoreWeights, ScoringEngine, DEFAULT_AUTO_APPLY_THRESHOLD, DEFAULT_LLM_FALLBACK_THRESHOLD,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

pub const CONFIG_ENV: &str = "PATHFINDER_CONFIG";
pub const TELEMETRY_ENV: &str = "PATHFINDER_TELEMETRY";
pub const AUTO_APPLY_THRESHOLD_ENV: &str = "PATHFINDER_AUTO_APPLY_THRESHOLD";
pub const LLM_FALLBACK_THRESHOLD_ENV: &str = "PATHFINDER_LLM_FALLBACK_THRESHOLD";

const APP_DIR: &str = "pathfinder";
const CONFIG_FILE: &str = "config.toml";
const DEFAULT_MAX_AGENTS: usize = 3;
const DEFAULT_OLLAMA_MODEL: &str = "qwen2.5-coder:7b";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub provider: Provider,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: Provider::Ollama,
            model: DEFAULT_OLLAMA_MODEL.to_string(),
            timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    pub auto_apply_threshold: f64,
    pub llm_fallback_threshold: f64,
    pub telemetry_enabled: bool,
    pub telemetry_path: PathBuf,
    pub history_path: PathBuf,
    pub max_agents: usize,
    pub weights: ScoreWeights,
    pub phase: PhaseRules,
    pub llm: LlmSettings,
    pub agents: Vec<PersonaDefinition>,
    /// File this configuration was loaded from; relative persona files resolve against its directory
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        let data_dir = default_data_dir();
        Self {
            auto_apply_threshold: DEFAULT_AUTO_APPLY_THRESHOLD,
            llm_fallback_threshold: DEFAULT_LLM_FALLBACK_THRESHOLD,
            telemetry_enabled: true,
            telemetry_path: data_dir.join("telemetry.jsonl"),
            history_path: data_dir.join("history.jsonl"),
            max_agents: DEFAULT_MAX_AGENTS,
            weights: ScoreWeights::default(),
            phase: PhaseRules::default(),
            llm: LlmSettings::default(),
            agents: Vec::new(),
            source: None,
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(env::temp_dir)
        .join(APP_DIR)
}

/// `<config_dir>/pathfinder/config.toml`, when the platform has a config dir
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

impl RouterConfig {
    /// Resolves, reads and validates the configuration. Never fails: any
    /// problem is logged and the defaults are used instead.
    pub fn load(explicit: Option<&Path>) -> Self {
        let (path, required) = match explicit {
            Some(path) => (Some(path.to_path_buf()), true),
            None => match env::var(CONFIG_ENV) {
                Ok(path) if !path.trim().is_empty() => (Some(PathBuf::from(path)), true),
                _ => (default_config_path(), false),
            },
        };

        let mut config = match path {
            Some(path) if required || path.exists() => match Self::from_file(&path) {
                Ok(config) => {
                    info!(path = %path.display(), "Loaded configuration");
                    config
                }
                Err(e) => {
                    warn!(error = %e, "Using default configuration");
                    Self::default()
                }
            },
            _ => {
                debug!("No configuration file found, using defaults");
                Self::default()
            }
        };

        // The file (or default) config is already valid, so only the
        // threshold overrides can break it.
        let thresholds = (config.auto_apply_threshold, config.llm_fallback_threshold);
        config.apply_env_overrides();
        if let Err(e) = config.validate() {
            warn!(error = %e, "Ignoring threshold overrides from the environment");
            (config.auto_apply_threshold, config.llm_fallback_threshold) = thresholds;
        }
        config
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&content).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Overrides fields from `PATHFINDER_*` variables. Unparseable values are
    /// ignored with a warning.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(raw) = env::var(TELEMETRY_ENV) {
            match parse_bool(&raw) {
                Some(enabled) => self.telemetry_enabled = enabled,
                None => warn!(var = TELEMETRY_ENV, value = %raw, "Ignoring invalid boolean"),
            }
        }
        if let Some(value) = env_f64(AUTO_APPLY_THRESHOLD_ENV) {
            self.auto_apply_threshold = value;
        }
        if let Some(value) = env_f64(LLM_FALLBACK_THRESHOLD_ENV) {
            self.llm_fallback_threshold = value;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("auto_apply_threshold", self.auto_apply_threshold),
            ("llm_fallback_threshold", self.llm_fallback_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ValidationFailed(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }

        if self.auto_apply_threshold <= self.llm_fallback_threshold {
            return Err(ConfigError::ValidationFailed(format!(
                "auto_apply_threshold ({}) must be greater than llm_fallback_threshold ({})",
                self.auto_apply_threshold, self.llm_fallback_threshold
            )));
        }

        self.weights
            .validate()
            .map_err(ConfigError::ValidationFailed)?;

        if self.max_agents == 0 {
            return Err(ConfigError::ValidationFailed(
                "max_agents must be at least 1".to_string(),
            ));
        }

        if !(self.phase.max_confidence > 0.0 && self.phase.max_confidence <= 1.0) {
            return Err(ConfigError::ValidationFailed(format!(
                "phase.max_confidence must be within (0, 1], got {}",
                self.phase.max_confidence
            )));
        }

        if self.llm.timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "llm.timeout_secs must be at least 1 second".to_string(),
            ));
        }

        let mut ids = HashSet::new();
        for agent in &self.agents {
            if agent.id.trim().is_empty() {
                return Err(ConfigError::ValidationFailed(
                    "every [[agents]] entry needs an id".to_string(),
                ));
            }
            if !ids.insert(agent.id.as_str()) {
                return Err(ConfigError::ValidationFailed(format!(
                    "duplicate agent id: {}",
                    agent.id
                )));
            }
        }

        Ok(())
    }

    pub fn scoring_engine(&self) -> ScoringEngine {
        ScoringEngine::new(
            self.weights,
            self.auto_apply_threshold,
            self.llm_fallback_threshold,
        )
    }

    /// Directory relative persona files resolve against
    pub fn base_dir(&self) -> Option<&Path> {
        self.source.as_deref().and_then(Path::parent)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn env_f64(var: &str) -> Option<f64> {
    let raw = env::var(var).ok()?;
    match raw.trim().parse::<f64>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(var, value = %raw, "Ignoring invalid number");
            None
        }
    }
}

impl fmt::Display for RouterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Pathfinder Configuration:")?;
        match &self.source {
            Some(path) => writeln!(f, "  Source: {}", path.display())?,
            None => writeln!(f, "  Source: defaults")?,
        }
        writeln!(f, "  Auto-apply Threshold: {}", self.auto_apply_threshold)?;
        writeln!(f, "  LLM Fallback Threshold: {}", self.llm_fallback_threshold)?;
        writeln!(
            f,
            "  Weights: keywords={} profile_match={} historical_success={} complexity={}",
            self.weights.keywords,
            self.weights.profile_match,
            self.weights.historical_success,
            self.weights.complexity
        )?;
        writeln!(f, "  Max Agents: {}", self.max_agents)?;
        writeln!(f, "  Telemetry Enabled: {}", self.telemetry_enabled)?;
        writeln!(f, "  Telemetry Path: {}", self.telemetry_path.display())?;
        writeln!(f, "  History Path: {}", self.history_path.display())?;
        writeln!(
            f,
            "  LLM: {} ({}, {}s timeout)",
            self.llm.provider, self.llm.model, self.llm.timeout_secs
        )?;
        if self.agents.is_empty() {
            writeln!(f, "  Persona Agents: none")?;
        } else {
            let ids: Vec<&str> = self.agents.iter().map(|a| a.id.as_str()).collect();
            writeln!(f, "  Persona Agents: {}", ids.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    /// Sets an environment variable for the guard's lifetime
    struct EnvGuard {
        key: String,
        old_value: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &str, value: &str) -> Self {
            let old_value = env::var(key).ok();
            env::set_var(key, value);
            Self {
                key: key.to_string(),
                old_value,
            }
        }

        fn unset(key: &str) -> Self {
            let old_value = env::var(key).ok();
            env::remove_var(key);
            Self {
                key: key.to_string(),
                old_value,
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.old_value {
                Some(v) => env::set_var(&self.key, v),
                None => env::remove_var(&self.key),
            }
        }
    }

    fn clean_env() -> Vec<EnvGuard> {
        vec![
            EnvGuard::unset(CONFIG_ENV),
            EnvGuard::unset(TELEMETRY_ENV),
            EnvGuard::unset(AUTO_APPLY_THRESHOLD_ENV),
            EnvGuard::unset(LLM_FALLBACK_THRESHOLD_ENV),
        ]
    }

    fn write_config(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("config.toml");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = RouterConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.auto_apply_threshold, 0.8);
        assert_eq!(config.llm_fallback_threshold, 0.5);
        assert_eq!(config.max_agents, 3);
        assert!(config.telemetry_enabled);
        assert!(config.telemetry_path.ends_with("pathfinder/telemetry.jsonl"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
max_agents = 2

[phase]
small_file_count = 10

[llm]
provider = "claude"
model = "claude-sonnet"

[[agents]]
id = "api-reviewer"
keywords = ["endpoint"]
persona_file = "personas/api.md"
"#,
        );

        let config = RouterConfig::from_file(&path).unwrap();
        assert_eq!(config.max_agents, 2);
        assert_eq!(config.auto_apply_threshold, 0.8);
        assert_eq!(config.phase.small_file_count, 10);
        assert_eq!(config.phase.medium_file_count, 50);
        assert_eq!(config.llm.provider, Provider::Claude);
        assert_eq!(config.llm.timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
        assert_eq!(config.agents[0].id, "api-reviewer");
        assert_eq!(config.base_dir(), Some(dir.path()));
    }

    #[test]
    fn test_from_file_errors() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            RouterConfig::from_file(&dir.path().join("missing.toml")),
            Err(ConfigError::Read { .. })
        ));

        let broken = write_config(&dir, "max_agents = [");
        assert!(matches!(
            RouterConfig::from_file(&broken),
            Err(ConfigError::Parse { .. })
        ));

        let invalid = write_config(&dir, "auto_apply_threshold = 0.4\n");
        assert!(matches!(
            RouterConfig::from_file(&invalid),
            Err(ConfigError::ValidationFailed(_))
        ));
    }

    #[test]
    fn test_validation_rules() {
        let mut config = RouterConfig::default();
        config.weights.keywords = 0.6;
        assert!(config.validate().is_err());

        let mut config = RouterConfig::default();
        config.llm_fallback_threshold = config.auto_apply_threshold;
        assert!(config.validate().is_err());

        let mut config = RouterConfig::default();
        config.max_agents = 0;
        assert!(config.validate().is_err());

        let mut config = RouterConfig::default();
        config.agents = vec![
            PersonaDefinition {
                id: "dup".to_string(),
                ..Default::default()
            },
            PersonaDefinition {
                id: "dup".to_string(),
                ..Default::default()
            },
        ];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate agent id"));
    }

    #[test]
    #[serial]
    fn test_load_falls_back_on_invalid_file() {
        let _env = clean_env();
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "auto_apply_threshold = 0.3\nllm_fallback_threshold = 0.6\n");

        let config = RouterConfig::load(Some(&path));
        assert_eq!(config.auto_apply_threshold, 0.8);
        assert!(config.source.is_none());
    }

    #[test]
    #[serial]
    fn test_load_missing_explicit_file_uses_defaults() {
        let _env = clean_env();
        let dir = TempDir::new().unwrap();
        let config = RouterConfig::load(Some(&dir.path().join("nope.toml")));
        assert_eq!(config, RouterConfig::default());
    }

    #[test]
    #[serial]
    fn test_load_from_env_path() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "max_agents = 5\n");
        let mut guards = clean_env();
        guards.push(EnvGuard::set(CONFIG_ENV, path.to_str().unwrap()));

        let config = RouterConfig::load(None);
        assert_eq!(config.max_agents, 5);
        assert_eq!(config.source.as_deref(), Some(path.as_path()));
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        let mut guards = clean_env();
        guards.push(EnvGuard::set(TELEMETRY_ENV, "false"));
        guards.push(EnvGuard::set(AUTO_APPLY_THRESHOLD_ENV, "0.9"));
        guards.push(EnvGuard::set(LLM_FALLBACK_THRESHOLD_ENV, "0.4"));

        let dir = TempDir::new().unwrap();
        let config = RouterConfig::load(Some(&dir.path().join("nope.toml")));
        assert!(!config.telemetry_enabled);
        assert_eq!(config.auto_apply_threshold, 0.9);
        assert_eq!(config.llm_fallback_threshold, 0.4);
    }

    #[test]
    #[serial]
    fn test_invalid_threshold_override_keeps_file_config() {
        let mut guards = clean_env();
        guards.push(EnvGuard::set(LLM_FALLBACK_THRESHOLD_ENV, "0.95"));

        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "max_agents = 7\nauto_apply_threshold = 0.85\n");
        let config = RouterConfig::load(Some(&path));
        assert_eq!(config.max_agents, 7);
        assert_eq!(config.auto_apply_threshold, 0.85);
        assert_eq!(config.llm_fallback_threshold, 0.5);
        assert_eq!(config.source.as_deref(), Some(path.as_path()));
    }

    #[test]
    #[serial]
    fn test_telemetry_opt_out_survives_invalid_threshold_override() {
        let mut guards = clean_env();
        guards.push(EnvGuard::set(TELEMETRY_ENV, "false"));
        guards.push(EnvGuard::set(LLM_FALLBACK_THRESHOLD_ENV, "0.95"));

        let dir = TempDir::new().unwrap();
        let config = RouterConfig::load(Some(&dir.path().join("nope.toml")));
        assert!(!config.telemetry_enabled);
        assert_eq!(config.auto_apply_threshold, 0.8);
        assert_eq!(config.llm_fallback_threshold, 0.5);
    }

    #[test]
    #[serial]
    fn test_unparseable_env_values_are_ignored() {
        let mut guards = clean_env();
        guards.push(EnvGuard::set(TELEMETRY_ENV, "maybe"));
        guards.push(EnvGuard::set(AUTO_APPLY_THRESHOLD_ENV, "high"));

        let mut config = RouterConfig::default();
        config.apply_env_overrides();
        assert!(config.telemetry_enabled);
        assert_eq!(config.auto_apply_threshold, 0.8);
    }

    #[test]
    fn test_config_display() {
        let display = RouterConfig::default().to_string();
        assert!(display.contains("Pathfinder Configuration:"));
        assert!(display.contains("Source: defaults"));
        assert!(display.contains("Persona Agents: none"));
    }
}
