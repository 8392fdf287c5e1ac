//! Structured logging setup
//!
//! Wires the `tracing` macros used across the crate to a `tracing-subscriber`
//! registry. Output goes to stderr so that command output on stdout stays
//! machine-readable (JSON/YAML formats are piped into other tools).
//!
//! Configuration sources, highest priority first:
//! - `RUST_LOG` (standard directive syntax, replaces our defaults entirely)
//! - an explicit [`LoggingConfig`]
//! - `PATHFINDER_LOG_LEVEL` / `PATHFINDER_LOG_JSON` via [`init_from_env`]
//!
//! ```no_run
//! use pathfinder::util::logging;
//!
//! logging::init_from_env();
//! tracing::info!(workspace = "/tmp/app", "Scanning workspace");
//! ```

use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Logging options
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum level for `pathfinder` targets
    pub level: Level,

    /// Emit one JSON object per line instead of the compact console format
    pub use_json: bool,

    /// Include the module target (e.g. `pathfinder::routing`)
    pub include_target: bool,

    /// Include file and line number
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            use_json: false,
            include_target: true,
            include_location: false,
        }
    }
}

impl LoggingConfig {
    pub fn with_level(level: Level) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    /// JSON output with source locations, for log shipping
    pub fn production() -> Self {
        Self {
            level: Level::INFO,
            use_json: true,
            include_target: true,
            include_location: true,
        }
    }
}

/// Parses a log level, falling back to INFO on unknown input.
///
/// ```
/// use pathfinder::util::logging::parse_level;
/// use tracing::Level;
///
/// assert_eq!(parse_level("debug"), Level::DEBUG);
/// assert_eq!(parse_level("WARN"), Level::WARN);
/// assert_eq!(parse_level("loud"), Level::INFO);
/// ```
pub fn parse_level(level_str: &str) -> Level {
    match level_str.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!(
                "Invalid log level '{}', defaulting to INFO. Valid levels: trace, debug, info, warn, error",
                level_str
            );
            Level::INFO
        }
    }
}

fn build_filter(level: Level) -> EnvFilter {
    if env::var("RUST_LOG").is_ok() {
        return EnvFilter::from_default_env();
    }

    let mut filter = EnvFilter::new("warn");
    for directive in [
        format!("pathfinder={}", level),
        "genai=warn".to_string(),
        "hyper=warn".to_string(),
        "reqwest=warn".to_string(),
    ] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }
    filter
}

/// Installs the global subscriber. Only the first call has any effect.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let filter = build_filter(config.level);

        if config.use_json {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(std::io::stderr)
                        .with_target(config.include_target)
                        .with_file(config.include_location)
                        .with_line_number(config.include_location),
                )
                .init();
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(config.include_target)
                        .with_file(config.include_location)
                        .with_line_number(config.include_location),
                )
                .init();
        }
    });
}

pub fn init_default() {
    init_logging(LoggingConfig::default());
}

/// Reads `PATHFINDER_LOG_LEVEL` (default `info`) and `PATHFINDER_LOG_JSON`.
pub fn init_from_env() {
    let level_str = env::var("PATHFINDER_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let use_json = env::var("PATHFINDER_LOG_JSON")
        .ok()
        .and_then(|v| v.parse::<bool>().ok())
        .unwrap_or(false);

    init_logging(LoggingConfig {
        level: parse_level(&level_str),
        use_json,
        ..Default::default()
    });
}
