//! Route decision telemetry
//!
//! One JSON line per routing decision. Writes are best-effort: a sink that
//! cannot open or write its file logs a warning and keeps going.

use crate::routing::Route;
use crate::scoring::ConfidenceLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

pub const ROUTE_DECISION_EVENT: &str = "route_decision";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteTelemetryEvent {
    pub timestamp: DateTime<Utc>,
    pub event: String,
    pub prompt_id: String,
    pub score: f64,
    pub route: Route,
    pub user_intent: String,
    pub level: ConfidenceLevel,
}

impl RouteTelemetryEvent {
    pub fn route_decision(
        prompt_id: impl Into<String>,
        score: f64,
        route: Route,
        level: ConfidenceLevel,
        user_intent: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            event: ROUTE_DECISION_EVENT.to_string(),
            prompt_id: prompt_id.into(),
            score,
            route,
            user_intent: user_intent.into(),
            level,
        }
    }
}

pub trait TelemetrySink: Send + Sync {
    fn emit(&self, event: &RouteTelemetryEvent);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTelemetry;

impl TelemetrySink for NoopTelemetry {
    fn emit(&self, event: &RouteTelemetryEvent) {
        debug!(prompt_id = %event.prompt_id, "Telemetry disabled, dropping event");
    }
}

/// Appends events to a JSONL file
pub struct JsonlTelemetry {
    path: PathBuf,
    writer: Option<Mutex<BufWriter<File>>>,
}

impl JsonlTelemetry {
    /// Opens (creating parent directories) `path` for appending. Failure to
    /// open leaves the sink inert.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let writer = match open_append(&path) {
            Ok(file) => Some(Mutex::new(BufWriter::new(file))),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to open telemetry file");
                None
            }
        };
        Self { path, writer }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_active(&self) -> bool {
        self.writer.is_some()
    }
}

impl TelemetrySink for JsonlTelemetry {
    fn emit(&self, event: &RouteTelemetryEvent) {
        let Some(writer) = &self.writer else {
            return;
        };

        let line = match serde_json::to_string(event) {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "Failed to serialize telemetry event");
                return;
            }
        };

        let Ok(mut writer) = writer.lock() else {
            warn!("Telemetry writer lock poisoned");
            return;
        };
        if let Err(e) = writeln!(writer, "{}", line).and_then(|_| writer.flush()) {
            warn!(path = %self.path.display(), error = %e, "Failed to write telemetry event");
        }
    }
}

impl std::fmt::Debug for JsonlTelemetry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonlTelemetry")
            .field("path", &self.path)
            .field("active", &self.is_active())
            .finish()
    }
}

pub(crate) fn open_append(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    OpenOptions::new().create(true).append(true).open(path)
}
