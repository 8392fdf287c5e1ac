//! Run history
//!
//! Each pipeline run is appended to a JSONL store and identified by the
//! reference returned from [`RunHistory::record`].

use crate::telemetry::open_append;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
    pub workspace_path: PathBuf,
    pub agent_ids: Vec<String>,
    pub user_intent: String,
    pub success: bool,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRun {
    pub reference: String,
    pub recorded_at: DateTime<Utc>,
    #[serde(flatten)]
    pub record: RunRecord,
}

pub trait RunHistory: Send + Sync {
    /// Persists `record` and returns its reference.
    fn record(&self, record: &RunRecord) -> anyhow::Result<String>;

    /// Share of recorded runs on `workspace` that succeeded, `None` without history.
    fn success_rate(&self, _workspace: &Path) -> Option<f64> {
        None
    }
}

pub struct JsonlRunHistory {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl JsonlRunHistory {
    pub fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let file = open_append(&path)?;
        debug!(path = %path.display(), "Opened run history");
        Ok(Self {
            path,
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every stored run; malformed lines are skipped.
    pub fn load(path: &Path) -> anyhow::Result<Vec<StoredRun>> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        Ok(content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str(line) {
                Ok(run) => Some(run),
                Err(e) => {
                    debug!(error = %e, "Skipping malformed history line");
                    None
                }
            })
            .collect())
    }
}

impl RunHistory for JsonlRunHistory {
    fn record(&self, record: &RunRecord) -> anyhow::Result<String> {
        let stored = StoredRun {
            reference: Uuid::new_v4().to_string(),
            recorded_at: Utc::now(),
            record: record.clone(),
        };
        let line = serde_json::to_string(&stored)?;

        let mut writer = self
            .writer
            .lock()
            .map_err(|_| anyhow::anyhow!("run history writer lock poisoned"))?;
        writeln!(writer, "{}", line)?;
        writer.flush()?;

        debug!(reference = %stored.reference, "Recorded run");
        Ok(stored.reference)
    }

    fn success_rate(&self, workspace: &Path) -> Option<f64> {
        let runs = match Self::load(&self.path) {
            Ok(runs) => runs,
            Err(e) => {
                debug!(error = %e, "Run history unreadable");
                return None;
            }
        };

        let (total, succeeded) = runs
            .iter()
            .filter(|run| run.record.workspace_path == workspace)
            .fold((0usize, 0usize), |(total, ok), run| {
                (total + 1, ok + usize::from(run.record.success))
            });

        if total == 0 {
            None
        } else {
            Some(succeeded as f64 / total as f64)
        }
    }
}

impl std::fmt::Debug for JsonlRunHistory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonlRunHistory")
            .field("path", &self.path)
            .finish()
    }
}
