use super::WorkspaceDescriptor;
use crate::detectors::{DetectorRegistry, DetectorResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Invalid workspace path {path}: {reason}")]
    InvalidPath { path: PathBuf, reason: &'static str },
}

impl ScanError {
    pub fn path(&self) -> &Path {
        match self {
            ScanError::InvalidPath { path, .. } => path,
        }
    }
}

/// Fails with [`ScanError::InvalidPath`] unless `path` is an existing directory.
pub fn validate_workspace(path: &Path) -> Result<(), ScanError> {
    if !path.exists() {
        return Err(ScanError::InvalidPath {
            path: path.to_path_buf(),
            reason: "path does not exist",
        });
    }
    if !path.is_dir() {
        return Err(ScanError::InvalidPath {
            path: path.to_path_buf(),
            reason: "path is not a directory",
        });
    }
    Ok(())
}

/// Runs every registered detector against a workspace and merges the output.
pub struct Scanner {
    registry: Arc<DetectorRegistry>,
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}

impl Scanner {
    pub fn new() -> Self {
        Self::with_registry(Arc::new(DetectorRegistry::with_defaults()))
    }

    pub fn with_registry(registry: Arc<DetectorRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &DetectorRegistry {
        &self.registry
    }

    pub fn scan(&self, workspace_path: &Path) -> Result<WorkspaceDescriptor, ScanError> {
        validate_workspace(workspace_path)?;
        let start = Instant::now();

        info!(
            workspace = %workspace_path.display(),
            detectors = self.registry.len(),
            "Scanning workspace"
        );

        let results: Vec<DetectorResult> = self
            .registry
            .detectors()
            .iter()
            .filter_map(|detector| match detector.detect(workspace_path) {
                Ok(Some(result)) => {
                    debug!(
                        detector = detector.name(),
                        language = ?result.language,
                        framework = ?result.framework,
                        "Detector matched"
                    );
                    Some(result)
                }
                Ok(None) => None,
                Err(e) => {
                    warn!(
                        detector = detector.name(),
                        error = %e,
                        "Detector failed, treating as no signal"
                    );
                    None
                }
            })
            .collect();

        let descriptor = WorkspaceDescriptor::from_results(&results);

        info!(
            language = %descriptor.language,
            framework = ?descriptor.framework,
            project_type = %descriptor.project_type,
            matches = results.len(),
            scan_time_ms = start.elapsed().as_millis() as u64,
            "Workspace scan complete"
        );

        Ok(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::Detector;
    use crate::workspace::ProjectType;
    use std::fs;
    use tempfile::TempDir;

    struct FailingDetector;

    impl Detector for FailingDetector {
        fn name(&self) -> &str {
            "failing"
        }

        fn detect(&self, _workspace: &Path) -> anyhow::Result<Option<DetectorResult>> {
            anyhow::bail!("boom")
        }
    }

    struct FixedDetector(DetectorResult);

    impl Detector for FixedDetector {
        fn name(&self) -> &str {
            "fixed"
        }

        fn detect(&self, _workspace: &Path) -> anyhow::Result<Option<DetectorResult>> {
            Ok(Some(self.0.clone()))
        }
    }

    #[test]
    fn test_invalid_path() {
        let scanner = Scanner::new();
        let err = scanner.scan(Path::new("/nonexistent/workspace")).unwrap_err();
        assert!(matches!(err, ScanError::InvalidPath { .. }));
        assert_eq!(err.path(), Path::new("/nonexistent/workspace"));
    }

    #[test]
    fn test_file_is_not_a_workspace() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("notes.txt");
        fs::write(&file, "hello").unwrap();

        let err = Scanner::new().scan(&file).unwrap_err();
        assert!(err.to_string().contains("not a directory"));
    }

    #[test]
    fn test_empty_workspace_is_unknown() {
        let dir = TempDir::new().unwrap();
        let descriptor = Scanner::new().scan(dir.path()).unwrap();
        assert_eq!(descriptor, WorkspaceDescriptor::unknown());
    }

    #[test]
    fn test_failing_detector_is_isolated() {
        let mut registry = DetectorRegistry::new();
        registry.register(Arc::new(FailingDetector));
        registry.register(Arc::new(FixedDetector(
            DetectorResult::language("go").with_capability("cli"),
        )));

        let dir = TempDir::new().unwrap();
        let descriptor = Scanner::with_registry(Arc::new(registry))
            .scan(dir.path())
            .unwrap();

        assert_eq!(descriptor.language, "go");
        assert_eq!(descriptor.project_type, ProjectType::Cli);
    }
}
