use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

impl Diagnostic {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            file: None,
            line: None,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn at(mut self, file: impl Into<String>, line: Option<u32>) -> Self {
        self.file = Some(file.into());
        self.line = line;
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.file, self.line) {
            (Some(file), Some(line)) => {
                write!(f, "[{}] {}:{}: {}", self.severity, file, line, self.message)
            }
            (Some(file), None) => write!(f, "[{}] {}: {}", self.severity, file, self.message),
            _ => write!(f, "[{}] {}", self.severity, self.message),
        }
    }
}

/// A change an agent proposes or applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub file: String,
    pub description: String,
}

impl Change {
    pub fn new(file: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    pub diagnostics: Vec<Diagnostic>,
    pub changes: Vec<Change>,
    pub summary: String,
}

impl ExecutionResult {
    pub fn success(summary: impl Into<String>) -> Self {
        Self {
            success: true,
            diagnostics: Vec::new(),
            changes: Vec::new(),
            summary: summary.into(),
        }
    }

    /// Failed result carrying a single diagnostic whose message doubles as summary
    pub fn failure(diagnostic: Diagnostic) -> Self {
        Self {
            success: false,
            summary: diagnostic.message.clone(),
            diagnostics: vec![diagnostic],
            changes: Vec::new(),
        }
    }

    pub fn with_diagnostic(mut self, diagnostic: Diagnostic) -> Self {
        self.diagnostics.push(diagnostic);
        self
    }

    pub fn with_change(mut self, change: Change) -> Self {
        self.changes.push(change);
        self
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_carries_diagnostic() {
        let result = ExecutionResult::failure(Diagnostic::error("agent not found: x"));
        assert!(!result.success);
        assert!(result.has_errors());
        assert_eq!(result.summary, "agent not found: x");
        assert_eq!(result.diagnostics.len(), 1);
    }

    #[test]
    fn test_diagnostic_display() {
        assert_eq!(Diagnostic::warning("slow").to_string(), "[warning] slow");
        assert_eq!(
            Diagnostic::error("boom").at("src/main.rs", Some(3)).to_string(),
            "[error] src/main.rs:3: boom"
        );
    }

    #[test]
    fn test_severity_serializes_lowercase() {
        let json = serde_json::to_value(Diagnostic::info("hi")).unwrap();
        assert_eq!(json["severity"], "info");
        assert!(json.get("file").is_none());
    }
}
