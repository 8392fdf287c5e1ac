//! Go detector (`go.mod`)

use super::manifest::{go_requires, read_text};
use super::{Detector, DetectorResult};
use std::path::Path;

const API_FRAMEWORKS: &[(&str, &str)] = &[
    ("github.com/gin-gonic/gin", "gin"),
    ("github.com/labstack/echo", "echo"),
    ("github.com/gofiber/fiber", "fiber"),
    ("github.com/go-chi/chi", "chi"),
];

const CLI_MODULES: &[&str] = &["github.com/spf13/cobra", "github.com/urfave/cli"];

const ML_MODULES: &[&str] = &["gorgonia.org/gorgonia", "github.com/sjwhitworth/golearn"];

pub struct GoDetector;

/// Matches a module path against a prefix, ignoring major-version suffixes
/// such as `/v4`.
fn module_matches(module: &str, prefix: &str) -> bool {
    module == prefix || module.starts_with(&format!("{}/", prefix))
}

impl Detector for GoDetector {
    fn name(&self) -> &str {
        "go"
    }

    fn detect(&self, workspace: &Path) -> anyhow::Result<Option<DetectorResult>> {
        let Some(go_mod) = read_text(&workspace.join("go.mod"))? else {
            return Ok(None);
        };
        let modules = go_requires(&go_mod);

        let mut result = DetectorResult::language("go").with_signal("go-module");

        let framework = API_FRAMEWORKS.iter().find(|(prefix, _)| {
            modules.iter().any(|m| module_matches(m, prefix))
        });
        if let Some((_, name)) = framework {
            result = result
                .with_framework(*name)
                .with_capability("api")
                .with_signal(format!("framework:{}", name));
        }
        if CLI_MODULES
            .iter()
            .any(|prefix| modules.iter().any(|m| module_matches(m, prefix)))
        {
            result.add_capability("cli");
        }
        if ML_MODULES
            .iter()
            .any(|prefix| modules.iter().any(|m| module_matches(m, prefix)))
        {
            result.add_capability("ml");
        }

        Ok(Some(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_echo_with_major_version() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("go.mod"),
            "module example.com/api\n\ngo 1.22\n\nrequire github.com/labstack/echo/v4 v4.11.0\n",
        )
        .unwrap();

        let result = GoDetector.detect(dir.path()).unwrap().unwrap();
        assert_eq!(result.framework.as_deref(), Some("echo"));
        assert!(result.has_capability("api"));
    }

    #[test]
    fn test_cobra_cli() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("go.mod"),
            "module example.com/tool\n\nrequire (\n\tgithub.com/spf13/cobra v1.8.0\n)\n",
        )
        .unwrap();

        let result = GoDetector.detect(dir.path()).unwrap().unwrap();
        assert!(result.framework.is_none());
        assert!(result.has_capability("cli"));
    }

    #[test]
    fn test_module_matches() {
        assert!(module_matches("github.com/go-chi/chi/v5", "github.com/go-chi/chi"));
        assert!(module_matches("github.com/go-chi/chi", "github.com/go-chi/chi"));
        assert!(!module_matches("github.com/go-chi/chirp", "github.com/go-chi/chi"));
    }
}
