use super::Detector;
use std::sync::Arc;

/// Ordered set of detectors. Registration order is significant: the scanner
/// uses it to pick the primary result when no detector reports a framework.
#[derive(Clone, Default)]
pub struct DetectorRegistry {
    detectors: Vec<Arc<dyn Detector>>,
}

impl DetectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(super::JavaScriptDetector));
        registry.register(Arc::new(super::PythonDetector));
        registry.register(Arc::new(super::RustDetector));
        registry.register(Arc::new(super::GoDetector));
        registry
    }

    pub fn register(&mut self, detector: Arc<dyn Detector>) {
        self.detectors.push(detector);
    }

    pub fn detectors(&self) -> &[Arc<dyn Detector>] {
        &self.detectors
    }

    pub fn names(&self) -> Vec<&str> {
        self.detectors.iter().map(|d| d.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }
}

impl std::fmt::Debug for DetectorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectorRegistry")
            .field("detectors", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registration_order() {
        let registry = DetectorRegistry::with_defaults();
        assert_eq!(registry.names(), vec!["javascript", "python", "rust", "go"]);
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn test_empty_registry() {
        let registry = DetectorRegistry::new();
        assert!(registry.is_empty());
    }
}
