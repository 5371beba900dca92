use crate::core::{EngineError, EngineResult, Severity};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub parallel_execution: bool,
    /// Worker count for the detector pool. `None` uses rayon's default.
    pub worker_threads: Option<usize>,
    pub detector_timeout_ms: Option<u64>,
    /// Backtracking budget per regex match attempt.
    pub regex_backtrack_limit: usize,
    pub disabled_detectors: Vec<String>,
    /// Detectors below this tier are skipped.
    pub min_severity: Option<Severity>,
    pub include_snippets: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallel_execution: true,
            worker_threads: None,
            detector_timeout_ms: Some(60_000), // 1 minute default
            regex_backtrack_limit: 1_000_000,
            disabled_detectors: Vec::new(),
            min_severity: None,
            include_snippets: true,
        }
    }
}

impl EngineConfig {
    pub fn from_yaml_str(yaml: &str) -> EngineResult<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| EngineError::Configuration(format!("invalid YAML config: {}", e)))
    }

    pub fn from_json_str(json: &str) -> EngineResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| EngineError::Configuration(format!("invalid JSON config: {}", e)))
    }

    /// Load a config file; `.json` files are read as JSON, anything else as
    /// YAML.
    pub fn from_file(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            EngineError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&contents),
            _ => Self::from_yaml_str(&contents),
        }
    }

    pub fn is_disabled(&self, detector_id: &str) -> bool {
        self.disabled_detectors.iter().any(|id| id == detector_id)
    }

    pub fn meets_severity(&self, severity: Severity) -> bool {
        self.min_severity.map_or(true, |min| severity >= min)
    }

    pub fn with_parallel_execution(mut self, parallel: bool) -> Self {
        self.parallel_execution = parallel;
        self
    }

    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = Some(threads);
        self
    }

    pub fn with_detector_timeout_ms(mut self, timeout_ms: Option<u64>) -> Self {
        self.detector_timeout_ms = timeout_ms;
        self
    }

    pub fn with_disabled_detector(mut self, detector_id: impl Into<String>) -> Self {
        self.disabled_detectors.push(detector_id.into());
        self
    }

    pub fn with_min_severity(mut self, severity: Severity) -> Self {
        self.min_severity = Some(severity);
        self
    }
}
