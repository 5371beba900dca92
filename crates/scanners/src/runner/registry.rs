use crate::core::{DetectorDefinition, EngineConfig, EngineError, EngineResult, Severity};
use crate::detectors;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

/// Validated, immutable detector catalog. Ids are unique and the catalog
/// is never empty; both are checked when it is built.
#[derive(Debug, Clone)]
pub struct DetectorRegistry {
    detectors: BTreeMap<&'static str, Arc<DetectorDefinition>>,
}

impl DetectorRegistry {
    pub fn new(definitions: Vec<DetectorDefinition>) -> EngineResult<Self> {
        if definitions.is_empty() {
            return Err(EngineError::Configuration(
                "detector catalog is empty".to_string(),
            ));
        }

        let mut detectors = BTreeMap::new();
        for definition in definitions {
            let id = definition.id();
            if detectors.insert(id, Arc::new(definition)).is_some() {
                return Err(EngineError::Configuration(format!(
                    "duplicate detector id '{}'",
                    id
                )));
            }
        }

        Ok(Self { detectors })
    }

    /// Registry holding the built-in catalog.
    pub fn with_defaults(config: &EngineConfig) -> EngineResult<Self> {
        Self::new(detectors::default_detectors(config)?)
    }

    pub fn get(&self, id: &str) -> Option<Arc<DetectorDefinition>> {
        self.detectors.get(id).cloned()
    }

    /// All detectors, ordered by id.
    pub fn all(&self) -> Vec<Arc<DetectorDefinition>> {
        self.detectors.values().cloned().collect()
    }

    pub fn by_severity(&self, severity: Severity) -> Vec<Arc<DetectorDefinition>> {
        self.detectors
            .values()
            .filter(|d| d.severity() == severity)
            .cloned()
            .collect()
    }

    /// Detectors that pass the config's disabled list and severity floor.
    pub fn enabled(&self, config: &EngineConfig) -> Vec<Arc<DetectorDefinition>> {
        for id in &config.disabled_detectors {
            if !self.detectors.contains_key(id.as_str()) {
                warn!("Ignoring unknown disabled detector '{}'", id);
            }
        }

        self.detectors
            .values()
            .filter(|d| !config.is_disabled(d.id()) && config.meets_severity(d.severity()))
            .cloned()
            .collect()
    }

    pub fn list_ids(&self) -> Vec<&'static str> {
        self.detectors.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Hit;
    use crate::representations::SourceFile;

    fn nothing(_: &SourceFile) -> anyhow::Result<Vec<Hit>> {
        Ok(Vec::new())
    }

    fn detector(id: &'static str, severity: Severity) -> DetectorDefinition {
        DetectorDefinition::structural(id, id, "", severity, nothing)
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let err = DetectorRegistry::new(vec![
            detector("same", Severity::Low),
            detector("same", Severity::High),
        ])
        .unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("same"));
    }

    #[test]
    fn test_empty_catalog_is_rejected() {
        assert!(DetectorRegistry::new(Vec::new()).unwrap_err().is_fatal());
    }

    #[test]
    fn test_registration_order_does_not_matter() {
        let forward = DetectorRegistry::new(vec![
            detector("b", Severity::Low),
            detector("a", Severity::Medium),
        ])
        .unwrap();
        let backward = DetectorRegistry::new(vec![
            detector("a", Severity::Medium),
            detector("b", Severity::Low),
        ])
        .unwrap();

        assert_eq!(forward.list_ids(), vec!["a", "b"]);
        assert_eq!(forward.list_ids(), backward.list_ids());
    }

    #[test]
    fn test_enabled_applies_config() {
        let registry = DetectorRegistry::new(vec![
            detector("high", Severity::High),
            detector("low", Severity::Low),
            detector("info", Severity::Informational),
        ])
        .unwrap();

        let config = EngineConfig::default()
            .with_min_severity(Severity::Low)
            .with_disabled_detector("high")
            .with_disabled_detector("missing");
        let enabled: Vec<&str> = registry.enabled(&config).iter().map(|d| d.id()).collect();

        assert_eq!(enabled, vec!["low"]);
        assert_eq!(registry.by_severity(Severity::High).len(), 1);
    }

    #[test]
    fn test_default_catalog_loads() {
        let registry = DetectorRegistry::with_defaults(&EngineConfig::default()).unwrap();
        assert_eq!(registry.len(), 41);
        assert!(registry.get("assert-usage").is_some());
        assert!(registry.get("array-grows-without-shrink").is_some());
    }
}
