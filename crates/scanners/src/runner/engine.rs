use crate::core::{
    DetectorDefinition, Diagnostic, EngineConfig, EngineError, EngineResult, Instance, Severity,
};
use crate::representations::{SourceBatch, SourceFile};
use crate::runner::DetectorRegistry;
use anyhow::Result;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub struct ScanningEngine {
    registry: DetectorRegistry,
    config: EngineConfig,
}

/// What one (detector, file) pair contributed.
struct PairOutcome {
    instances: Vec<Instance>,
    diagnostics: Vec<Diagnostic>,
}

impl PairOutcome {
    fn failed(diagnostic: Diagnostic) -> Self {
        Self {
            instances: Vec::new(),
            diagnostics: vec![diagnostic],
        }
    }
}

impl ScanningEngine {
    pub fn new(registry: DetectorRegistry, config: EngineConfig) -> Self {
        Self { registry, config }
    }

    /// Engine over the built-in catalog.
    pub fn with_defaults(config: EngineConfig) -> EngineResult<Self> {
        let registry = DetectorRegistry::with_defaults(&config)?;
        Ok(Self::new(registry, config))
    }

    pub fn registry(&self) -> &DetectorRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run every enabled detector over every file of `batch`.
    ///
    /// Faults never abort the run: each (detector, file) pair is isolated,
    /// and a failing, panicking or overrunning pair contributes no
    /// instances and one diagnostic. The result is sorted, so it does not
    /// depend on worker count or scheduling.
    pub fn run(&self, batch: &SourceBatch) -> ScanReport {
        let started = Instant::now();
        let detectors = self.registry.enabled(&self.config);

        let mut diagnostics = Vec::new();
        for rejected in batch.rejected() {
            for detector in &detectors {
                diagnostics.push(Diagnostic::from_error(
                    detector.id(),
                    Some(rejected.path.as_str()),
                    &rejected.error,
                ));
            }
        }

        let pairs: Vec<(&Arc<DetectorDefinition>, &SourceFile)> = detectors
            .iter()
            .flat_map(|detector| batch.files().iter().map(move |file| (detector, file)))
            .collect();

        let outcomes = if self.config.parallel_execution {
            self.run_parallel(&pairs, batch)
        } else {
            self.run_serial(&pairs, batch)
        };

        let mut instances = Vec::new();
        for outcome in outcomes {
            instances.extend(outcome.instances);
            diagnostics.extend(outcome.diagnostics);
        }

        let report = ScanReport::new(instances, diagnostics);
        info!(
            "Scanned {} files with {} detectors in {:?}: {} instances, {} diagnostics",
            batch.len(),
            detectors.len(),
            started.elapsed(),
            report.instances.len(),
            report.diagnostics.len()
        );
        report
    }

    fn run_serial(
        &self,
        pairs: &[(&Arc<DetectorDefinition>, &SourceFile)],
        batch: &SourceBatch,
    ) -> Vec<PairOutcome> {
        pairs
            .iter()
            .map(|(detector, file)| self.execute_pair(detector, file, batch))
            .collect()
    }

    fn run_parallel(
        &self,
        pairs: &[(&Arc<DetectorDefinition>, &SourceFile)],
        batch: &SourceBatch,
    ) -> Vec<PairOutcome> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.worker_threads.unwrap_or(0))
            .build();

        match pool {
            Ok(pool) => pool.install(|| {
                pairs
                    .par_iter()
                    .map(|(detector, file)| self.execute_pair(detector, file, batch))
                    .collect()
            }),
            Err(e) => {
                warn!("Could not start detector pool, running serially: {}", e);
                self.run_serial(pairs, batch)
            }
        }
    }

    fn execute_pair(
        &self,
        detector: &DetectorDefinition,
        file: &SourceFile,
        batch: &SourceBatch,
    ) -> PairOutcome {
        let started = Instant::now();
        let result = panic::catch_unwind(AssertUnwindSafe(|| detector.detect_file(file)));
        let elapsed = started.elapsed();

        let hits = match result {
            Ok(Ok(hits)) => hits,
            Ok(Err(e)) => {
                let error = classify_failure(detector.id(), e);
                warn!("{} on '{}': {}", detector.id(), file.path(), error);
                return PairOutcome::failed(Diagnostic::from_error(
                    detector.id(),
                    Some(file.path()),
                    &error,
                ));
            }
            Err(payload) => {
                let error = EngineError::DetectorFailure {
                    detector: detector.id().to_string(),
                    reason: format!("panicked: {}", panic_message(payload.as_ref())),
                };
                warn!("{} on '{}': {}", detector.id(), file.path(), error);
                return PairOutcome::failed(Diagnostic::from_error(
                    detector.id(),
                    Some(file.path()),
                    &error,
                ));
            }
        };

        if let Some(limit_ms) = self.config.detector_timeout_ms {
            if elapsed > Duration::from_millis(limit_ms) {
                let error = EngineError::Timeout {
                    detector: detector.id().to_string(),
                    limit_ms,
                };
                warn!("{} on '{}': {} (took {:?})", detector.id(), file.path(), error, elapsed);
                return PairOutcome::failed(Diagnostic::from_error(
                    detector.id(),
                    Some(file.path()),
                    &error,
                ));
            }
        }

        debug!(
            "{} on '{}': {} hits in {:?}",
            detector.id(),
            file.path(),
            hits.len(),
            elapsed
        );

        let (instances, diagnostics) =
            detector.instances(hits, file, batch, self.config.include_snippets);
        PairOutcome {
            instances,
            diagnostics,
        }
    }
}

/// Structural errors keep their kind; anything else a matcher returns is a
/// detector failure.
fn classify_failure(detector_id: &str, error: anyhow::Error) -> EngineError {
    match error.downcast::<EngineError>() {
        Ok(EngineError::Structural(reason)) => EngineError::Structural(reason),
        Ok(EngineError::DetectorFailure { detector, reason }) => {
            EngineError::DetectorFailure { detector, reason }
        }
        Ok(other) => EngineError::DetectorFailure {
            detector: detector_id.to_string(),
            reason: other.to_string(),
        },
        Err(other) => EngineError::DetectorFailure {
            detector: detector_id.to_string(),
            reason: format!("{:#}", other),
        },
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Sorted outcome of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    instances: Vec<Instance>,
    diagnostics: Vec<Diagnostic>,
}

impl ScanReport {
    /// Sorts instances by tier (most severe first), detector id, path and
    /// offset, and diagnostics by detector id, path and kind.
    pub fn new(mut instances: Vec<Instance>, mut diagnostics: Vec<Diagnostic>) -> Self {
        instances.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        diagnostics.sort();
        Self {
            instances,
            diagnostics,
        }
    }

    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn instances_of<'a>(&'a self, detector_id: &'a str) -> impl Iterator<Item = &'a Instance> {
        self.instances
            .iter()
            .filter(move |instance| instance.detector_id == detector_id)
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn count_by_severity(&self) -> SeverityCount {
        let mut count = SeverityCount::default();
        for instance in &self.instances {
            match instance.severity {
                Severity::Critical => count.critical += 1,
                Severity::High => count.high += 1,
                Severity::Medium => count.medium += 1,
                Severity::Low => count.low += 1,
                Severity::Informational => count.informational += 1,
            }
        }
        count
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCount {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub informational: usize,
}

impl SeverityCount {
    pub fn get(&self, severity: Severity) -> usize {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
            Severity::Informational => self.informational,
        }
    }

    pub fn total(&self) -> usize {
        self.critical + self.high + self.medium + self.low + self.informational
    }
}
