//! Core abstractions and infrastructure for the detection engine
//!
//! Fundamental building blocks shared by every detector and by the runner.
//! A detector definition pairs identity and severity with one of two matcher
//! kinds, results carry positions resolved from compiler byte ranges, and the
//! error taxonomy separates faults the runner isolates per (detector, file)
//! pair from configuration errors that stop the engine before it starts.

pub mod config;
pub mod detector;
pub mod error;
pub mod report_generator;
pub mod result;
pub mod severity;

pub use config::EngineConfig;
pub use detector::{DetectorDefinition, DetectorKind, Matcher, StructuralFn, TextPattern};
pub use error::{EngineError, EngineResult};
pub use report_generator::{DetectorSection, Report, ReportGenerator, TierSection};
pub use result::{Diagnostic, DiagnosticKind, Hit, Instance, Position};
pub use severity::Severity;
