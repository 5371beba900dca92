//! Greyhound Scanners - Detection Engine for Solidity Sources
//!
//! Runs a catalog of independent detectors over a batch of source files.
//! Textual detectors scan raw text with lookaround-capable patterns;
//! structural detectors query the compiler's JSON AST through a generic
//! tree walker. The runner isolates every (detector, file) pair, so one
//! broken rule never hides the others, and sorts results into a
//! deterministic, severity-ordered report.
//!
//! ```no_run
//! use greyhound_scanners::{EngineConfig, ReportGenerator, ScanningEngine, SourceBatch, SourceFile};
//!
//! # fn main() -> anyhow::Result<()> {
//! let batch = SourceBatch::new().with_file(SourceFile::new("Vault.sol", "contract Vault {}"))?;
//! let engine = ScanningEngine::with_defaults(EngineConfig::default())?;
//! let scan = engine.run(&batch);
//! let report = ReportGenerator::build(&scan, engine.registry());
//! println!("{}", report.render_markdown());
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod core;
pub mod detectors;
pub mod representations;
pub mod runner;

pub use core::{
    DetectorDefinition, DetectorKind, Diagnostic, DiagnosticKind, EngineConfig, EngineError,
    EngineResult, Hit, Instance, Position, Report, ReportGenerator, Severity,
};

pub use representations::{SourceBatch, SourceFile, SourceRange, SyntaxNode};

pub use runner::{DetectorRegistry, ScanReport, ScanningEngine, SeverityCount};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
