//! Detector execution and orchestration
//!
//! The registry holds the validated detector catalog. The scanning engine
//! runs every enabled (detector, file) pair, on a rayon pool or serially,
//! catches faults at the pair boundary, and hands back a sorted
//! [`ScanReport`]. Worker count and scheduling never change the result.

pub mod engine;
pub mod registry;

pub use engine::{ScanReport, ScanningEngine, SeverityCount};
pub use registry::DetectorRegistry;
