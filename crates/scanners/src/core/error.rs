use thiserror::Error;

/// Faults the engine distinguishes. Only `Configuration` is fatal; every
/// other variant is isolated to one file or one (detector, file) pair.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("input error for '{path}': {reason}")]
    Input { path: String, reason: String },

    #[error("structural error: {0}")]
    Structural(String),

    #[error("detector '{detector}' failed: {reason}")]
    DetectorFailure { detector: String, reason: String },

    #[error("offset {offset} is outside '{path}' ({len} bytes)")]
    PositionResolution {
        path: String,
        offset: usize,
        len: usize,
    },

    #[error("detector '{detector}' exceeded its {limit_ms}ms deadline")]
    Timeout { detector: String, limit_ms: u64 },

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl EngineError {
    pub fn structural(reason: impl Into<String>) -> Self {
        Self::Structural(reason.into())
    }

    pub fn input(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Input {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;
