use crate::core::{EngineError, Severity};
use crate::representations::SourceRange;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Human position of a finding. Always derived from a [`SourceRange`] and
/// the owning file's line index, never stored on its own.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub path: String,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.path, self.line, self.column)
    }
}

/// Raw detector output: a byte range plus an optional message. The runner
/// turns hits into [`Instance`]s by resolving the range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub range: SourceRange,
    pub message: Option<String>,
}

impl Hit {
    pub fn new(range: SourceRange) -> Self {
        Self {
            range,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// One concrete occurrence of a detector's condition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Instance {
    pub detector_id: String,
    pub severity: Severity,
    pub position: Position,
    pub offset: usize,
    pub length: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub snippet: Option<String>,
}

impl Instance {
    /// Sort key: tier (most severe first), detector id, file path, offset.
    pub fn sort_key(&self) -> (std::cmp::Reverse<Severity>, &str, &str, usize) {
        (
            std::cmp::Reverse(self.severity),
            self.detector_id.as_str(),
            self.position.path.as_str(),
            self.offset,
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    InputError,
    StructuralError,
    DetectorFailure,
    Timeout,
    PositionFallback,
}

/// Record of an isolated fault. Diagnostics never abort a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct Diagnostic {
    pub detector_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    pub kind: DiagnosticKind,

    pub detail: String,
}

impl Diagnostic {
    pub fn from_error(detector_id: &str, path: Option<&str>, error: &EngineError) -> Self {
        let kind = match error {
            EngineError::Input { .. } => DiagnosticKind::InputError,
            EngineError::Structural(_) => DiagnosticKind::StructuralError,
            EngineError::Timeout { .. } => DiagnosticKind::Timeout,
            EngineError::PositionResolution { .. } => DiagnosticKind::PositionFallback,
            EngineError::DetectorFailure { .. } | EngineError::Configuration(_) => {
                DiagnosticKind::DetectorFailure
            }
        };

        Self {
            detector_id: detector_id.to_string(),
            path: path.map(str::to_string),
            kind,
            detail: error.to_string(),
        }
    }
}
