//! Detector definitions: one execution contract over two matcher kinds.
//!
//! A detector is data, not a trait object. Its matcher is either a compiled
//! text pattern scanned over raw source, or a plain function over the
//! file's syntax tree. The runner calls [`DetectorDefinition::detect_file`]
//! without caring which kind it holds.
//!
//! Both kinds return [`Hit`]s (byte ranges); turning those into
//! [`Instance`]s with resolved positions happens in one place,
//! [`DetectorDefinition::instances`], so every detector gets the same
//! end-of-file fallback and snippet handling.

use crate::core::{Diagnostic, EngineError, EngineResult, Hit, Instance, Severity};
use crate::representations::{SourceBatch, SourceFile};
use anyhow::Result;
use fancy_regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// Structural matcher: a pure function of one file's tree.
pub type StructuralFn = fn(&SourceFile) -> Result<Vec<Hit>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectorKind {
    Textual,
    Structural,
}

impl fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Textual => write!(f, "textual"),
            Self::Structural => write!(f, "structural"),
        }
    }
}

/// Bytes before a match that a guard may span.
pub const GUARD_WINDOW: usize = 512;

/// Pattern compiled once for exhaustive, non-overlapping, left-to-right
/// search with lookaround support.
///
/// A pattern may carry a guard: a match is dropped when the text right
/// before it ends with a guard match. This is variable-length lookbehind,
/// limited to `GUARD_WINDOW` bytes.
#[derive(Debug, Clone)]
pub struct TextPattern {
    source: &'static str,
    regex: Regex,
    guard: Option<(&'static str, Regex)>,
}

impl TextPattern {
    pub fn compile(pattern: &'static str, backtrack_limit: usize) -> EngineResult<Self> {
        Ok(Self {
            source: pattern,
            regex: build(pattern, backtrack_limit)?,
            guard: None,
        })
    }

    /// Drop matches immediately preceded by text matching `guard`.
    pub fn unless_preceded_by(mut self, guard: &'static str, backtrack_limit: usize) -> EngineResult<Self> {
        let anchored = build(&format!("(?:{})$", guard), backtrack_limit)?;
        self.guard = Some((guard, anchored));
        Ok(self)
    }

    pub fn as_str(&self) -> &'static str {
        self.source
    }

    pub fn guard(&self) -> Option<&'static str> {
        self.guard.as_ref().map(|(source, _)| *source)
    }

    /// Every match in `file`, as ranges tagged with the file's source id.
    /// Exceeding the backtrack limit fails the whole scan.
    pub fn scan(&self, file: &SourceFile) -> Result<Vec<Hit>> {
        let text = file.text();
        let mut hits = Vec::new();

        let Some((_, guard)) = &self.guard else {
            for found in self.regex.find_iter(text) {
                let found = found?;
                hits.push(Hit::new(file.range(found.start(), found.end() - found.start())));
            }
            return Ok(hits);
        };

        // A guarded match is skipped, and the search resumes one character
        // later, so a match starting inside it can still be found.
        let mut at = 0;
        while at <= text.len() {
            let Some(found) = self.regex.find_from_pos(text, at)? else {
                break;
            };
            if is_guarded(guard, text, found.start())? {
                at = next_boundary(text, found.start());
                continue;
            }
            hits.push(Hit::new(file.range(found.start(), found.end() - found.start())));
            at = if found.end() > found.start() {
                found.end()
            } else {
                next_boundary(text, found.end())
            };
        }
        Ok(hits)
    }
}

fn build(pattern: &str, backtrack_limit: usize) -> EngineResult<Regex> {
    RegexBuilder::new(pattern)
        .backtrack_limit(backtrack_limit)
        .build()
        .map_err(|e| EngineError::Configuration(format!("invalid pattern /{}/: {}", pattern, e)))
}

fn is_guarded(guard: &Regex, text: &str, start: usize) -> Result<bool> {
    let mut from = start.saturating_sub(GUARD_WINDOW);
    while !text.is_char_boundary(from) {
        from += 1;
    }
    Ok(guard.is_match(&text[from..start])?)
}

fn next_boundary(text: &str, at: usize) -> usize {
    let mut next = at + 1;
    while next < text.len() && !text.is_char_boundary(next) {
        next += 1;
    }
    next
}

#[derive(Debug, Clone)]
pub enum Matcher {
    Textual(TextPattern),
    Structural(StructuralFn),
}

#[derive(Debug, Clone)]
pub struct DetectorDefinition {
    id: &'static str,
    title: &'static str,
    description: &'static str,
    severity: Severity,
    matcher: Matcher,
}

impl DetectorDefinition {
    pub fn structural(
        id: &'static str,
        title: &'static str,
        description: &'static str,
        severity: Severity,
        detect: StructuralFn,
    ) -> Self {
        Self {
            id,
            title,
            description,
            severity,
            matcher: Matcher::Structural(detect),
        }
    }

    pub fn textual(
        id: &'static str,
        title: &'static str,
        description: &'static str,
        severity: Severity,
        pattern: &'static str,
        backtrack_limit: usize,
    ) -> EngineResult<Self> {
        let pattern = TextPattern::compile(pattern, backtrack_limit).map_err(|e| match e {
            EngineError::Configuration(reason) => {
                EngineError::Configuration(format!("detector '{}': {}", id, reason))
            }
            other => other,
        })?;

        Ok(Self {
            id,
            title,
            description,
            severity,
            matcher: Matcher::Textual(pattern),
        })
    }

    /// Give a textual detector a guard; see [`TextPattern::unless_preceded_by`].
    pub fn unless_preceded_by(mut self, guard: &'static str, backtrack_limit: usize) -> EngineResult<Self> {
        let Matcher::Textual(pattern) = self.matcher else {
            return Err(EngineError::Configuration(format!(
                "detector '{}': only textual detectors take a guard",
                self.id
            )));
        };
        let pattern = pattern.unless_preceded_by(guard, backtrack_limit).map_err(|e| match e {
            EngineError::Configuration(reason) => {
                EngineError::Configuration(format!("detector '{}': {}", self.id, reason))
            }
            other => other,
        })?;
        self.matcher = Matcher::Textual(pattern);
        Ok(self)
    }

    pub fn id(&self) -> &'static str {
        self.id
    }

    pub fn title(&self) -> &'static str {
        self.title
    }

    pub fn description(&self) -> &'static str {
        self.description
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn kind(&self) -> DetectorKind {
        match self.matcher {
            Matcher::Textual(_) => DetectorKind::Textual,
            Matcher::Structural(_) => DetectorKind::Structural,
        }
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    /// Run the matcher on one file. A structural detector on a file without
    /// a tree has nothing to look at and reports nothing.
    pub fn detect_file(&self, file: &SourceFile) -> Result<Vec<Hit>> {
        match &self.matcher {
            Matcher::Textual(pattern) => pattern.scan(file),
            Matcher::Structural(detect) => {
                if file.tree().is_none() {
                    debug!("Skipping {} on '{}': no syntax tree", self.id, file.path());
                    return Ok(Vec::new());
                }
                detect(file)
            }
        }
    }

    /// Resolve hits from `file` into instances. A range that points outside
    /// its file is kept, positioned at end of file, and reported as a
    /// position fallback.
    pub fn instances(
        &self,
        hits: Vec<Hit>,
        file: &SourceFile,
        batch: &SourceBatch,
        include_snippets: bool,
    ) -> (Vec<Instance>, Vec<Diagnostic>) {
        let mut instances = Vec::with_capacity(hits.len());
        let mut diagnostics = Vec::new();

        for hit in hits {
            let target = batch.file_for(&hit.range, file);
            let position = match target.resolve(hit.range.offset) {
                Ok(position) => position,
                Err(e) => {
                    warn!("{}: {}; using end of file", self.id, e);
                    diagnostics.push(Diagnostic::from_error(self.id, Some(target.path()), &e));
                    target.end_of_file_position()
                }
            };

            let snippet = if include_snippets {
                target.snippet_at(hit.range.offset.min(target.len()))
            } else {
                None
            };

            instances.push(Instance {
                detector_id: self.id.to_string(),
                severity: self.severity,
                position,
                offset: hit.range.offset,
                length: hit.range.length,
                message: hit.message,
                snippet,
            });
        }

        (instances, diagnostics)
    }
}
