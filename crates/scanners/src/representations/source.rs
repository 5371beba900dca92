//! Source model: per-file raw text, optional parsed tree, and the line index
//! used to turn compiler byte ranges into human positions.
//!
//! Offsets are byte offsets into the UTF-8 text, exactly as the compiler
//! reports them in `src` attributes. Lines and columns are 1-based; the
//! column counts bytes, so a tab is one column.

use crate::core::{EngineError, EngineResult, Position};
use crate::representations::syntax::{parse_ast_json, SyntaxNode};
use serde_json::Value;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, warn};

/// `(offset, length, file index)` triple as found in compiler `src`
/// attributes. A file index of `-1` (unknown) is stored as `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceRange {
    pub offset: usize,
    pub length: usize,
    pub file_index: Option<usize>,
}

impl SourceRange {
    pub fn new(offset: usize, length: usize, file_index: Option<usize>) -> Self {
        Self {
            offset,
            length,
            file_index,
        }
    }

    pub fn end(&self) -> usize {
        self.offset.saturating_add(self.length)
    }
}

impl FromStr for SourceRange {
    type Err = EngineError;

    fn from_str(src: &str) -> EngineResult<Self> {
        let malformed = || EngineError::structural(format!("malformed source range '{}'", src));

        let mut parts = src.split(':');
        let offset = parts
            .next()
            .and_then(|p| p.trim().parse::<usize>().ok())
            .ok_or_else(malformed)?;
        let length = parts
            .next()
            .and_then(|p| p.trim().parse::<usize>().ok())
            .ok_or_else(malformed)?;
        let file_index = match parts.next() {
            Some(p) => {
                let index = p.trim().parse::<i64>().map_err(|_| malformed())?;
                usize::try_from(index).ok()
            }
            None => None,
        };

        if parts.next().is_some() {
            return Err(malformed());
        }

        Ok(Self::new(offset, length, file_index))
    }
}

impl fmt::Display for SourceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.file_index {
            Some(index) => write!(f, "{}:{}:{}", self.offset, self.length, index),
            None => write!(f, "{}:{}:-1", self.offset, self.length),
        }
    }
}

/// Byte offsets of every line start, built in one pass.
///
/// `\n` terminates a line, so `\r\n` endings produce the same line starts
/// as bare `\n` endings; the `\r` stays on the line it ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(
            text.bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );

        Self {
            starts,
            len: text.len(),
        }
    }

    pub fn line_count(&self) -> usize {
        self.starts.len()
    }

    /// 1-based `(line, column)` for `offset`. `offset == len` is valid and
    /// addresses the end of the file.
    pub fn line_col(&self, offset: usize) -> Option<(usize, usize)> {
        if offset > self.len {
            return None;
        }
        let line = self.starts.partition_point(|&start| start <= offset);
        let column = offset - self.starts[line - 1] + 1;
        Some((line, column))
    }

    /// Byte span of `line` (1-based) without its terminator.
    pub fn line_span(&self, line: usize) -> Option<std::ops::Range<usize>> {
        let start = *self.starts.get(line.checked_sub(1)?)?;
        let end = match self.starts.get(line) {
            Some(next) => next - 1,
            None => self.len,
        };
        Some(start..end.max(start))
    }
}

#[derive(Debug, Clone)]
pub struct SourceFile {
    path: String,
    text: String,
    tree: Option<SyntaxNode>,
    tree_error: Option<String>,
    line_index: LineIndex,
    source_id: Option<usize>,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let line_index = LineIndex::new(&text);
        Self {
            path: path.into(),
            text,
            tree: None,
            tree_error: None,
            line_index,
            source_id: None,
        }
    }

    pub fn from_bytes(path: impl Into<String>, bytes: Vec<u8>) -> EngineResult<Self> {
        let path = path.into();
        match String::from_utf8(bytes) {
            Ok(text) => Ok(Self::new(path, text)),
            Err(e) => Err(EngineError::input(path, format!("not valid UTF-8: {}", e))),
        }
    }

    pub fn with_tree(mut self, tree: SyntaxNode) -> Self {
        self.tree = Some(tree);
        self.tree_error = None;
        self
    }

    /// Attach a compiler AST given as JSON text. A tree that cannot be
    /// converted leaves the file without a tree, which structural detectors
    /// treat as a parse failure.
    pub fn with_ast_json(self, json: &str) -> Self {
        match parse_ast_json(json) {
            Ok(value) => self.with_ast_value(&value),
            Err(e) => self.without_tree(e.to_string()),
        }
    }

    /// Attach a compiler AST given as a JSON value. Accepts either the
    /// `SourceUnit` node itself or the per-source compiler output object
    /// wrapping it under `ast`.
    pub fn with_ast_value(self, value: &Value) -> Self {
        let node = match value.get("ast") {
            Some(inner) if value.get("nodeType").is_none() => inner,
            _ => value,
        };

        match SyntaxNode::from_json(node) {
            Ok(tree) => self.with_tree(tree),
            Err(e) => self.without_tree(e.to_string()),
        }
    }

    fn without_tree(mut self, reason: String) -> Self {
        warn!("No syntax tree for '{}': {}", self.path, reason);
        self.tree = None;
        self.tree_error = Some(reason);
        self
    }

    pub fn with_source_id(mut self, source_id: usize) -> Self {
        self.source_id = Some(source_id);
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tree(&self) -> Option<&SyntaxNode> {
        self.tree.as_ref()
    }

    pub fn tree_error(&self) -> Option<&str> {
        self.tree_error.as_deref()
    }

    pub fn line_index(&self) -> &LineIndex {
        &self.line_index
    }

    pub fn source_id(&self) -> Option<usize> {
        self.source_id
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Range for a byte span of this file, tagged with its source id.
    pub fn range(&self, offset: usize, length: usize) -> SourceRange {
        SourceRange::new(offset, length, self.source_id)
    }

    pub fn resolve(&self, offset: usize) -> EngineResult<Position> {
        let (line, column) =
            self.line_index
                .line_col(offset)
                .ok_or_else(|| EngineError::PositionResolution {
                    path: self.path.clone(),
                    offset,
                    len: self.text.len(),
                })?;

        Ok(Position {
            path: self.path.clone(),
            line,
            column,
        })
    }

    /// Best-effort substitute used when a range points past the file.
    pub fn end_of_file_position(&self) -> Position {
        let (line, column) = self
            .line_index
            .line_col(self.text.len())
            .unwrap_or((1, 1));
        Position {
            path: self.path.clone(),
            line,
            column,
        }
    }

    /// Trimmed text of the line containing `offset`.
    pub fn snippet_at(&self, offset: usize) -> Option<String> {
        let (line, _) = self.line_index.line_col(offset)?;
        let span = self.line_index.line_span(line)?;
        let snippet = self.text.get(span)?.trim();
        if snippet.is_empty() {
            None
        } else {
            Some(snippet.to_string())
        }
    }
}

/// Input that could not be turned into a [`SourceFile`].
#[derive(Debug, Clone)]
pub struct RejectedInput {
    pub path: String,
    pub error: EngineError,
}

/// All files of one run, materialized before any detector executes.
#[derive(Debug, Clone, Default)]
pub struct SourceBatch {
    files: Vec<SourceFile>,
    rejected: Vec<RejectedInput>,
}

impl SourceBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file. Paths are unique within a batch. A file without an
    /// explicit source id gets its position in the batch.
    pub fn add(&mut self, mut file: SourceFile) -> EngineResult<()> {
        if self.files.iter().any(|f| f.path == file.path) {
            return Err(EngineError::input(
                file.path.clone(),
                "duplicate path in batch",
            ));
        }
        if file.source_id.is_none() {
            file.source_id = Some(self.files.len());
        }
        debug!(
            "Added '{}' ({} bytes, tree: {})",
            file.path,
            file.text.len(),
            file.tree.is_some()
        );
        self.files.push(file);
        Ok(())
    }

    pub fn with_file(mut self, file: SourceFile) -> EngineResult<Self> {
        self.add(file)?;
        Ok(self)
    }

    /// Add raw bytes plus an optional AST. Undecodable input is recorded as
    /// rejected instead of failing the batch. Returns whether it was kept.
    pub fn add_bytes(&mut self, path: &str, bytes: Vec<u8>, ast_json: Option<&str>) -> bool {
        let file = SourceFile::from_bytes(path, bytes).map(|file| match ast_json {
            Some(json) => file.with_ast_json(json),
            None => file,
        });

        match file.and_then(|file| self.add(file)) {
            Ok(()) => true,
            Err(error) => {
                self.reject(path, error);
                false
            }
        }
    }

    /// Read a source file (and optionally its AST) from disk.
    pub fn read_file(&mut self, path: impl AsRef<Path>, ast_path: Option<&Path>) -> bool {
        let path = path.as_ref();
        let display_path = path.display().to_string();

        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                self.reject(&display_path, EngineError::input(display_path.clone(), e.to_string()));
                return false;
            }
        };

        let ast_json = match ast_path.map(std::fs::read_to_string) {
            Some(Ok(json)) => Some(json),
            Some(Err(e)) => {
                warn!("Could not read AST for '{}': {}", display_path, e);
                None
            }
            None => None,
        };

        self.add_bytes(&display_path, bytes, ast_json.as_deref())
    }

    fn reject(&mut self, path: &str, error: EngineError) {
        warn!("Skipping input '{}': {}", path, error);
        self.rejected.push(RejectedInput {
            path: path.to_string(),
            error,
        });
    }

    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    pub fn rejected(&self) -> &[RejectedInput] {
        &self.rejected
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn file_by_source_id(&self, source_id: usize) -> Option<&SourceFile> {
        self.files.iter().find(|f| f.source_id == Some(source_id))
    }

    /// Resolve `range` against the file its index addresses, or `fallback`
    /// when the index is unknown to this batch.
    pub fn resolve(&self, range: &SourceRange, fallback: &SourceFile) -> EngineResult<Position> {
        self.file_for(range, fallback).resolve(range.offset)
    }

    /// The file `range` addresses, or `fallback` when its index is unknown.
    pub fn file_for<'a>(&'a self, range: &SourceRange, fallback: &'a SourceFile) -> &'a SourceFile {
        range
            .file_index
            .and_then(|index| self.file_by_source_id(index))
            .unwrap_or(fallback)
    }
}
