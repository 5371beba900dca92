//! Program representations consumed by detectors
//!
//! Textual detectors read a file's raw text; structural detectors read the
//! syntax tree the compiler produced for it. Both hang off [`SourceFile`],
//! which also owns the line index used to turn compiler byte ranges into
//! `path:line:column` positions.

pub mod source;
pub mod syntax;

pub use source::{LineIndex, RejectedInput, SourceBatch, SourceFile, SourceRange};
pub use syntax::{parse_ast_json, Field, SyntaxNode, MAX_JSON_NESTING, MAX_TREE_DEPTH};
