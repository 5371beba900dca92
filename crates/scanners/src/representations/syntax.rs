//! Generic syntax tree built from the compiler's JSON AST.
//!
//! Nodes are not typed per kind. Every node carries its kind tag, its source
//! range, and a map of named fields; a field is an optional child, an
//! ordered sequence of children, or a scalar. Detectors query fields by
//! name, and the walker visits children without knowing any node shape.

use crate::core::{EngineError, EngineResult};
use crate::representations::source::SourceRange;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Nesting bound applied when converting and walking trees.
pub const MAX_TREE_DEPTH: usize = 1024;

/// JSON nesting accepted on intake. A node takes up to two levels (its
/// object plus the array holding it) and compiler output may wrap the tree.
pub const MAX_JSON_NESTING: usize = 2 * MAX_TREE_DEPTH + 16;

const KIND_KEY: &str = "nodeType";
const SRC_KEY: &str = "src";

#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Child(Option<Box<SyntaxNode>>),
    Sequence(Vec<Option<SyntaxNode>>),
    Scalar(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxNode {
    kind: String,
    src: SourceRange,
    fields: BTreeMap<String, Field>,
}

impl SyntaxNode {
    pub fn new(kind: impl Into<String>, src: SourceRange) -> Self {
        Self {
            kind: kind.into(),
            src,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, field: Field) -> Self {
        self.fields.insert(name.into(), field);
        self
    }

    pub fn with_child(self, name: impl Into<String>, child: SyntaxNode) -> Self {
        self.with_field(name, Field::Child(Some(Box::new(child))))
    }

    pub fn with_sequence(self, name: impl Into<String>, children: Vec<SyntaxNode>) -> Self {
        self.with_field(name, Field::Sequence(children.into_iter().map(Some).collect()))
    }

    pub fn with_attr(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with_field(name, Field::Scalar(value.into()))
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn is(&self, kind: &str) -> bool {
        self.kind == kind
    }

    pub fn src(&self) -> SourceRange {
        self.src
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(name, field)| (name.as_str(), field))
    }

    /// The single child stored under `name`, if present and non-null.
    pub fn child(&self, name: &str) -> Option<&SyntaxNode> {
        match self.fields.get(name)? {
            Field::Child(child) => child.as_deref(),
            _ => None,
        }
    }

    /// Present children under `name`: the elements of a sequence (nulls
    /// skipped) or the single child. Empty for anything else.
    pub fn children(&self, name: &str) -> Vec<&SyntaxNode> {
        match self.fields.get(name) {
            Some(Field::Sequence(items)) => items.iter().flatten().collect(),
            Some(Field::Child(Some(child))) => vec![child.as_ref()],
            _ => Vec::new(),
        }
    }

    /// Raw sequence under `name`, keeping null slots so positions stay
    /// meaningful (e.g. `(, address b) = ...`).
    pub fn sequence(&self, name: &str) -> &[Option<SyntaxNode>] {
        match self.fields.get(name) {
            Some(Field::Sequence(items)) => items,
            _ => &[],
        }
    }

    pub fn attr(&self, name: &str) -> Option<&Value> {
        match self.fields.get(name)? {
            Field::Scalar(value) => Some(value),
            _ => None,
        }
    }

    pub fn str_attr(&self, name: &str) -> Option<&str> {
        self.attr(name)?.as_str()
    }

    pub fn bool_attr(&self, name: &str) -> Option<bool> {
        self.attr(name)?.as_bool()
    }

    /// All direct children across every field, in source order. Ties keep
    /// field order, so the result is deterministic.
    pub fn child_nodes(&self) -> Vec<&SyntaxNode> {
        let mut nodes: Vec<&SyntaxNode> = Vec::new();
        for field in self.fields.values() {
            match field {
                Field::Child(Some(child)) => nodes.push(child),
                Field::Sequence(items) => nodes.extend(items.iter().flatten()),
                _ => {}
            }
        }
        nodes.sort_by_key(|node| node.src.offset);
        nodes
    }

    pub fn from_json(value: &Value) -> EngineResult<Self> {
        Self::from_json_bounded(value, MAX_TREE_DEPTH)
    }

    pub fn from_json_bounded(value: &Value, max_depth: usize) -> EngineResult<Self> {
        let object = value
            .as_object()
            .filter(|o| o.contains_key(KIND_KEY))
            .ok_or_else(|| EngineError::structural("tree root is not a node object"))?;
        convert_node(object, None, 0, max_depth)
    }
}

/// Parse AST JSON text. The nesting is checked before parsing, so
/// `MAX_TREE_DEPTH` rather than the JSON reader's own recursion limit
/// decides how deep a tree may be.
pub fn parse_ast_json(json: &str) -> EngineResult<Value> {
    let nesting = json_nesting(json);
    if nesting > MAX_JSON_NESTING {
        return Err(EngineError::structural(format!(
            "AST JSON nesting of {} exceeds {} levels",
            nesting, MAX_JSON_NESTING
        )));
    }

    let invalid = |e: serde_json::Error| EngineError::structural(format!("AST is not valid JSON: {}", e));

    let mut reader = serde_json::Deserializer::from_str(json);
    reader.disable_recursion_limit();
    let value = Value::deserialize(serde_stacker::Deserializer::new(&mut reader)).map_err(invalid)?;
    reader.end().map_err(invalid)?;
    Ok(value)
}

/// Deepest bracket nesting outside string literals.
fn json_nesting(json: &str) -> usize {
    let mut depth = 0usize;
    let mut deepest = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for byte in json.bytes() {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' | b'[' => {
                depth += 1;
                deepest = deepest.max(depth);
            }
            b'}' | b']' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    deepest
}

fn is_node(value: &Value) -> bool {
    value
        .as_object()
        .map_or(false, |object| object.contains_key(KIND_KEY))
}

fn convert_node(
    object: &Map<String, Value>,
    parent_src: Option<SourceRange>,
    depth: usize,
    max_depth: usize,
) -> EngineResult<SyntaxNode> {
    if depth > max_depth {
        return Err(EngineError::structural(format!(
            "tree nesting exceeds {} levels",
            max_depth
        )));
    }

    let kind = object
        .get(KIND_KEY)
        .and_then(Value::as_str)
        .ok_or_else(|| EngineError::structural("node kind is not a string"))?;

    let src = match object.get(SRC_KEY) {
        Some(Value::String(s)) => s.parse::<SourceRange>()?,
        Some(other) => {
            return Err(EngineError::structural(format!(
                "{} has non-string src {}",
                kind, other
            )))
        }
        None => parent_src.unwrap_or_default(),
    };

    let mut node = SyntaxNode::new(kind, src);
    for (name, value) in object {
        if name == KIND_KEY || name == SRC_KEY {
            continue;
        }
        let field = convert_field(value, src, depth, max_depth)?;
        node.fields.insert(name.clone(), field);
    }

    Ok(node)
}

fn convert_field(
    value: &Value,
    parent_src: SourceRange,
    depth: usize,
    max_depth: usize,
) -> EngineResult<Field> {
    match value {
        Value::Null => Ok(Field::Child(None)),
        Value::Object(object) if object.contains_key(KIND_KEY) => {
            let child = convert_node(object, Some(parent_src), depth + 1, max_depth)?;
            Ok(Field::Child(Some(Box::new(child))))
        }
        Value::Array(items) if is_node_sequence(items) => {
            let children = items
                .iter()
                .map(|item| match item.as_object() {
                    Some(object) => {
                        convert_node(object, Some(parent_src), depth + 1, max_depth).map(Some)
                    }
                    None => Ok(None),
                })
                .collect::<EngineResult<Vec<_>>>()?;
            Ok(Field::Sequence(children))
        }
        other => Ok(Field::Scalar(other.clone())),
    }
}

fn is_node_sequence(items: &[Value]) -> bool {
    items.iter().all(|item| item.is_null() || is_node(item))
        && (items.is_empty() || items.iter().any(is_node))
}
