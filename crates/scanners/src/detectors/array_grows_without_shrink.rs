//! Dynamic state arrays that only ever grow.
//!
//! Two passes per contract: first record every array name that is pushed to
//! and every name that is shrunk (`pop()`, `delete`, a `.length` assignment,
//! or an indexed overwrite), then flag state array declarations that are
//! grown but never shrunk.

use crate::analysis::patterns::{callee, identifier_name, member_access};
use crate::analysis::{find_all, walk};
use crate::core::{DetectorDefinition, Hit, Severity};
use crate::representations::{SourceFile, SyntaxNode};
use anyhow::Result;
use std::collections::BTreeSet;

pub fn definition() -> DetectorDefinition {
    DetectorDefinition::structural(
        "array-grows-without-shrink",
        "Array can grow in size without a way to shrink it",
        "State arrays that only ever grow through `push` keep accumulating storage and make any loop over them more expensive over time. Provide a way to remove elements (`pop`, `delete`, or overwriting slots) for arrays that are pushed to.",
        Severity::Low,
        detect,
    )
}

#[derive(Default)]
struct ArrayUsage<'a> {
    grown: BTreeSet<&'a str>,
    shrunk: BTreeSet<&'a str>,
}

impl<'a> ArrayUsage<'a> {
    fn record(&mut self, node: &'a SyntaxNode) {
        match node.kind() {
            "FunctionCall" => {
                let Some(target) = callee(node) else { return };
                if let Some(name) = member_access(target, "push").and_then(identifier_name) {
                    self.grown.insert(name);
                }
                if let Some(name) = member_access(target, "pop").and_then(identifier_name) {
                    self.shrunk.insert(name);
                }
            }
            "Assignment" => {
                let Some(lhs) = node.child("leftHandSide") else { return };
                if let Some(name) = member_access(lhs, "length").and_then(identifier_name) {
                    self.shrunk.insert(name);
                }
                if let Some(name) = indexed_base(lhs) {
                    self.shrunk.insert(name);
                }
            }
            "UnaryOperation" if node.str_attr("operator") == Some("delete") => {
                let Some(target) = node.child("subExpression") else { return };
                if let Some(name) = identifier_name(target).or_else(|| indexed_base(target)) {
                    self.shrunk.insert(name);
                }
            }
            _ => {}
        }
    }
}

fn indexed_base(node: &SyntaxNode) -> Option<&str> {
    if node.is("IndexAccess") {
        node.child("baseExpression").and_then(identifier_name)
    } else {
        None
    }
}

fn is_dynamic_state_array(decl: &SyntaxNode) -> bool {
    decl.is("VariableDeclaration")
        && decl.bool_attr("stateVariable") == Some(true)
        && decl.child("typeName").map_or(false, |t| t.is("ArrayTypeName"))
}

fn detect(file: &SourceFile) -> Result<Vec<Hit>> {
    let Some(root) = file.tree() else {
        return Ok(Vec::new());
    };

    let mut hits = Vec::new();
    for contract in find_all("ContractDefinition", root) {
        let contract = contract?;

        let mut usage = ArrayUsage::default();
        for node in walk(contract) {
            usage.record(node?);
        }

        for decl in contract.children("nodes") {
            if !is_dynamic_state_array(decl) {
                continue;
            }
            let Some(name) = decl.str_attr("name") else { continue };
            if usage.grown.contains(name) && !usage.shrunk.contains(name) {
                hits.push(
                    Hit::new(decl.src())
                        .with_message(format!("`{}` is pushed to but never shrunk", name)),
                );
            }
        }
    }

    Ok(hits)
}
