use crate::analysis::patterns::{binary_operands, callee, is_zero_literal, member_access, require_conditions};
use crate::analysis::find_all;
use crate::core::{DetectorDefinition, Hit, Severity};
use crate::representations::{SourceFile, SyntaxNode};
use anyhow::Result;

pub fn definition() -> DetectorDefinition {
    DetectorDefinition::structural(
        "array-push-without-check",
        "Array push without existence check",
        "Pushing to an array without first checking whether the element is already present can bloat the array with duplicates and waste gas. Check for existence before calling `push`.",
        Severity::Low,
        detect,
    )
}

/// `x.length != 0`, the shape the check is recognised by.
fn is_length_check(condition: &SyntaxNode) -> bool {
    binary_operands(condition, "!=").map_or(false, |(left, right)| {
        member_access(left, "length").is_some() && is_zero_literal(right)
    })
}

fn detect(file: &SourceFile) -> Result<Vec<Hit>> {
    let Some(root) = file.tree() else {
        return Ok(Vec::new());
    };

    let mut hits = Vec::new();
    for func in find_all("FunctionDefinition", root) {
        let func = func?;
        let Some(body) = func.child("body") else { continue };

        let mut pushes = false;
        for call in find_all("FunctionCall", body) {
            if callee(call?).and_then(|c| member_access(c, "push")).is_some() {
                pushes = true;
                break;
            }
        }
        if !pushes {
            continue;
        }

        let mut checked = false;
        for branch in find_all("IfStatement", body) {
            if branch?.child("condition").map_or(false, is_length_check) {
                checked = true;
                break;
            }
        }
        if !checked {
            checked = require_conditions(body)?.into_iter().any(is_length_check);
        }

        if !checked {
            hits.push(Hit::new(func.src()));
        }
    }

    Ok(hits)
}
