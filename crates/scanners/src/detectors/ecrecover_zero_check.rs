use crate::analysis::patterns::{binary_operands, guards_non_zero, is_call_to, is_identifier, is_zero_address, require_conditions};
use crate::analysis::{collect_all, find_all};
use crate::core::{DetectorDefinition, Hit, Severity};
use crate::representations::{SourceFile, SyntaxNode};
use anyhow::Result;

pub fn definition() -> DetectorDefinition {
    DetectorDefinition::structural(
        "ecrecover-zero-check",
        "Ensure the `ecrecover` result is checked for non-zero",
        "`ecrecover` returns the zero address for invalid signatures (for example when `v` is neither 27 nor 28) instead of reverting. Unless the recovered address is checked against zero, an invalid signature can pass as a signature from an uninitialised or zero-valued signer.",
        Severity::Medium,
        detect,
    )
}

/// `if (signer == address(0))` in either operand order.
fn compares_to_zero(branch: &SyntaxNode, name: &str) -> bool {
    branch
        .child("condition")
        .and_then(|c| binary_operands(c, "=="))
        .map_or(false, |(left, right)| {
            (is_identifier(left, name) && is_zero_address(right))
                || (is_identifier(right, name) && is_zero_address(left))
        })
}

fn detect(file: &SourceFile) -> Result<Vec<Hit>> {
    let Some(root) = file.tree() else {
        return Ok(Vec::new());
    };

    let mut hits = Vec::new();
    for func in find_all("FunctionDefinition", root) {
        let func = func?;

        let mut recoveries = Vec::new();
        for declaration in find_all("VariableDeclarationStatement", func) {
            let declaration = declaration?;
            let recovers = declaration
                .child("initialValue")
                .map_or(false, |value| is_call_to(value, "ecrecover"));
            let recovered = declaration
                .sequence("declarations")
                .first()
                .and_then(Option::as_ref)
                .and_then(|decl| decl.str_attr("name"));
            if let (true, Some(name)) = (recovers, recovered) {
                recoveries.push((declaration, name));
            }
        }
        if recoveries.is_empty() {
            continue;
        }

        let conditions = require_conditions(func)?;
        let branches = collect_all("IfStatement", func)?;
        for (declaration, name) in recoveries {
            let checked = conditions.iter().any(|c| guards_non_zero(c, name))
                || branches.iter().any(|b| compares_to_zero(b, name));
            if !checked {
                hits.push(Hit::new(declaration.src()));
            }
        }
    }

    Ok(hits)
}
