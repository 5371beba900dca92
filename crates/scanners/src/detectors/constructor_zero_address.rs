use crate::analysis::patterns::{
    binary_operands, guards_non_zero, is_identifier, is_zero_address, parameters, require_conditions,
};
use crate::analysis::{collect_all, find_all};
use crate::core::{DetectorDefinition, Hit, Severity};
use crate::representations::{SourceFile, SyntaxNode};
use anyhow::Result;

pub fn definition() -> DetectorDefinition {
    DetectorDefinition::structural(
        "constructor-zero-address",
        "Missing zero address check in constructor",
        "Constructors often take address parameters for owners or linked contracts. Without a check, a deployment mistake can set one of them to the zero address, which cannot act like a normal account and permanently burns anything sent to it. Revert in the constructor when an address parameter is zero.",
        Severity::Low,
        detect,
    )
}

fn is_address_parameter(param: &SyntaxNode) -> bool {
    param
        .child("typeName")
        .filter(|t| t.is("ElementaryTypeName"))
        .and_then(|t| t.str_attr("name"))
        .map_or(false, |name| name.starts_with("address"))
}

/// `if (name == address(0)) revert ..;` style guard.
fn reverts_on_zero(branch: &SyntaxNode, name: &str) -> bool {
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
    for constructor in find_all("FunctionDefinition", root) {
        let constructor = constructor?;
        if constructor.str_attr("kind") != Some("constructor") {
            continue;
        }

        let (conditions, branches) = match constructor.child("body") {
            Some(body) => (
                require_conditions(body)?,
                collect_all("IfStatement", body)?,
            ),
            None => (Vec::new(), Vec::new()),
        };

        for param in parameters(constructor) {
            if !is_address_parameter(param) {
                continue;
            }
            let Some(name) = param.str_attr("name").filter(|n| !n.is_empty()) else {
                continue;
            };

            let checked = conditions.iter().any(|c| guards_non_zero(c, name))
                || branches.iter().any(|b| reverts_on_zero(b, name));
            if !checked {
                hits.push(
                    Hit::new(param.src())
                        .with_message(format!("`{}` is not checked against address(0)", name)),
                );
            }
        }
    }

    Ok(hits)
}
