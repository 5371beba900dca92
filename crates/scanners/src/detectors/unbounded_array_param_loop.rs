use crate::analysis::patterns::{binary_operands, member_access, parameters, require_conditions};
use crate::analysis::{find_all, walk};
use crate::core::{DetectorDefinition, Hit, Severity};
use crate::representations::{SourceFile, SyntaxNode};
use anyhow::Result;

pub fn definition() -> DetectorDefinition {
    DetectorDefinition::structural(
        "unbounded-array-param-loop",
        "Unbounded array parameter iterated in an externally callable function",
        "Public and external functions that loop over caller-supplied arrays can be handed arrays large enough to exhaust the block gas limit. Bound the array length before looping.",
        Severity::Low,
        detect,
    )
}

const LOOP_KINDS: [&str; 3] = ["ForStatement", "WhileStatement", "DoWhileStatement"];

fn is_length_bound(condition: &SyntaxNode) -> bool {
    ["<=", "<"].into_iter().any(|op| {
        binary_operands(condition, op).map_or(false, |(left, _)| member_access(left, "length").is_some())
    })
}

fn detect(file: &SourceFile) -> Result<Vec<Hit>> {
    let Some(root) = file.tree() else {
        return Ok(Vec::new());
    };

    let mut hits = Vec::new();
    for func in find_all("FunctionDefinition", root) {
        let func = func?;
        if !matches!(func.str_attr("visibility"), Some("external") | Some("public")) {
            continue;
        }
        let takes_array = parameters(func)
            .into_iter()
            .any(|p| p.child("typeName").map_or(false, |t| t.is("ArrayTypeName")));
        let Some(body) = func.child("body").filter(|_| takes_array) else {
            continue;
        };

        let mut loops = false;
        for node in walk(body) {
            let node = node?;
            if LOOP_KINDS.iter().any(|kind| node.is(kind)) {
                loops = true;
                break;
            }
        }
        if loops && !require_conditions(body)?.into_iter().any(is_length_bound) {
            hits.push(Hit::new(func.src()));
        }
    }

    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::fixtures::*;

    fn batch_fn(body: Vec<serde_json::Value>, at: usize) -> serde_json::Value {
        let mut func = function(
            "batch",
            vec![variable("ids", array_of(elementary("uint256", at - 3), at - 2), at - 4)],
            body,
            at,
        );
        func["visibility"] = serde_json::json!("external");
        func
    }

    #[test]
    fn test_loop_over_unbounded_parameter() {
        let ast = unit(vec![contract("C", vec![batch_fn(vec![for_loop(vec![], 40)], 20)], 1)]);
        assert_eq!(offsets(&run(detect, ast)), vec![20]);
    }

    #[test]
    fn test_length_bound_suppresses() {
        let bound = require(
            binary(member(ident("ids", 34), "length", 33), "<=", number("50", 35), 32),
            30,
        );
        let ast = unit(vec![contract(
            "C",
            vec![batch_fn(vec![bound, for_loop(vec![], 40)], 20)],
            1,
        )]);
        assert!(run(detect, ast).is_empty());
    }

    #[test]
    fn test_internal_functions_are_ignored() {
        let mut func = batch_fn(vec![for_loop(vec![], 40)], 20);
        func["visibility"] = serde_json::json!("internal");
        let ast = unit(vec![contract("C", vec![func], 1)]);
        assert!(run(detect, ast).is_empty());
    }
}
