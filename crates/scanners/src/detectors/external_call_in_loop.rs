//! Member calls made from inside loop bodies.
//!
//! Any `target.method(..)` call under a `for`, `while` or `do` loop is
//! reported once, however many loops enclose it. Type conversions, struct
//! constructors and built-in members that never leave the contract
//! (`push`, `pop`, `abi.*`, `bytes.concat`) are skipped.

use crate::analysis::patterns::{callee, identifier_name};
use crate::analysis::{find_all, walk};
use crate::core::{DetectorDefinition, Hit, Severity};
use crate::representations::{SourceFile, SyntaxNode};
use anyhow::Result;
use std::collections::BTreeSet;

pub fn definition() -> DetectorDefinition {
    DetectorDefinition::structural(
        "external-call-in-loop",
        "External function calls within loops",
        "Calling external functions inside loops can easily run out of gas, making transaction failures and denial of service far more likely. Limit the number of iterations that make external calls and the gas forwarded to each.",
        Severity::Low,
        detect,
    )
}

const LOOP_KINDS: [&str; 3] = ["ForStatement", "WhileStatement", "DoWhileStatement"];
const LOCAL_MEMBERS: [&str; 3] = ["push", "pop", "concat"];
const LOCAL_BASES: [&str; 4] = ["abi", "bytes", "string", "super"];

fn is_external_call(call: &SyntaxNode) -> bool {
    if call.str_attr("kind").map_or(false, |kind| kind != "functionCall") {
        return false;
    }
    let Some(target) = callee(call).filter(|c| c.is("MemberAccess")) else {
        return false;
    };
    if target
        .str_attr("memberName")
        .map_or(true, |member| LOCAL_MEMBERS.iter().any(|m| *m == member))
    {
        return false;
    }
    !target
        .child("expression")
        .and_then(identifier_name)
        .map_or(false, |base| LOCAL_BASES.iter().any(|b| *b == base))
}

fn detect(file: &SourceFile) -> Result<Vec<Hit>> {
    let Some(root) = file.tree() else {
        return Ok(Vec::new());
    };

    let mut seen = BTreeSet::new();
    let mut hits = Vec::new();
    for node in walk(root) {
        let node = node?;
        if !LOOP_KINDS.iter().any(|kind| node.is(kind)) {
            continue;
        }
        for call in find_all("FunctionCall", node) {
            let call = call?;
            if is_external_call(call) && seen.insert(call.src()) {
                hits.push(Hit::new(call.src()));
            }
        }
    }

    hits.sort_by_key(|hit| hit.range.offset);
    Ok(hits)
}
