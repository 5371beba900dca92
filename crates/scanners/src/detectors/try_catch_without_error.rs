use crate::analysis::find_all;
use crate::core::{DetectorDefinition, Hit, Severity};
use crate::representations::{SourceFile, SyntaxNode};
use anyhow::Result;

pub fn definition() -> DetectorDefinition {
    DetectorDefinition::structural(
        "try-catch-without-error",
        "Try-catch without human-readable error handling",
        "A try/catch should include a `catch Error(string memory reason)` clause so revert reasons are captured, which makes failures easier to debug.",
        Severity::Informational,
        detect,
    )
}

fn catches_error_string(clause: &SyntaxNode) -> bool {
    clause.str_attr("errorName") == Some("Error")
        && clause
            .child("parameters")
            .map_or(false, |list| !list.children("parameters").is_empty())
}

fn detect(file: &SourceFile) -> Result<Vec<Hit>> {
    let Some(root) = file.tree() else {
        return Ok(Vec::new());
    };

    let mut hits = Vec::new();
    for attempt in find_all("TryStatement", root) {
        let attempt = attempt?;
        if !attempt.children("clauses").into_iter().any(catches_error_string) {
            hits.push(Hit::new(attempt.src()));
        }
    }

    Ok(hits)
}
