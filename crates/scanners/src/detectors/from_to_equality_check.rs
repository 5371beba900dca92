use crate::analysis::patterns::{binary_operands, is_identifier, parameters, require_conditions};
use crate::analysis::find_all;
use crate::core::{DetectorDefinition, Hit, Severity};
use crate::representations::{SourceFile, SyntaxNode};
use anyhow::Result;

pub fn definition() -> DetectorDefinition {
    DetectorDefinition::structural(
        "from-to-equality-check",
        "Missing comparison between `from` and `to` addresses",
        "Functions taking both `from` and `to` address parameters should make sure they differ. Self-transfers can bypass accounting that assumes distinct parties.",
        Severity::Low,
        detect,
    )
}

fn compares_from_to(condition: &SyntaxNode) -> bool {
    binary_operands(condition, "!=").map_or(false, |(left, right)| {
        (is_identifier(left, "from") && is_identifier(right, "to"))
            || (is_identifier(left, "to") && is_identifier(right, "from"))
    })
}

fn detect(file: &SourceFile) -> Result<Vec<Hit>> {
    let Some(root) = file.tree() else {
        return Ok(Vec::new());
    };

    let mut hits = Vec::new();
    for func in find_all("FunctionDefinition", root) {
        let func = func?;
        let names: Vec<&str> = parameters(func)
            .into_iter()
            .filter_map(|p| p.str_attr("name"))
            .collect();
        if !(names.contains(&"from") && names.contains(&"to")) {
            continue;
        }
        let Some(body) = func.child("body") else { continue };

        if !require_conditions(body)?.into_iter().any(compares_from_to) {
            hits.push(Hit::new(func.src()));
        }
    }

    Ok(hits)
}
