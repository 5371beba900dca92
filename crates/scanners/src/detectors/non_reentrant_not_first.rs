use crate::analysis::patterns::modifier_names;
use crate::analysis::find_all;
use crate::core::{DetectorDefinition, Hit, Severity};
use crate::representations::SourceFile;
use anyhow::Result;

pub fn definition() -> DetectorDefinition {
    DetectorDefinition::structural(
        "non-reentrant-not-first",
        "The nonReentrant modifier should be first in a function declaration",
        "Modifiers run in declaration order. When `nonReentrant` is not first, the modifiers before it execute without reentrancy protection and can be reentered.",
        Severity::Low,
        detect,
    )
}

fn detect(file: &SourceFile) -> Result<Vec<Hit>> {
    let Some(root) = file.tree() else {
        return Ok(Vec::new());
    };

    let mut hits = Vec::new();
    for func in find_all("FunctionDefinition", root) {
        let func = func?;
        let modifiers = modifier_names(func);
        if let Some(position) = modifiers.iter().position(|name| *name == "nonReentrant") {
            if position > 0 {
                hits.push(Hit::new(func.src()).with_message(format!(
                    "nonReentrant is preceded by `{}`",
                    modifiers[..position].join("`, `")
                )));
            }
        }
    }

    Ok(hits)
}
