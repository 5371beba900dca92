use crate::analysis::patterns::{body_statements, require_condition};
use crate::analysis::find_all;
use crate::core::{DetectorDefinition, Hit, Severity};
use crate::representations::SourceFile;
use anyhow::Result;

pub fn definition() -> DetectorDefinition {
    DetectorDefinition::structural(
        "min-max-without-limits",
        "No limits when setting min/max amounts",
        "Functions that set minimum, maximum or threshold values should validate the new value with a `require`. Without bounds a mistaken call can leave the protocol in an invalid configuration.",
        Severity::Low,
        detect,
    )
}

const KEYWORDS: [&str; 7] = ["min", "max", "minimum", "maximum", "limit", "cap", "threshold"];

fn detect(file: &SourceFile) -> Result<Vec<Hit>> {
    let Some(root) = file.tree() else {
        return Ok(Vec::new());
    };

    let mut hits = Vec::new();
    for func in find_all("FunctionDefinition", root) {
        let func = func?;
        let Some(name) = func.str_attr("name") else { continue };
        let lower = name.to_lowercase();
        if !KEYWORDS.iter().any(|keyword| lower.contains(keyword)) {
            continue;
        }
        // Getters and declarations without a body set nothing.
        if func.child("body").is_none()
            || matches!(func.str_attr("stateMutability"), Some("view") | Some("pure"))
        {
            continue;
        }

        let validated = body_statements(func)
            .into_iter()
            .any(|statement| require_condition(statement).is_some());
        if !validated {
            hits.push(
                Hit::new(func.src())
                    .with_message(format!("Function {} sets min/max amounts without require checks.", name)),
            );
        }
    }

    Ok(hits)
}
