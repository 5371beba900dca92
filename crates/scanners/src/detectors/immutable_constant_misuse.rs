use crate::analysis::find_all;
use crate::core::{DetectorDefinition, Hit, Severity};
use crate::representations::SourceFile;
use anyhow::Result;

pub fn definition() -> DetectorDefinition {
    DetectorDefinition::structural(
        "immutable-constant-misuse",
        "Use `immutable` for calculated values and `constant` for literal values",
        "The compiler handles both cases the same way, but `constant` is meant for literal values written in the code and `immutable` for expressions or values computed and assigned in the constructor. Using the right keyword states the intent.",
        Severity::Informational,
        detect,
    )
}

fn detect(file: &SourceFile) -> Result<Vec<Hit>> {
    let Some(root) = file.tree() else {
        return Ok(Vec::new());
    };

    let mut hits = Vec::new();
    for decl in find_all("VariableDeclaration", root) {
        let decl = decl?;
        if decl.bool_attr("stateVariable") != Some(true) {
            continue;
        }
        let Some(value) = decl.child("value") else { continue };

        let constant = decl.bool_attr("constant") == Some(true)
            || decl.str_attr("mutability") == Some("constant");
        let immutable = decl.str_attr("mutability") == Some("immutable");

        if constant && !value.is("Literal") {
            hits.push(Hit::new(decl.src()).with_message("constant initialised with a computed expression"));
        } else if immutable && value.is("Literal") {
            hits.push(Hit::new(decl.src()).with_message("immutable initialised with a literal"));
        }
    }

    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::fixtures::*;
    use serde_json::json;

    #[test]
    fn test_both_misuses_are_flagged() {
        let mut computed_constant = state_variable("HASH", elementary("bytes32", 11), 10);
        computed_constant["constant"] = json!(true);
        computed_constant["mutability"] = json!("constant");
        computed_constant["value"] = call(ident("keccak256", 13), vec![string("x", 14)], 12);

        let mut literal_immutable = state_variable("FEE", elementary("uint256", 21), 20);
        literal_immutable["mutability"] = json!("immutable");
        literal_immutable["value"] = number("30", 22);

        let mut literal_constant = state_variable("MAX", elementary("uint256", 31), 30);
        literal_constant["constant"] = json!(true);
        literal_constant["mutability"] = json!("constant");
        literal_constant["value"] = number("100", 32);

        let ast = unit(vec![contract(
            "C",
            vec![computed_constant, literal_immutable, literal_constant],
            1,
        )]);

        let hits = run(detect, ast);
        assert_eq!(offsets(&hits), vec![10, 20]);
    }
}
