use crate::analysis::patterns::{first_argument, is_call_to};
use crate::analysis::find_all;
use crate::core::{DetectorDefinition, Hit, Severity};
use crate::representations::SourceFile;
use anyhow::Result;

pub fn definition() -> DetectorDefinition {
    DetectorDefinition::structural(
        "eip712-domain-incomplete",
        "Missing `version` or `salt` in EIP712 domain",
        "The EIP712 domain type hash should include both `version` and `salt`. Without them signatures cannot be invalidated across upgrades and may collide with other deployments.",
        Severity::Low,
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
        let Some(value) = decl.child("value") else { continue };
        if !is_call_to(value, "keccak256") {
            continue;
        }

        let type_string = first_argument(value)
            .filter(|arg| arg.is("Literal"))
            .and_then(|arg| arg.str_attr("value"));
        let Some(type_string) = type_string.filter(|s| s.contains("EIP712Domain")) else {
            continue;
        };

        let missing: Vec<&str> = ["version", "salt"]
            .into_iter()
            .filter(|field| !type_string.contains(field))
            .collect();
        if !missing.is_empty() {
            hits.push(
                Hit::new(decl.src())
                    .with_message(format!("domain type lacks {}", missing.join(" and "))),
            );
        }
    }

    Ok(hits)
}
