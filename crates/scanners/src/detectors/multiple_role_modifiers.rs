use crate::analysis::patterns::{is_identifier, member_access, require_conditions};
use crate::analysis::find_all;
use crate::core::{DetectorDefinition, Hit, Severity};
use crate::representations::{SourceFile, SyntaxNode};
use anyhow::Result;

pub fn definition() -> DetectorDefinition {
    DetectorDefinition::structural(
        "multiple-role-modifiers",
        "Multiple onlyXYZ modifiers complicate privilege management",
        "Several hand-written modifiers that each compare `msg.sender` against a different role make privileges hard to audit and change. Consider OpenZeppelin's AccessControl for role-based permissions.",
        Severity::Low,
        detect,
    )
}

fn is_msg_sender(node: &SyntaxNode) -> bool {
    member_access(node, "sender").map_or(false, |base| is_identifier(base, "msg"))
}

fn checks_sender(condition: &SyntaxNode) -> bool {
    condition.is("BinaryOperation")
        && (condition.child("leftExpression").map_or(false, is_msg_sender)
            || condition.child("rightExpression").map_or(false, is_msg_sender))
}

fn detect(file: &SourceFile) -> Result<Vec<Hit>> {
    let Some(root) = file.tree() else {
        return Ok(Vec::new());
    };

    let mut hits = Vec::new();
    for contract in find_all("ContractDefinition", root) {
        let contract = contract?;

        let mut role_modifiers = Vec::new();
        for modifier in find_all("ModifierDefinition", contract) {
            let modifier = modifier?;
            if require_conditions(modifier)?.into_iter().any(checks_sender) {
                role_modifiers.push(modifier);
            }
        }

        if role_modifiers.len() > 1 {
            hits.extend(role_modifiers.into_iter().map(|m| Hit::new(m.src())));
        }
    }

    Ok(hits)
}
