use crate::analysis::patterns::{call_arguments, callee_name};
use crate::analysis::find_all;
use crate::core::{DetectorDefinition, Hit, Severity};
use crate::representations::{SourceFile, SyntaxNode};
use anyhow::Result;

pub fn definition() -> DetectorDefinition {
    DetectorDefinition::structural(
        "payable-without-withdraw",
        "Contract contains payable functions but no withdraw/sweep/transfer function",
        "Payable functions let the contract receive Ether. Without a function that transfers Ether back out, any balance it receives is locked forever.",
        Severity::Medium,
        detect,
    )
}

/// `.transfer(..)`, `.send(..)`, `.sendValue(..)` or a `.call{..}(..)`
/// with arguments.
fn moves_ether(call: &SyntaxNode) -> bool {
    match callee_name(call) {
        Some("transfer") | Some("send") | Some("sendValue") => {
            call.child("expression").map_or(false, |e| !e.is("Identifier"))
        }
        Some("call") => !call_arguments(call).is_empty(),
        _ => false,
    }
}

fn detect(file: &SourceFile) -> Result<Vec<Hit>> {
    let Some(root) = file.tree() else {
        return Ok(Vec::new());
    };

    let mut hits = Vec::new();
    for contract in find_all("ContractDefinition", root) {
        let contract = contract?;
        if contract.str_attr("contractKind") == Some("interface") {
            continue;
        }

        let mut payable = false;
        let mut withdraws = false;
        for func in find_all("FunctionDefinition", contract) {
            let func = func?;
            payable |= func.str_attr("stateMutability") == Some("payable");
            for call in find_all("FunctionCall", func) {
                if moves_ether(call?) {
                    withdraws = true;
                    break;
                }
            }
        }

        if payable && !withdraws {
            hits.push(Hit::new(contract.src()));
        }
    }

    Ok(hits)
}
