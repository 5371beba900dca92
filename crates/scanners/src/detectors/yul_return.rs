use crate::analysis::find_all;
use crate::core::{DetectorDefinition, Hit, Severity};
use crate::representations::{SourceFile, SyntaxNode};
use anyhow::Result;

pub fn definition() -> DetectorDefinition {
    DetectorDefinition::structural(
        "yul-return",
        "Avoid using return in Yul assembly blocks",
        "`return` inside an assembly block ends execution of the whole call, not just the block, so any Solidity code after it (including modifier bodies after `_`) never runs.",
        Severity::Low,
        detect,
    )
}

fn calls_return(assembly: &SyntaxNode) -> Result<bool> {
    let Some(block) = assembly.child("AST") else {
        return Ok(false);
    };
    for call in find_all("YulFunctionCall", block) {
        let name = call?.child("functionName").and_then(|n| n.str_attr("name"));
        if name == Some("return") {
            return Ok(true);
        }
    }
    Ok(false)
}

fn detect(file: &SourceFile) -> Result<Vec<Hit>> {
    let Some(root) = file.tree() else {
        return Ok(Vec::new());
    };

    let mut hits = Vec::new();
    for func in find_all("FunctionDefinition", root) {
        for assembly in find_all("InlineAssembly", func?) {
            let assembly = assembly?;
            if calls_return(assembly)? {
                hits.push(Hit::new(assembly.src()));
            }
        }
    }

    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::fixtures::*;
    use serde_json::json;

    fn yul_call(name: &str, at: usize) -> serde_json::Value {
        json!({
            "nodeType": "YulExpressionStatement",
            "src": src(at),
            "expression": {
                "nodeType": "YulFunctionCall",
                "src": src(at + 1),
                "functionName": {"nodeType": "YulIdentifier", "src": src(at + 2), "name": name},
                "arguments": []
            }
        })
    }

    fn assembly(statements: Vec<serde_json::Value>, at: usize) -> serde_json::Value {
        json!({
            "nodeType": "InlineAssembly",
            "src": src(at),
            "AST": {"nodeType": "YulBlock", "statements": statements}
        })
    }

    #[test]
    fn test_return_in_assembly_flags_block_once() {
        let body = vec![
            assembly(vec![yul_call("mstore", 42), yul_call("return", 45), yul_call("return", 48)], 40),
            assembly(vec![yul_call("revert", 62)], 60),
        ];
        let ast = unit(vec![contract("C", vec![function("f", vec![], body, 20)], 1)]);
        assert_eq!(offsets(&run(detect, ast)), vec![40]);
    }
}
