//! JSON AST builders for detector unit tests. Every node gets a distinct
//! offset so tests can assert exactly which node a hit points at.

use crate::core::{Hit, StructuralFn};
use crate::representations::{SourceFile, SyntaxNode};
use serde_json::{json, Value};

pub fn src(at: usize) -> String {
    format!("{}:1:0", at)
}

pub fn run(detect: StructuralFn, unit: Value) -> Vec<Hit> {
    let tree = SyntaxNode::from_json(&unit).unwrap();
    let file = SourceFile::new("Test.sol", "").with_source_id(0).with_tree(tree);
    detect(&file).unwrap()
}

pub fn offsets(hits: &[Hit]) -> Vec<usize> {
    hits.iter().map(|hit| hit.range.offset).collect()
}

pub fn unit(nodes: Vec<Value>) -> Value {
    json!({"nodeType": "SourceUnit", "src": "0:100000:0", "nodes": nodes})
}

pub fn contract(name: &str, nodes: Vec<Value>, at: usize) -> Value {
    json!({
        "nodeType": "ContractDefinition",
        "src": src(at),
        "name": name,
        "contractKind": "contract",
        "nodes": nodes
    })
}

pub fn ident(name: &str, at: usize) -> Value {
    json!({"nodeType": "Identifier", "src": src(at), "name": name})
}

pub fn number(value: &str, at: usize) -> Value {
    json!({"nodeType": "Literal", "src": src(at), "kind": "number", "value": value})
}

pub fn string(value: &str, at: usize) -> Value {
    json!({"nodeType": "Literal", "src": src(at), "kind": "string", "value": value})
}

pub fn member(base: Value, name: &str, at: usize) -> Value {
    json!({"nodeType": "MemberAccess", "src": src(at), "memberName": name, "expression": base})
}

pub fn index(base: Value, key: Value, at: usize) -> Value {
    json!({"nodeType": "IndexAccess", "src": src(at), "baseExpression": base, "indexExpression": key})
}

pub fn call(callee: Value, arguments: Vec<Value>, at: usize) -> Value {
    json!({
        "nodeType": "FunctionCall",
        "src": src(at),
        "kind": "functionCall",
        "expression": callee,
        "arguments": arguments
    })
}

pub fn cast(type_name: &str, argument: Value, at: usize) -> Value {
    json!({
        "nodeType": "FunctionCall",
        "src": src(at),
        "kind": "typeConversion",
        "expression": {
            "nodeType": "ElementaryTypeNameExpression",
            "src": src(at),
            "typeName": {"nodeType": "ElementaryTypeName", "src": src(at), "name": type_name}
        },
        "arguments": [argument]
    })
}

pub fn binary(left: Value, operator: &str, right: Value, at: usize) -> Value {
    json!({
        "nodeType": "BinaryOperation",
        "src": src(at),
        "operator": operator,
        "leftExpression": left,
        "rightExpression": right
    })
}

pub fn assign(left: Value, right: Value, at: usize) -> Value {
    json!({
        "nodeType": "Assignment",
        "src": src(at),
        "operator": "=",
        "leftHandSide": left,
        "rightHandSide": right
    })
}

pub fn statement(expression: Value, at: usize) -> Value {
    json!({"nodeType": "ExpressionStatement", "src": src(at), "expression": expression})
}

pub fn require(condition: Value, at: usize) -> Value {
    statement(call(ident("require", at + 1), vec![condition], at + 2), at)
}

pub fn block(statements: Vec<Value>, at: usize) -> Value {
    json!({"nodeType": "Block", "src": src(at), "statements": statements})
}

pub fn for_loop(body: Vec<Value>, at: usize) -> Value {
    json!({
        "nodeType": "ForStatement",
        "src": src(at),
        "initializationExpression": null,
        "condition": null,
        "loopExpression": null,
        "body": block(body, at + 1)
    })
}

pub fn elementary(name: &str, at: usize) -> Value {
    json!({"nodeType": "ElementaryTypeName", "src": src(at), "name": name})
}

pub fn array_of(base: Value, at: usize) -> Value {
    json!({"nodeType": "ArrayTypeName", "src": src(at), "baseType": base, "length": null})
}

pub fn variable(name: &str, type_name: Value, at: usize) -> Value {
    json!({
        "nodeType": "VariableDeclaration",
        "src": src(at),
        "name": name,
        "typeName": type_name,
        "stateVariable": false,
        "constant": false,
        "mutability": "mutable",
        "value": null
    })
}

pub fn state_variable(name: &str, type_name: Value, at: usize) -> Value {
    let mut decl = variable(name, type_name, at);
    decl["stateVariable"] = json!(true);
    decl
}

pub fn function(name: &str, parameters: Vec<Value>, statements: Vec<Value>, at: usize) -> Value {
    json!({
        "nodeType": "FunctionDefinition",
        "src": src(at),
        "name": name,
        "kind": "function",
        "visibility": "public",
        "stateMutability": "nonpayable",
        "modifiers": [],
        "parameters": {"nodeType": "ParameterList", "src": src(at + 1), "parameters": parameters},
        "body": block(statements, at + 2)
    })
}

pub fn modifier_invocation(name: &str, at: usize) -> Value {
    json!({
        "nodeType": "ModifierInvocation",
        "src": src(at),
        "modifierName": {"nodeType": "IdentifierPath", "src": src(at), "name": name}
    })
}
