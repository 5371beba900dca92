//! Shared node predicates for structural detectors.
//!
//! Field names follow the compact JSON AST emitted by solc (`expression`,
//! `arguments`, `leftExpression`, `memberName`, ...). Every helper tolerates
//! missing fields and returns `None`/`false` rather than failing.

use crate::analysis::walker::find_all;
use crate::core::EngineResult;
use crate::representations::SyntaxNode;

pub fn identifier_name(node: &SyntaxNode) -> Option<&str> {
    if node.is("Identifier") {
        node.str_attr("name")
    } else {
        None
    }
}

pub fn is_identifier(node: &SyntaxNode, name: &str) -> bool {
    identifier_name(node) == Some(name)
}

/// Callee expression of a call, looking through `{value: ..}` call options.
pub fn callee(call: &SyntaxNode) -> Option<&SyntaxNode> {
    if !call.is("FunctionCall") {
        return None;
    }
    let expression = call.child("expression")?;
    if expression.is("FunctionCallOptions") {
        expression.child("expression")
    } else {
        Some(expression)
    }
}

/// `f` for `f(..)`, `m` for `x.m(..)`.
pub fn callee_name(call: &SyntaxNode) -> Option<&str> {
    let expression = callee(call)?;
    match expression.kind() {
        "Identifier" => expression.str_attr("name"),
        "MemberAccess" => expression.str_attr("memberName"),
        _ => None,
    }
}

/// Plain call to a free identifier, e.g. `require(..)`.
pub fn is_call_to(call: &SyntaxNode, name: &str) -> bool {
    callee(call).map_or(false, |expression| is_identifier(expression, name))
}

pub fn is_require_call(node: &SyntaxNode) -> bool {
    is_call_to(node, "require")
}

pub fn call_arguments(call: &SyntaxNode) -> Vec<&SyntaxNode> {
    call.children("arguments")
}

pub fn first_argument(call: &SyntaxNode) -> Option<&SyntaxNode> {
    call.sequence("arguments").first()?.as_ref()
}

/// Base expression of `base.member`, if `node` is that member access.
pub fn member_access<'a>(node: &'a SyntaxNode, member: &str) -> Option<&'a SyntaxNode> {
    if node.is("MemberAccess") && node.str_attr("memberName") == Some(member) {
        node.child("expression")
    } else {
        None
    }
}

/// `(left, right)` of a binary operation using `operator`.
pub fn binary_operands<'a>(node: &'a SyntaxNode, operator: &str) -> Option<(&'a SyntaxNode, &'a SyntaxNode)> {
    if !node.is("BinaryOperation") || node.str_attr("operator") != Some(operator) {
        return None;
    }
    Some((node.child("leftExpression")?, node.child("rightExpression")?))
}

/// Numeric literal made only of zeros (`0`, `00`, `0x0`, `0x0000`).
pub fn is_zero_literal(node: &SyntaxNode) -> bool {
    if !node.is("Literal") {
        return false;
    }
    let Some(value) = node.str_attr("value") else {
        return false;
    };
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    !digits.is_empty() && digits.chars().all(|c| c == '0' || c == '_')
}

/// Zero literal or `address(0)`.
pub fn is_zero_address(node: &SyntaxNode) -> bool {
    if is_zero_literal(node) {
        return true;
    }
    let Some(expression) = callee(node) else {
        return false;
    };
    elementary_type_name(expression).map_or(false, |name| name.starts_with("address"))
        && call_arguments(node).len() == 1
        && first_argument(node).map_or(false, is_zero_literal)
}

/// Type named by an `ElementaryTypeNameExpression` such as `int128(x)`'s
/// callee. Older compilers store the name as a plain string.
pub fn elementary_type_name(node: &SyntaxNode) -> Option<&str> {
    if !node.is("ElementaryTypeNameExpression") {
        return None;
    }
    match node.child("typeName") {
        Some(type_name) => type_name.str_attr("name"),
        None => node.str_attr("typeName"),
    }
}

/// Top-level statements of a function or modifier body.
pub fn body_statements(func: &SyntaxNode) -> Vec<&SyntaxNode> {
    func.child("body")
        .map(|body| body.children("statements"))
        .unwrap_or_default()
}

pub fn parameters(func: &SyntaxNode) -> Vec<&SyntaxNode> {
    func.child("parameters")
        .map(|list| list.children("parameters"))
        .unwrap_or_default()
}

/// Names of the modifiers invoked on a function, in declaration order.
pub fn modifier_names(func: &SyntaxNode) -> Vec<&str> {
    func.children("modifiers")
        .into_iter()
        .filter_map(|invocation| invocation.child("modifierName"))
        .filter_map(|name| name.str_attr("name"))
        .collect()
}

/// Condition of a top-level `require(cond, ..)` statement.
pub fn require_condition(statement: &SyntaxNode) -> Option<&SyntaxNode> {
    if !statement.is("ExpressionStatement") {
        return None;
    }
    let call = statement.child("expression")?;
    if is_require_call(call) {
        first_argument(call)
    } else {
        None
    }
}

/// First argument of every `require` call anywhere under `scope`.
pub fn require_conditions(scope: &SyntaxNode) -> EngineResult<Vec<&SyntaxNode>> {
    let mut conditions = Vec::new();
    for call in find_all("FunctionCall", scope) {
        let call = call?;
        if is_require_call(call) {
            conditions.extend(first_argument(call));
        }
    }
    Ok(conditions)
}

/// `name != 0`, `0 != name`, `name != address(0)` and the mirrored forms.
pub fn guards_non_zero(condition: &SyntaxNode, name: &str) -> bool {
    match binary_operands(condition, "!=") {
        Some((left, right)) => {
            (is_identifier(left, name) && is_zero_address(right))
                || (is_identifier(right, name) && is_zero_address(left))
        }
        None => false,
    }
}
