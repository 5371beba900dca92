//! Conversions from unsigned values into signed integer types.
//!
//! Expression nesting is attacker-influenced, so casts are found with the
//! bounded walker rather than recursive descent.

use crate::analysis::patterns::{callee, elementary_type_name, first_argument};
use crate::analysis::find_all;
use crate::core::{DetectorDefinition, Hit, Severity};
use crate::representations::{SourceFile, SyntaxNode};
use anyhow::Result;

pub fn definition() -> DetectorDefinition {
    DetectorDefinition::structural(
        "unsafe-signed-cast",
        "Unsafe conversion from unsigned to signed values",
        "Solidity's `int` types use two's complement, so a large unsigned value silently wraps when cast to a signed type of the same width (a `uint256` above `type(int256).max` becomes negative). Use SafeCast to make such conversions revert on overflow.",
        Severity::Low,
        detect,
    )
}

/// `int`, `int8` .. `int256`.
fn is_signed_type(name: &str) -> bool {
    match name.strip_prefix("int") {
        Some("") => true,
        Some(bits) => bits.parse::<u16>().map_or(false, |n| n % 8 == 0 && (8..=256).contains(&n)),
        None => false,
    }
}

fn is_signed_cast(call: &SyntaxNode) -> bool {
    let Some(type_name) = callee(call).and_then(elementary_type_name) else {
        return false;
    };
    // Literal arguments are range-checked by the compiler.
    is_signed_type(type_name) && first_argument(call).map_or(false, |arg| !arg.is("Literal"))
}

fn detect(file: &SourceFile) -> Result<Vec<Hit>> {
    let Some(root) = file.tree() else {
        return Ok(Vec::new());
    };

    let mut hits = Vec::new();
    for func in find_all("FunctionDefinition", root) {
        let Some(body) = func?.child("body") else { continue };
        for call in find_all("FunctionCall", body) {
            let call = call?;
            if is_signed_cast(call) {
                hits.push(Hit::new(call.src()));
            }
        }
    }

    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::fixtures::*;

    #[test]
    fn test_signed_type_names() {
        assert!(is_signed_type("int"));
        assert!(is_signed_type("int128"));
        assert!(is_signed_type("int256"));
        assert!(!is_signed_type("uint256"));
        assert!(!is_signed_type("int7"));
        assert!(!is_signed_type("int264"));
    }

    #[test]
    fn test_nested_casts_are_all_found() {
        let inner = cast("int128", ident("amount", 44), 42);
        let outer = cast("int256", inner, 40);
        let literal = cast("int256", number("5", 52), 50);
        let widen = cast("uint256", ident("amount", 62), 60);
        let body = vec![
            statement(assign(ident("delta", 39), outer, 38), 37),
            statement(assign(ident("k", 49), literal, 48), 47),
            statement(assign(ident("u", 59), widen, 58), 57),
        ];
        let ast = unit(vec![contract("C", vec![function("f", vec![], body, 20)], 1)]);

        assert_eq!(offsets(&run(detect, ast)), vec![40, 42]);
    }

    #[test]
    fn test_deep_expression_chains_do_not_overflow_the_stack() {
        let mut expression = cast("int256", ident("x", 100_000), 99_999);
        for i in 0..300 {
            expression = binary(expression, "+", number("1", 1000 + i), 500 + i);
        }
        let body = vec![statement(expression, 30)];
        let ast = unit(vec![contract("C", vec![function("f", vec![], body, 20)], 1)]);

        assert_eq!(offsets(&run(detect, ast)), vec![99_999]);
    }
}
