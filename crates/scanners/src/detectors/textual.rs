//! Pattern-matched detectors.
//!
//! Each rule is a single pattern scanned over raw source text. They are
//! recall-oriented approximations: comments and string literals are not
//! stripped, and nesting is only tracked as far as a pattern can express it.

use crate::core::{DetectorDefinition, EngineResult, Severity};

struct TextualRule {
    id: &'static str,
    title: &'static str,
    description: &'static str,
    severity: Severity,
    pattern: &'static str,
    /// Matches preceded by this text are dropped.
    unless_preceded_by: Option<&'static str>,
}

const RULES: &[TextualRule] = &[
    TextualRule {
        id: "msg-value-in-loop",
        title: "Using msg.value in a loop",
        description: "Using `msg.value` inside a loop lets the sender re-use the same value on every iteration. This typically shows up in payable multicalls, where one payment is credited once per forwarded call and enables double spending.",
        severity: Severity::Medium,
        pattern: r"for\s*\(.*;.*;.*\)\s*\{[^{}]*\bcall\s*\{[^{}]*value\s*:\s*msg\.value[^{}]*\}[^{}]*;|while\s*\(.*\)\s*\{[^{}]*\bcall\s*\{[^{}]*value\s*:\s*msg\.value[^{}]*\}[^{}]*;|do\s*\{[^{}]*\bcall\s*\{[^{}]*value\s*:\s*msg\.value[^{}]*\}[^{}]*;.*\}\s*while\s*\(.*\)",
        unless_preceded_by: None,
    },
    TextualRule {
        id: "repay-when-paused",
        title: "Users cannot repay their debts while the contract is paused",
        description: "A `repay` function guarded by `whenNotPaused` (or another pause check) blocks repayments during a pause. Borrowers can drift into liquidation while paused and then race liquidators once the contract resumes. Repayments should stay available.",
        severity: Severity::Medium,
        pattern: r"(?i)function\s+repay\w*\s*\([^)]*\)\s*(public|external|internal|private)?\s*((payable\s*)?(virtual\s*)?)?(whenNotPaused|.*pause.*)\s*\{",
        unless_preceded_by: None,
    },
    TextualRule {
        id: "division-by-zero",
        title: "Potential division by zero without zero check",
        description: "Division by a variable reverts when it is zero. Make sure a zero check (`require(x != 0)` or similar) is in place before the division.",
        severity: Severity::Low,
        pattern: r"\b\w+\s*=\s*\w+\s*/\s*(?!\d)(\w+)\b",
        unless_preceded_by: Some(r"require\s*\(\s*\w+\s*(?:!=|>|>=|<|<=)\s*0\s*\);\s*(?:.*[\r\n]+)?[ \t]*"),
    },
    TextualRule {
        id: "division-before-multiplication",
        title: "Division before multiplication",
        description: "Integer division truncates. Dividing before multiplying, as in `(a / b) * c`, loses precision that multiplying first would keep.",
        severity: Severity::Low,
        pattern: r"\(\s*\w+\s*/\s*\w+\s*\)\s*\*\s*\w+",
        unless_preceded_by: None,
    },
    TextualRule {
        id: "abi-encode-call",
        title: "Use abi.encodeCall() instead of abi.encodeWithSignature()/abi.encodeWithSelector()",
        description: "Since 0.8.11, `abi.encodeCall()` provides a type-safe encoding utility compared with `abi.encodeWithSignature()` and `abi.encodeWithSelector()`.",
        severity: Severity::Low,
        pattern: r"abi\.(encodeWithSignature|encodeWithSelector)\(([^)]*)\)",
        unless_preceded_by: None,
    },
    TextualRule {
        id: "balance-of-this-equality",
        title: "Strict equality on the contract's own token balance",
        description: "A check such as `require(token.balanceOf(address(this)) == x)` can be broken by anyone sending a dust amount of the token to the contract, which makes the call revert.",
        severity: Severity::Low,
        pattern: r"require\(\s*.*\.balanceOf\(address\(this\)\)\s*==",
        unless_preceded_by: None,
    },
    TextualRule {
        id: "clone-not-deterministic",
        title: "Use cloneDeterministic rather than clone",
        description: "If a clone is funded within a few blocks of being created by a factory, a reorg lets an attacker take over the address. `cloneDeterministic` derives the address from a salt, and deploying the same implementation and salt twice reverts.",
        severity: Severity::Low,
        pattern: r"\.clone\(\s*[^)]*\s*\)",
        unless_preceded_by: None,
    },
    TextualRule {
        id: "contract-existence-unchecked",
        title: "Low-level call in assembly without extcodesize check",
        description: "A low-level `call` succeeds when the target has no code. Without an `extcodesize` check the call may appear successful even though the contract does not exist.",
        severity: Severity::Low,
        pattern: r"(?s)function\s+[^\{]*\{[^}]*\bassembly(\s*\([^)]*\))?\s*\{[^}]*\bcall\((?![^}]*extcodesize)",
        unless_preceded_by: None,
    },
    TextualRule {
        id: "deadline-block-timestamp",
        title: "Using block.timestamp as a swap deadline",
        description: "A deadline of `block.timestamp` is always satisfied, so the transaction can be held and executed at any later time. Protocols should let users who interact with AMMs choose their own expiration deadline.",
        severity: Severity::Low,
        pattern: r"(deadline\s*(:|=|<=|>=|!=|<|>)\s*block.timestamp|[\w]*Router\.\w+\(block.timestamp\)|[\w]*router\.\w+\(block.timestamp\))",
        unless_preceded_by: None,
    },
    TextualRule {
        id: "delegatecall-in-loop",
        title: "Using `delegatecall` inside a loop",
        description: "Every `delegatecall` runs with the caller's `msg.value`, so a loop of delegate calls credits the same value multiple times.",
        severity: Severity::Low,
        pattern: r"(for|while|do)[^\(]?(\([^\)]*\))?.?\{(([^\}]*\n)*(([^\}]*\{)([^\{\}]*\n)*([^\{\}]*\}[^\}]*)\n))*[^\}]*delegatecall",
        unless_preceded_by: None,
    },
    TextualRule {
        id: "deprecated-functions",
        title: "Do not use deprecated library functions",
        description: "`safeApprove` is deprecated in favour of `safeIncreaseAllowance` and `safeDecreaseAllowance`, and `_setupRole` in favour of `_grantRole`. The replacements avoid allowance race conditions and keep the contract compatible with newer library versions.",
        severity: Severity::Low,
        pattern: r"_setupRole\(|safeApprove\(",
        unless_preceded_by: None,
    },
    TextualRule {
        id: "zero-min-amount-out",
        title: "swapExactTokensForTokens called with zero minimum amount out",
        description: "Passing 0 as `amountOutMin` disables slippage protection. The swap may return nothing, and MEV bots can sandwich it for the full amount.",
        severity: Severity::Low,
        pattern: r"swapExactTokensForTokens\s*\(\s*\w+\s*,\s*0\s*,",
        unless_preceded_by: None,
    },
    TextualRule {
        id: "slot0-sqrt-price",
        title: "Use of `slot0` to get `sqrtPriceX96`",
        description: "`slot0` reflects the current pool state and is easy to manipulate within a transaction. Use a TWAP to derive `sqrtPriceX96` instead.",
        severity: Severity::Low,
        pattern: r"\(uint160\s+sqrtPriceX96[^)]*\)\s*=\s*IUniswapV3Pool\([^)]+\)\.slot0\(\)",
        unless_preceded_by: None,
    },
    TextualRule {
        id: "timelock-admin-disabled",
        title: "TimelockController admin is disabled with address(0)",
        description: "A `TimelockController` deployed with `address(0)` as its admin (fourth argument) cannot have its roles administered outside the timelock itself. Check that this is the intended configuration.",
        severity: Severity::Low,
        pattern: r"TimelockController\(([^,]*,){3}\s*address\(0\)\s*\)",
        unless_preceded_by: None,
    },
    TextualRule {
        id: "transfer-send-eth",
        title: "Use of .transfer() or .send() for sending Ether",
        description: "`.transfer()` and `.send()` forward a fixed 2300 gas stipend, which is not enough for a recipient contract to do more than emit an event, so transfers to contracts can fail unexpectedly. Prefer `.call{value: amount}(\"\")` and check its return value.",
        severity: Severity::Low,
        pattern: r"\bpayable\s*\([^)]*\)\s*\.\s*(transfer|send)\s*\([^)]*\)",
        unless_preceded_by: None,
    },
    TextualRule {
        id: "uint256-max-approval",
        title: "Approval of type(uint256).max",
        description: "Some tokens treat a `type(uint256).max` allowance specially or reject it outright, especially tokens with custom `transferFrom`, fee or burn mechanics.",
        severity: Severity::Low,
        pattern: r"approve\s*\(\s*\w+\s*,\s*type\(uint256\)\.max\s*\)",
        unless_preceded_by: None,
    },
    TextualRule {
        id: "optional-erc20-decimals",
        title: "decimals() is not part of the ERC-20 standard",
        description: "`decimals()` is an optional extension of ERC-20. Some valid tokens do not implement it, so casting an arbitrary token to `ERC20` and calling it can revert.",
        severity: Severity::Low,
        pattern: r"ERC20\([^)]*\)\.decimals\(\)",
        unless_preceded_by: None,
    },
    TextualRule {
        id: "abi-encode-packed",
        title: "abi.encodePacked() should be replaced with bytes.concat()",
        description: "Solidity 0.8.4 introduced `bytes.concat()`, which states the intent of concatenating bytes or strings more clearly than `abi.encodePacked()`.",
        severity: Severity::Informational,
        pattern: r"abi\.encodePacked\(([^)]*)\)",
        unless_preceded_by: None,
    },
    TextualRule {
        id: "assert-usage",
        title: "assert() should be replaced with require() or revert()",
        description: "Before 0.8.0 a failing `assert` consumed all remaining gas. It is still meant only for internal invariants: properly functioning code should never reach a Panic, even on invalid external input.",
        severity: Severity::Informational,
        pattern: r"(?<![\w.])assert\(([^)]*)\)",
        unless_preceded_by: None,
    },
    TextualRule {
        id: "empty-function-body",
        title: "Empty function body without comments",
        description: "An empty function body gives readers no hint whether it is intentional. Add a comment explaining why it is empty.",
        severity: Severity::Informational,
        pattern: r"\bfunction\s+[a-zA-Z_]\w*\s*\([^)]*\)\s+([a-zA-Z_]\w*\s+)*\{\s*\}",
        unless_preceded_by: None,
    },
    TextualRule {
        id: "private-function-underscore",
        title: "Names of private/internal functions should be prefixed with an underscore",
        description: "The Solidity style guide recommends an underscore prefix for non-external functions: https://docs.soliditylang.org/en/v0.8.20/style-guide.html#underscore-prefix-for-non-external-functions-and-variables",
        severity: Severity::Informational,
        pattern: r"\bfunction\s+([a-zA-Z][^\s(]*)\s*\([^\)]*\)\s+(internal|private)[^{]*\{",
        unless_preceded_by: None,
    },
    TextualRule {
        id: "private-variable-underscore",
        title: "Names of private/internal state variables should be prefixed with an underscore",
        description: "The Solidity style guide recommends an underscore prefix for non-external variables: https://docs.soliditylang.org/en/v0.8.20/style-guide.html#underscore-prefix-for-non-external-functions-and-variables",
        severity: Severity::Informational,
        pattern: r"\b(?:bool|int\d*|uint\d*|bytes\d*|address|string|enum|struct|mapping\([^)]+\)|[A-Z][a-zA-Z0-9]*)\s+(?:internal|private)\s+([a-z][^\s=;]*);",
        unless_preceded_by: None,
    },
    TextualRule {
        id: "require-without-reason",
        title: "require()/revert() statements should have descriptive reason strings",
        description: "A reason string tells callers and reviewers why a `require` or `revert` fired.",
        severity: Severity::Informational,
        pattern: r"(?<![\w.])(require|revert)\s*\(([^,)]+)\s*\)\s*;",
        unless_preceded_by: None,
    },
    TextualRule {
        id: "solidity-version-mcopy",
        title: "Solidity version 0.8.23 or above",
        description: "Solidity 0.8.23 emits the `MCOPY` opcode, which is not supported on every chain and L2. Consider an earlier compiler version when deploying outside Ethereum mainnet.",
        severity: Severity::Informational,
        pattern: r"pragma\s+solidity\s+(?:\^|>=|=)?\s*(?:0\.8\.(?:2[3-9]|[3-9]\d)|0\.9\.\d+)\b",
        unless_preceded_by: None,
    },
];

/// Compile every textual rule with the given backtracking budget.
pub fn definitions(backtrack_limit: usize) -> EngineResult<Vec<DetectorDefinition>> {
    RULES
        .iter()
        .map(|rule| {
            let definition = DetectorDefinition::textual(
                rule.id,
                rule.title,
                rule.description,
                rule.severity,
                rule.pattern,
                backtrack_limit,
            )?;
            match rule.unless_preceded_by {
                Some(guard) => definition.unless_preceded_by(guard, backtrack_limit),
                None => Ok(definition),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::representations::SourceFile;

    fn offsets(id: &str, source: &str) -> Vec<usize> {
        let detector = definitions(1_000_000)
            .unwrap()
            .into_iter()
            .find(|d| d.id() == id)
            .unwrap();
        let file = SourceFile::new("Test.sol", source);
        detector
            .detect_file(&file)
            .unwrap()
            .into_iter()
            .map(|hit| hit.range.offset)
            .collect()
    }

    #[test]
    fn test_all_rules_compile() {
        let defs = definitions(1_000_000).unwrap();
        assert_eq!(defs.len(), 24);
    }

    #[test]
    fn test_assert_usage_skips_member_calls() {
        let source = "function f() { assert(x>0); this.assert(y); Lib.assert(z); myassert(w); }";
        assert_eq!(offsets("assert-usage", source), vec![15]);
    }

    #[test]
    fn test_require_without_reason() {
        let source = "require(a);\nrequire(b, \"b\");\nrevert(msg);\nvalidate.require(c);\n";
        assert_eq!(offsets("require-without-reason", source), vec![0, 29]);
    }

    #[test]
    fn test_division_by_zero_ignores_literal_divisor() {
        let source = "x = a / b;\ny = a / 2;\nz = a /  d1;";
        assert_eq!(offsets("division-by-zero", source), vec![0, 22]);
    }

    #[test]
    fn test_contract_existence_lookahead() {
        let unchecked = "function f() public {\n assembly {\n  let ok := call(gas(), t, 0, 0, 0, 0, 0)\n }\n}";
        let checked = "function f() public {\n assembly {\n  let ok := call(gas(), t, 0, 0, 0, 0, 0)\n  if iszero(extcodesize(t)) { revert(0, 0) }\n }\n}";
        assert_eq!(offsets("contract-existence-unchecked", unchecked), vec![0]);
        assert!(offsets("contract-existence-unchecked", checked).is_empty());
    }

    #[test]
    fn test_solidity_version_mcopy() {
        assert_eq!(offsets("solidity-version-mcopy", "pragma solidity ^0.8.24;"), vec![0]);
        assert_eq!(offsets("solidity-version-mcopy", "pragma solidity 0.8.23;"), vec![0]);
        assert!(offsets("solidity-version-mcopy", "pragma solidity ^0.8.20;").is_empty());
        assert!(offsets("solidity-version-mcopy", "pragma solidity 0.8.2;").is_empty());
    }

    #[test]
    fn test_repay_when_paused_is_case_insensitive() {
        let source = "function repayAll(uint256 a) external WhenNotPaused {\n}";
        assert_eq!(offsets("repay-when-paused", source), vec![0]);
        assert!(offsets("repay-when-paused", "function repay(uint256 a) external {\n}").is_empty());
    }

    #[test]
    fn test_private_variable_underscore() {
        let source = "uint256 private total;\nuint256 private _total;\naddress internal owner;";
        assert_eq!(offsets("private-variable-underscore", source), vec![0, 47]);
    }

    #[test]
    fn test_msg_value_in_loop() {
        let source = "for (uint i = 0; i < n; i++) {\n  t.call{value: msg.value}(\"\");\n}";
        assert_eq!(offsets("msg-value-in-loop", source), vec![0]);
    }

    #[test]
    fn test_timelock_admin_disabled() {
        let source = "new TimelockController(1 days, proposers, executors, address(0));";
        assert_eq!(offsets("timelock-admin-disabled", source), vec![4]);
    }

    #[test]
    fn test_division_by_zero_respects_zero_checks() {
        let same_line = "require(b != 0); x = a / b;";
        assert!(offsets("division-by-zero", same_line).is_empty());

        let next_line = "require(b > 0);\n        x = a / b;";
        assert!(offsets("division-by-zero", next_line).is_empty());

        let one_line_between = "require(b > 0);\nuint256 c = 1;\nx = a / b;";
        assert!(offsets("division-by-zero", one_line_between).is_empty());

        let too_far = "require(b != 0);\nuint256 c = 1;\nuint256 e = 2;\nx = a / b;";
        assert_eq!(offsets("division-by-zero", too_far), vec![too_far.find("x = a").unwrap()]);

        let unguarded = "require(b != 1); x = a / b;";
        assert_eq!(offsets("division-by-zero", unguarded), vec![17]);
    }

    #[test]
    fn test_division_before_multiplication() {
        assert_eq!(offsets("division-before-multiplication", "x = (a / b) * c;"), vec![4]);
        assert!(offsets("division-before-multiplication", "x = (a * c) / b;").is_empty());
    }

    #[test]
    fn test_abi_encode_call() {
        let source = r#"bytes memory d = abi.encodeWithSignature("f(uint256)", 1);"#;
        assert_eq!(offsets("abi-encode-call", source), vec![17]);
        assert!(offsets("abi-encode-call", "bytes memory d = abi.encodeCall(IToken.f, (1));").is_empty());
    }

    #[test]
    fn test_balance_of_this_equality() {
        let strict = "require(token.balanceOf(address(this)) == amount);";
        let loose = "require(token.balanceOf(address(this)) >= amount);";
        assert_eq!(offsets("balance-of-this-equality", strict), vec![0]);
        assert!(offsets("balance-of-this-equality", loose).is_empty());
    }

    #[test]
    fn test_clone_not_deterministic() {
        assert_eq!(offsets("clone-not-deterministic", "address c = Clones.clone(impl);"), vec![18]);
        assert!(offsets("clone-not-deterministic", "address c = Clones.cloneDeterministic(impl, salt);").is_empty());
    }

    #[test]
    fn test_deadline_block_timestamp() {
        assert_eq!(offsets("deadline-block-timestamp", "params.deadline = block.timestamp;"), vec![7]);
        assert!(offsets("deadline-block-timestamp", "params.deadline = userDeadline;").is_empty());
    }

    #[test]
    fn test_delegatecall_in_loop() {
        let looped = "for (uint i; i < n; i++) {\n  t.delegatecall(data[i]);\n}";
        let single = "function f() public {\n  t.delegatecall(data);\n}";
        assert_eq!(offsets("delegatecall-in-loop", looped), vec![0]);
        assert!(offsets("delegatecall-in-loop", single).is_empty());
    }

    #[test]
    fn test_deprecated_functions() {
        let old = "token.safeApprove(spender, 0);\n_setupRole(ADMIN, msg.sender);";
        let new = "token.safeIncreaseAllowance(spender, 1);\n_grantRole(ADMIN, a);";
        assert_eq!(offsets("deprecated-functions", old), vec![6, 31]);
        assert!(offsets("deprecated-functions", new).is_empty());
    }

    #[test]
    fn test_zero_min_amount_out() {
        let zero = "router.swapExactTokensForTokens(amountIn, 0, path, to, dl);";
        let bounded = "router.swapExactTokensForTokens(amountIn, minOut, path, to, dl);";
        assert_eq!(offsets("zero-min-amount-out", zero), vec![7]);
        assert!(offsets("zero-min-amount-out", bounded).is_empty());
    }

    #[test]
    fn test_slot0_sqrt_price() {
        let spot = "(uint160 sqrtPriceX96, , , , , , ) = IUniswapV3Pool(pool).slot0();";
        let twap = "(uint160 sqrtPriceX96, ) = oracle.twap(pool);";
        assert_eq!(offsets("slot0-sqrt-price", spot), vec![0]);
        assert!(offsets("slot0-sqrt-price", twap).is_empty());
    }

    #[test]
    fn test_transfer_send_eth() {
        let source = "payable(owner).transfer(amount);\nbool ok = payable(to).send(1);";
        assert_eq!(offsets("transfer-send-eth", source), vec![0, 43]);
        assert!(offsets("transfer-send-eth", "token.transfer(owner, amount);").is_empty());
    }

    #[test]
    fn test_uint256_max_approval() {
        assert_eq!(offsets("uint256-max-approval", "token.approve(spender, type(uint256).max);"), vec![6]);
        assert!(offsets("uint256-max-approval", "token.approve(spender, amount);").is_empty());
    }

    #[test]
    fn test_optional_erc20_decimals() {
        assert_eq!(offsets("optional-erc20-decimals", "uint8 d = ERC20(token).decimals();"), vec![10]);
        assert!(offsets("optional-erc20-decimals", "uint8 d = IERC20Metadata(token).decimals();").is_empty());
    }

    #[test]
    fn test_abi_encode_packed() {
        assert_eq!(offsets("abi-encode-packed", "bytes memory b = abi.encodePacked(a, c);"), vec![17]);
        assert!(offsets("abi-encode-packed", "bytes memory b = bytes.concat(a, c);").is_empty());
    }

    #[test]
    fn test_empty_function_body() {
        let empty = "function hook(uint256 a) internal virtual {}";
        let commented = "function hook(uint256 a) internal virtual {\n    // nothing to do\n}";
        assert_eq!(offsets("empty-function-body", empty), vec![0]);
        assert!(offsets("empty-function-body", commented).is_empty());
    }

    #[test]
    fn test_private_function_underscore() {
        let plain = "function helper(uint256 a) internal pure returns (uint256) {\n}";
        let prefixed = "function _helper(uint256 a) internal pure {\n}\nfunction run() external {\n}";
        assert_eq!(offsets("private-function-underscore", plain), vec![0]);
        assert!(offsets("private-function-underscore", prefixed).is_empty());
    }
}
