//! Built-in detector catalog.
//!
//! Textual rules live together in [`textual`] as a table of patterns.
//! Each structural rule gets its own module exposing `definition()`, and
//! walks the file's syntax tree through [`crate::analysis`].

pub mod array_grows_without_shrink;
pub mod array_push_without_check;
pub mod constructor_zero_address;
pub mod ecrecover_zero_check;
pub mod eip712_domain_incomplete;
pub mod external_call_in_loop;
pub mod from_to_equality_check;
pub mod hardcoded_token_uri;
pub mod immutable_constant_misuse;
pub mod min_max_without_limits;
pub mod multiple_role_modifiers;
pub mod non_reentrant_not_first;
pub mod payable_without_withdraw;
pub mod textual;
pub mod try_catch_without_error;
pub mod unbounded_array_param_loop;
pub mod unsafe_signed_cast;
pub mod yul_return;

#[cfg(test)]
mod fixtures;

use crate::core::{DetectorDefinition, EngineConfig, EngineResult};

/// Every structural detector, in catalog order.
pub fn structural() -> Vec<DetectorDefinition> {
    vec![
        ecrecover_zero_check::definition(),
        payable_without_withdraw::definition(),
        array_grows_without_shrink::definition(),
        array_push_without_check::definition(),
        constructor_zero_address::definition(),
        eip712_domain_incomplete::definition(),
        unbounded_array_param_loop::definition(),
        external_call_in_loop::definition(),
        from_to_equality_check::definition(),
        multiple_role_modifiers::definition(),
        hardcoded_token_uri::definition(),
        non_reentrant_not_first::definition(),
        min_max_without_limits::definition(),
        unsafe_signed_cast::definition(),
        yul_return::definition(),
        immutable_constant_misuse::definition(),
        try_catch_without_error::definition(),
    ]
}

/// The full built-in catalog. Fails only if a textual pattern does not
/// compile.
pub fn default_detectors(config: &EngineConfig) -> EngineResult<Vec<DetectorDefinition>> {
    let mut detectors = textual::definitions(config.regex_backtrack_limit)?;
    detectors.extend(structural());
    Ok(detectors)
}
