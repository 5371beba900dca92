//! Tree analysis utilities shared by structural detectors
//!
//! The walker gives every detector the same depth-bounded, shape-agnostic
//! traversal over compiler syntax trees, and the pattern helpers answer the
//! small questions detectors keep asking (is this a `require`, is this the
//! zero address, which modifiers does this function carry) without each rule
//! re-reading raw fields.

pub mod patterns;
pub mod walker;

pub use walker::{collect_all, find_all, find_all_bounded, walk, FindAll, Walk};
