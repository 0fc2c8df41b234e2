//! Pattern validation and matching for base64 public keys.
//!
//! Supports two placement rules:
//! - Anywhere: the pattern occurs somewhere in the encoded key
//! - Beginning: the encoded key starts with the pattern
//!
//! Comparison is always ASCII case-insensitive.

mod pattern;

pub use pattern::{validate, Pattern, PatternError, Placement, MAX_PATTERN_LEN};
