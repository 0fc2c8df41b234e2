//! Pattern validation and matching implementation.

use std::str::FromStr;

/// Longest pattern accepted. Expected cost grows roughly as 64^k.
pub const MAX_PATTERN_LEN: usize = 10;

/// Characters of an encoded key that carry key bits (the 44th is padding).
const SIGNIFICANT_CHARS: usize = 43;

/// Where the pattern must appear in the encoded public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placement {
    /// Match anywhere in the key
    #[default]
    Anywhere,
    /// Match at the start of the key
    Beginning,
}

impl FromStr for Placement {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "anywhere" => Ok(Placement::Anywhere),
            "beginning" => Ok(Placement::Beginning),
            _ => Err(format!(
                "Unknown placement: {} (expected 'anywhere' or 'beginning')",
                s
            )),
        }
    }
}

impl std::fmt::Display for Placement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Placement::Anywhere => write!(f, "anywhere"),
            Placement::Beginning => write!(f, "beginning"),
        }
    }
}

/// Reasons a requested pattern can never be searched for.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    #[error("Pattern is {len} characters long, the limit is {max}")]
    TooLong { len: usize, max: usize },

    #[error("'{0}' is not a base64 character")]
    InvalidCharacter(char),
}

/// A validated pattern.
///
/// Holds the text as typed plus an ASCII-lowercased copy used for
/// comparison. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    /// The pattern exactly as given
    raw: String,
    /// Lowercased bytes used when matching
    folded: Vec<u8>,
    /// Placement rule
    placement: Placement,
}

impl Pattern {
    /// Validates `raw` and builds a pattern.
    ///
    /// Length is checked before content, and only the first offending
    /// character is reported. The empty pattern is valid and matches every
    /// key.
    pub fn new(raw: impl Into<String>, placement: Placement) -> Result<Self, PatternError> {
        let raw = raw.into();
        validate(&raw)?;

        let folded = raw.as_bytes().to_ascii_lowercase();
        Ok(Self {
            raw,
            folded,
            placement,
        })
    }

    /// Returns the pattern as given.
    pub fn pattern(&self) -> &str {
        &self.raw
    }

    /// Tests an encoded public key against this pattern.
    #[inline]
    pub fn matches(&self, encoded: &str) -> bool {
        let needle = self.folded.as_slice();
        if needle.is_empty() {
            return true;
        }

        let haystack = encoded.as_bytes();
        if haystack.len() < needle.len() {
            return false;
        }

        match self.placement {
            Placement::Beginning => haystack[..needle.len()].eq_ignore_ascii_case(needle),
            Placement::Anywhere => haystack
                .windows(needle.len())
                .any(|window| window.eq_ignore_ascii_case(needle)),
        }
    }

    /// Returns the expected number of attempts before a match.
    ///
    /// A letter matches two of the 64 symbols (either case), anything else
    /// matches one. Anywhere placement divides by the number of windows in
    /// the significant part of the key.
    pub fn estimated_attempts(&self) -> f64 {
        let probability: f64 = self
            .folded
            .iter()
            .map(|b| if b.is_ascii_alphabetic() { 2.0 / 64.0 } else { 1.0 / 64.0 })
            .product();

        let windows = match self.placement {
            Placement::Beginning => 1,
            Placement::Anywhere => SIGNIFICANT_CHARS + 1 - self.folded.len(),
        };

        (1.0 / (probability * windows as f64)).max(1.0)
    }

    /// Returns a human-readable difficulty estimate.
    pub fn difficulty_description(&self) -> String {
        let attempts = self.estimated_attempts();
        if attempts <= 1_000.0 {
            "Very Easy (< 1 second)".into()
        } else if attempts <= 100_000.0 {
            "Easy (seconds)".into()
        } else if attempts <= 10_000_000.0 {
            "Medium (minutes)".into()
        } else if attempts <= 1_000_000_000.0 {
            "Hard (hours)".into()
        } else {
            "Very Hard (days or more)".into()
        }
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "'{}' ({})", self.raw, self.placement)
    }
}

/// Checks a raw pattern against the length limit and the base64 alphabet.
pub fn validate(raw: &str) -> Result<(), PatternError> {
    let len = raw.chars().count();
    if len > MAX_PATTERN_LEN {
        return Err(PatternError::TooLong {
            len,
            max: MAX_PATTERN_LEN,
        });
    }

    match raw.chars().find(|&c| !is_base64_char(c)) {
        Some(c) => Err(PatternError::InvalidCharacter(c)),
        None => Ok(()),
    }
}

#[inline]
fn is_base64_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '+' || c == '/'
}
