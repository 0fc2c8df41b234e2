//! Base64 representation of a raw 32-byte key.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// Length of a standard, padded base64 encoding of 32 bytes.
pub const ENCODED_KEY_LEN: usize = 44;

/// A key rendered as standard base64 with `=` padding (always 44 characters).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct EncodedKey(String);

impl EncodedKey {
    /// Encodes raw key bytes.
    #[inline]
    pub fn encode(bytes: &[u8; 32]) -> Self {
        Self(STANDARD.encode(bytes))
    }

    /// Returns the encoded text.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for EncodedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncodedKey({})", self.0)
    }
}

impl fmt::Display for EncodedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
