//! Curve25519 key generation and base64 rendering.
//!
//! This module provides:
//! - Secure random X25519 key pair generation
//! - Standard base64 encoding of the raw 32-byte keys

mod encoded;
mod keypair;

pub use encoded::{EncodedKey, ENCODED_KEY_LEN};
pub use keypair::{KeyError, Keypair};
