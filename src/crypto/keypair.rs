//! X25519 keypair generation.

use std::fmt;

use rand::rngs::OsRng;
use rand::RngCore;
use x25519_dalek::{PublicKey, StaticSecret};

use super::EncodedKey;

/// Errors raised while producing key material.
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    /// The operating system could not supply secure randomness.
    #[error("secure randomness unavailable: {0}")]
    Entropy(#[from] rand::Error),
}

/// A Curve25519 keypair together with its base64 encodings.
#[derive(Clone)]
pub struct Keypair {
    /// The private scalar bytes (32 bytes, unclamped)
    private_key: [u8; 32],
    /// The public point bytes (32 bytes)
    public_key: [u8; 32],
    /// Base64 of the private key
    private_encoded: EncodedKey,
    /// Base64 of the public key
    public_encoded: EncodedKey,
}

impl Keypair {
    /// Generates a new random keypair.
    ///
    /// The private scalar is drawn straight from the operating system's
    /// CSPRNG. If the OS refuses, the error is returned; there is no
    /// fallback source.
    #[inline]
    pub fn generate() -> Result<Self, KeyError> {
        let mut private_key = [0u8; 32];
        OsRng.try_fill_bytes(&mut private_key)?;
        Ok(Self::from_private_bytes(private_key))
    }

    /// Derives the keypair for an existing private scalar.
    pub fn from_private_bytes(private_key: [u8; 32]) -> Self {
        let secret = StaticSecret::from(private_key);
        let public_key = PublicKey::from(&secret).to_bytes();

        Self {
            private_key,
            public_key,
            private_encoded: EncodedKey::encode(&private_key),
            public_encoded: EncodedKey::encode(&public_key),
        }
    }

    /// Returns the private key bytes.
    pub fn private_key_bytes(&self) -> &[u8; 32] {
        &self.private_key
    }

    /// Returns the public key bytes.
    pub fn public_key_bytes(&self) -> &[u8; 32] {
        &self.public_key
    }

    /// Returns the base64 private key.
    pub fn private_key(&self) -> &EncodedKey {
        &self.private_encoded
    }

    /// Returns the base64 public key.
    #[inline]
    pub fn public_key(&self) -> &EncodedKey {
        &self.public_encoded
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("public_key", &self.public_encoded.as_str())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::crypto::ENCODED_KEY_LEN;

    #[test]
    fn test_keypair_generation() {
        let keypair = Keypair::generate().unwrap();
        assert_eq!(keypair.private_key_bytes().len(), 32);
        assert_eq!(keypair.public_key_bytes().len(), 32);
        assert_eq!(keypair.private_key().as_str().len(), ENCODED_KEY_LEN);
        assert_eq!(keypair.public_key().as_str().len(), ENCODED_KEY_LEN);
    }

    #[test]
    fn test_deterministic_public_key() {
        // RFC 7748, section 6.1 (Alice)
        let private: [u8; 32] =
            hex::decode("77076d0a7318a57d3c16c17251b26645df4c2f87ebc0992ab177fba51db92c2a")
                .unwrap()
                .try_into()
                .unwrap();
        let keypair = Keypair::from_private_bytes(private);

        assert_eq!(
            hex::encode(keypair.public_key_bytes()),
            "8520f0098930a754748b7ddcb43ef75a0dbf3a0d26381af4eba4a98eaa9b4e6a"
        );
        assert_eq!(
            keypair.private_key().as_str(),
            "dwdtCnMYpX08FsFyUbJmRd9ML4frwJkqsXf7pR25LCo="
        );
        assert_eq!(
            keypair.public_key().as_str(),
            "hSDwCYkwp1R0i33ctD73Wg2/Og0mOBr066SpjqqbTmo="
        );
    }

    #[test]
    fn test_private_keys_never_repeat() {
        let mut seen = HashSet::new();
        for _ in 0..500 {
            let keypair = Keypair::generate().unwrap();
            assert!(seen.insert(*keypair.private_key_bytes()));
        }
    }

    #[test]
    fn test_debug_hides_private_key() {
        let keypair = Keypair::generate().unwrap();
        let debug = format!("{:?}", keypair);
        assert!(debug.contains(keypair.public_key().as_str()));
        assert!(!debug.contains(keypair.private_key().as_str()));
    }

    #[test]
    fn test_concurrent_generation() {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                std::thread::spawn(|| {
                    (0..100)
                        .map(|_| *Keypair::generate().unwrap().private_key_bytes())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for key in handle.join().unwrap() {
                assert!(seen.insert(key));
            }
        }
        assert_eq!(seen.len(), 400);
    }
}
