//! Single-use nonces for federated sign-in.

use rand::rngs::OsRng;
use rand::Rng;
use sha2::{Digest, Sha256};
use std::sync::{Mutex, PoisonError};

use crate::storage::config::DEFAULT_NONCE_LENGTH;

/// Characters a raw nonce is drawn from.
const NONCE_CHARSET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVXYZabcdefghijklmnopqrstuvwxyz-._";

/// Lowercase hex SHA-256 digest of a string.
pub fn sha256_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

/// A random value bound to one sign-in attempt.
///
/// Not `Clone`: the raw value leaves the nonce only through
/// [`Nonce::into_raw`], which consumes it.
pub struct Nonce {
    raw: String,
}

impl Nonce {
    /// SHA-256 digest sent to the federated provider.
    pub fn hashed(&self) -> String {
        sha256_hex(&self.raw)
    }

    /// Length of the raw value.
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Consume the nonce, returning the raw value.
    pub fn into_raw(self) -> String {
        self.raw
    }
}

impl std::fmt::Debug for Nonce {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Nonce").field("len", &self.raw.len()).finish()
    }
}

/// Issues nonces, never the same value twice in a row.
pub struct NonceIssuer {
    length: usize,
    last_digest: Mutex<Option<String>>,
}

impl NonceIssuer {
    /// Create an issuer producing nonces of `length` characters.
    pub fn new(length: usize) -> Self {
        Self {
            length: length.max(1),
            last_digest: Mutex::new(None),
        }
    }

    /// Issue a fresh nonce.
    pub fn issue(&self) -> Nonce {
        let mut last = self
            .last_digest
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        loop {
            let raw = random_string(self.length);
            let digest = sha256_hex(&raw);
            if last.as_deref() != Some(digest.as_str()) {
                *last = Some(digest);
                return Nonce { raw };
            }
        }
    }
}

impl Default for NonceIssuer {
    fn default() -> Self {
        Self::new(DEFAULT_NONCE_LENGTH)
    }
}

fn random_string(length: usize) -> String {
    let mut rng = OsRng;
    (0..length)
        .map(|_| NONCE_CHARSET[rng.gen_range(0..NONCE_CHARSET.len())] as char)
        .collect()
}
