//! Shared-secret credential sent in the `x-shared-secret` header.

use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

/// A non-empty shared secret. The value is wiped from memory on drop and
/// never appears in `Debug` output; logs use [`SharedSecret::fingerprint`].
#[derive(Clone)]
pub struct SharedSecret(Zeroizing<String>);

impl SharedSecret {
    /// Returns `None` for empty or whitespace-only input, which means
    /// "no secret configured".
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = Zeroizing::new(value.into());
        if value.trim().is_empty() {
            return None;
        }
        Some(Self(value))
    }

    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    /// First 8 hex chars of SHA-256(secret).
    pub fn fingerprint(&self) -> String {
        let hash = Sha256::digest(self.0.as_bytes());
        hex::encode(&hash[..4])
    }
}

impl std::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SharedSecret(sha256:{})", self.fingerprint())
    }
}
