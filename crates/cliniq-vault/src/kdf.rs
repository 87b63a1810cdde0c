// SPDX-FileCopyrightText: 2026 Cliniq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key derivation from the operator secret.
//!
//! The AES-256-GCM key is the SHA-256 digest of the UTF-8 operator secret.
//! Derivation is deterministic so every instance sharing the secret can open
//! blobs sealed by any other.

use cliniq_core::CliniqError;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

/// Derive the 32-byte sealing key from the operator secret.
///
/// The returned key is wrapped in [`Zeroizing`] for automatic memory zeroing
/// on drop. An empty secret is a configuration error.
pub fn derive_key(operator_secret: &str) -> Result<Zeroizing<[u8; 32]>, CliniqError> {
    if operator_secret.is_empty() {
        return Err(CliniqError::Config(
            "vault operator secret is not set".to_string(),
        ));
    }

    let digest = Sha256::digest(operator_secret.as_bytes());
    let mut key = Zeroizing::new([0u8; 32]);
    key.copy_from_slice(&digest);
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_key_is_deterministic() {
        let key1 = derive_key("operator secret").unwrap();
        let key2 = derive_key("operator secret").unwrap();
        assert_eq!(*key1, *key2);
    }

    #[test]
    fn different_secrets_produce_different_keys() {
        let key1 = derive_key("secret one").unwrap();
        let key2 = derive_key("secret two").unwrap();
        assert_ne!(*key1, *key2);
    }

    #[test]
    fn empty_secret_is_a_configuration_error() {
        let err = derive_key("").unwrap_err();
        assert!(matches!(err, CliniqError::Config(_)));
    }

    #[test]
    fn key_matches_sha256_digest() {
        // SHA-256("abc")
        let key = derive_key("abc").unwrap();
        assert_eq!(key[0], 0xba);
        assert_eq!(key[1], 0x78);
        assert_eq!(key[31], 0xad);
    }
}
