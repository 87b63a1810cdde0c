// SPDX-FileCopyrightText: 2026 Cliniq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The credential cipher: seals API keys into storable text and opens them
//! again for the duration of a single outbound call.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use cliniq_core::CliniqError;
use secrecy::{ExposeSecret, SecretString};
use zeroize::Zeroizing;

use crate::crypto;
use crate::kdf;

/// Holds the derived sealing key in memory.
///
/// Debug output omits the key.
pub struct CredentialCipher {
    key: Zeroizing<[u8; 32]>,
}

impl std::fmt::Debug for CredentialCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialCipher")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl CredentialCipher {
    /// Derive the cipher from the operator secret.
    pub fn from_operator_secret(operator_secret: &SecretString) -> Result<Self, CliniqError> {
        let key = kdf::derive_key(operator_secret.expose_secret())?;
        Ok(Self { key })
    }

    /// Seal a plaintext secret into `base64(nonce || ciphertext || tag)`.
    pub fn seal(&self, plaintext: &str) -> Result<String, CliniqError> {
        let blob = crypto::seal(&self.key, plaintext.as_bytes())?;
        Ok(STANDARD.encode(blob))
    }

    /// Open a blob produced by [`CredentialCipher::seal`].
    ///
    /// Invalid base64, a short blob, a failed tag check, or non-UTF-8
    /// plaintext all yield [`CliniqError::Integrity`].
    pub fn open(&self, sealed: &str) -> Result<SecretString, CliniqError> {
        let blob = STANDARD
            .decode(sealed.trim())
            .map_err(|e| CliniqError::Integrity(format!("sealed blob is not valid base64: {e}")))?;

        let plaintext = Zeroizing::new(crypto::open(&self.key, &blob)?);
        let text = std::str::from_utf8(&plaintext)
            .map_err(|_| CliniqError::Integrity("opened secret is not valid UTF-8".to_string()))?;

        Ok(SecretString::from(text.to_owned()))
    }
}
