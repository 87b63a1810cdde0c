// SPDX-FileCopyrightText: 2026 Cliniq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Low-level AES-256-GCM seal/open operations.
//!
//! Every call to [`seal`] generates a fresh random 96-bit nonce via the system
//! CSPRNG. Nonce reuse would be catastrophic for GCM security.
//!
//! Blob layout: `nonce (12 bytes) || ciphertext || tag (16 bytes)`.

use cliniq_core::CliniqError;
use ring::aead::{AES_256_GCM, Aad, LessSafeKey, NONCE_LEN, Nonce, UnboundKey};
use ring::rand::{SecureRandom, SystemRandom};

/// Length of the GCM authentication tag.
pub const TAG_LEN: usize = 16;

/// Smallest blob [`open`] will accept (empty plaintext).
pub const MIN_BLOB_LEN: usize = NONCE_LEN + TAG_LEN;

fn sealing_key(key: &[u8; 32]) -> Result<LessSafeKey, CliniqError> {
    let unbound = UnboundKey::new(&AES_256_GCM, key)
        .map_err(|_| CliniqError::Internal("failed to create AES-256-GCM key".to_string()))?;
    Ok(LessSafeKey::new(unbound))
}

/// Encrypt plaintext with AES-256-GCM under a random nonce.
///
/// Returns the nonce followed by the ciphertext and tag.
pub fn seal(key: &[u8; 32], plaintext: &[u8]) -> Result<Vec<u8>, CliniqError> {
    let less_safe = sealing_key(key)?;

    let rng = SystemRandom::new();
    let mut nonce_bytes = [0u8; NONCE_LEN];
    rng.fill(&mut nonce_bytes)
        .map_err(|_| CliniqError::Internal("failed to generate random nonce".to_string()))?;

    let nonce = Nonce::assume_unique_for_key(nonce_bytes);

    let mut in_out = plaintext.to_vec();
    less_safe
        .seal_in_place_append_tag(nonce, Aad::empty(), &mut in_out)
        .map_err(|_| CliniqError::Internal("AES-256-GCM encryption failed".to_string()))?;

    let mut blob = Vec::with_capacity(NONCE_LEN + in_out.len());
    blob.extend_from_slice(&nonce_bytes);
    blob.extend_from_slice(&in_out);
    Ok(blob)
}

/// Decrypt a blob produced by [`seal`].
///
/// Any failure (short blob, wrong key, tampered bytes) is an
/// [`CliniqError::Integrity`]. No partial plaintext is ever returned.
pub fn open(key: &[u8; 32], blob: &[u8]) -> Result<Vec<u8>, CliniqError> {
    if blob.len() < MIN_BLOB_LEN {
        return Err(CliniqError::Integrity(format!(
            "sealed blob too short: {} bytes, need at least {MIN_BLOB_LEN}",
            blob.len()
        )));
    }

    let (nonce_bytes, ciphertext) = blob.split_at(NONCE_LEN);
    let nonce = Nonce::try_assume_unique_for_key(nonce_bytes)
        .map_err(|_| CliniqError::Integrity("malformed nonce".to_string()))?;

    let less_safe = sealing_key(key)?;
    let mut in_out = ciphertext.to_vec();
    let plaintext = less_safe
        .open_in_place(nonce, Aad::empty(), &mut in_out)
        .map_err(|_| {
            CliniqError::Integrity(
                "AES-256-GCM authentication failed -- wrong key or corrupted data".to_string(),
            )
        })?;

    Ok(plaintext.to_vec())
}
