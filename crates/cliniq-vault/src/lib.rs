// SPDX-FileCopyrightText: 2026 Cliniq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! AES-256-GCM credential sealing for the Cliniq proxy.
//!
//! A single operator secret, supplied at process start, is hashed into the
//! sealing key. API keys are sealed before they reach storage and opened only
//! transiently, in memory, for one outbound call.

pub mod cipher;
pub mod crypto;
pub mod kdf;

pub use cipher::CredentialCipher;
