// SPDX-FileCopyrightText: 2026 Cliniq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Network security enforcement for the Cliniq credential proxy.
//!
//! Provides TLS enforcement, SSRF prevention via DNS resolver filtering,
//! and secret redaction for logs and relayed error text.

pub mod redact;
pub mod ssrf;
pub mod tls;

pub use redact::{RedactingWriter, RedactionList, redact, truncate_chars};
pub use ssrf::SsrfSafeResolver;
pub use tls::{build_secure_client, is_localhost, validate_url};
