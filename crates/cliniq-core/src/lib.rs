// SPDX-FileCopyrightText: 2026 Cliniq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Cliniq credential proxy.
//!
//! This crate provides the error taxonomy, the shared domain types, and the
//! adapter traits that the storage, gateway, and proxy crates build on.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{CliniqError, ErrorKind};
pub use types::{
    AdapterType, AuthIdentity, AuthToken, ConnectionRecord, ConnectionStatus, HealthStatus,
    HttpMethod, OwnerId, ProxyRequest,
};

pub use traits::{AuthAdapter, CredentialStore, PluginAdapter};
