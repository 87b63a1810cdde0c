// SPDX-FileCopyrightText: 2026 Cliniq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authentication adapter trait for caller identity verification.

use async_trait::async_trait;

use crate::error::CliniqError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{AuthIdentity, AuthToken};

/// Adapter that turns a presented bearer token into a verified owner.
///
/// Implementations must return [`CliniqError::Unauthorized`] for any token
/// they cannot verify; the caller never falls back to an anonymous identity.
#[async_trait]
pub trait AuthAdapter: PluginAdapter {
    /// Authenticates the given token and returns the verified identity.
    async fn authenticate(&self, token: AuthToken) -> Result<AuthIdentity, CliniqError>;
}
