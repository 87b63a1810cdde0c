// SPDX-FileCopyrightText: 2026 Cliniq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential store trait: the persistence seam for connection records.

use async_trait::async_trait;

use crate::error::CliniqError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ConnectionRecord, OwnerId};

/// Keyed persistence of [`ConnectionRecord`]s, at most one per owner.
///
/// The store only ever sees sealed secrets. Sealing and opening happen in the
/// vault layer above it.
#[async_trait]
pub trait CredentialStore: PluginAdapter {
    /// Prepares the backend (opens connections, runs migrations).
    async fn initialize(&self) -> Result<(), CliniqError>;

    /// Inserts the record, or replaces the owner's existing one.
    ///
    /// On replace the original `created_at` is preserved.
    async fn upsert(&self, record: &ConnectionRecord) -> Result<(), CliniqError>;

    /// Returns the owner's record, or `None` if none is stored.
    async fn get(&self, owner: &OwnerId) -> Result<Option<ConnectionRecord>, CliniqError>;

    /// Removes the owner's record. Returns whether a record existed.
    async fn delete(&self, owner: &OwnerId) -> Result<bool, CliniqError>;
}
