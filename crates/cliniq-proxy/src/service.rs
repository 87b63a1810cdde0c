// SPDX-FileCopyrightText: 2026 Cliniq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The service object shared by every request handler.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use cliniq_config::model::{StorageConfig, UpstreamConfig};
use cliniq_core::{CliniqError, CredentialStore};
use cliniq_upstream::AutomationClient;
use cliniq_vault::CredentialCipher;

/// Onboarding and proxying for stored automation credentials.
///
/// Holds no per-caller state. Operations live in [`crate::onboarding`] and
/// [`crate::proxy`].
#[derive(Clone)]
pub struct ProxyService {
    pub(crate) store: Arc<dyn CredentialStore>,
    pub(crate) cipher: Arc<CredentialCipher>,
    pub(crate) client: AutomationClient,
    pub(crate) upstream: UpstreamConfig,
    pub(crate) store_timeout: Duration,
}

impl ProxyService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        cipher: Arc<CredentialCipher>,
        upstream: UpstreamConfig,
        storage: &StorageConfig,
    ) -> Result<Self, CliniqError> {
        let client = AutomationClient::new(&upstream)?;
        Ok(Self {
            store,
            cipher,
            client,
            upstream,
            store_timeout: Duration::from_secs(storage.timeout_secs),
        })
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// Bound a store call by `storage.timeout_secs`.
    pub(crate) async fn bounded<T>(
        &self,
        fut: impl Future<Output = Result<T, CliniqError>>,
    ) -> Result<T, CliniqError> {
        tokio::time::timeout(self.store_timeout, fut)
            .await
            .map_err(|_| CliniqError::Timeout {
                duration: self.store_timeout,
            })?
    }
}

impl std::fmt::Debug for ProxyService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyService")
            .field("store", &self.store.name())
            .field("store_timeout", &self.store_timeout)
            .finish_non_exhaustive()
    }
}
