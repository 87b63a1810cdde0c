// SPDX-FileCopyrightText: 2026 Cliniq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Forwarding a caller's request with their stored API key.

use std::time::Instant;

use cliniq_core::{CliniqError, ProxyRequest};
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::path::{check_scope, join_endpoint, validate_endpoint_path};
use crate::recording;
use crate::service::ProxyService;

impl ProxyService {
    /// Resolve the caller's connection, open the key, forward, and relay.
    ///
    /// The opened key lives only for this call. Errors are terminal; nothing
    /// is retried and nothing is written.
    pub async fn forward(&self, request: ProxyRequest) -> Result<Value, CliniqError> {
        let started = Instant::now();
        let result = self.forward_inner(&request).await;
        recording::record_proxy(&result);

        match &result {
            Ok(_) => debug!(
                owner = %request.caller,
                method = %request.method,
                path = %request.endpoint_path,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "proxied call succeeded"
            ),
            Err(e) => warn!(
                owner = %request.caller,
                method = %request.method,
                path = %request.endpoint_path,
                kind = %e.kind(),
                "proxied call failed"
            ),
        }
        result
    }

    async fn forward_inner(&self, request: &ProxyRequest) -> Result<Value, CliniqError> {
        validate_endpoint_path(&request.endpoint_path)?;

        let record = self
            .bounded(self.store.get(&request.caller))
            .await?
            .ok_or(CliniqError::NotConfigured)?;

        let url = join_endpoint(&record.base_url, &request.endpoint_path)?;
        check_scope(
            &record.base_url,
            &url,
            &request.query,
            record.workflow_scope.as_deref(),
        )?;

        let api_key = self.cipher.open(&record.encrypted_secret).map_err(|e| {
            recording::record_integrity_failure();
            error!(owner = %request.caller, error = %e, "stored credential failed integrity check");
            e
        })?;

        self.client.forward(url, request, &api_key).await
    }
}
