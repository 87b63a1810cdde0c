// SPDX-FileCopyrightText: 2026 Cliniq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connecting, disconnecting, and inspecting an owner's automation connection.

use std::fmt;

use chrono::{SecondsFormat, Utc};
use cliniq_core::{CliniqError, ConnectionRecord, ConnectionStatus, OwnerId};
use cliniq_security::validate_url;
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, warn};

use crate::recording;
use crate::service::ProxyService;

/// Candidate connection submitted by an owner.
pub struct ConnectInput {
    pub base_url: String,
    pub api_key: SecretString,
    pub workflow_scope: Option<String>,
}

impl fmt::Debug for ConnectInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectInput")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("workflow_scope", &self.workflow_scope)
            .finish()
    }
}

impl ProxyService {
    /// Validate, probe, seal, and store a connection for `owner`.
    ///
    /// Nothing is written unless the probe succeeds. A second call replaces
    /// the first record while keeping its `created_at`.
    pub async fn connect(
        &self,
        owner: &OwnerId,
        input: ConnectInput,
    ) -> Result<ConnectionStatus, CliniqError> {
        let result = self.connect_inner(owner, input).await;
        recording::record_onboarding(&result);
        if let Err(e) = &result {
            warn!(owner = %owner, kind = %e.kind(), "onboarding rejected");
        }
        result
    }

    async fn connect_inner(
        &self,
        owner: &OwnerId,
        input: ConnectInput,
    ) -> Result<ConnectionStatus, CliniqError> {
        let base_url = normalize_base_url(&input.base_url)?;
        let url = url::Url::parse(&base_url)
            .map_err(|e| CliniqError::InvalidInput(format!("base_url is not a valid URL: {e}")))?;
        validate_url(&url, &self.upstream)?;

        let api_key = input.api_key.expose_secret().trim();
        if api_key.is_empty() {
            return Err(CliniqError::InvalidInput("api_key must not be empty".to_string()));
        }
        let api_key = SecretString::from(api_key.to_owned());
        let workflow_scope = normalize_scope(input.workflow_scope);

        self.client.probe(&base_url, &api_key).await?;

        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let record = ConnectionRecord {
            owner_id: owner.clone(),
            base_url,
            encrypted_secret: self.cipher.seal(api_key.expose_secret())?,
            workflow_scope,
            created_at: now.clone(),
            updated_at: now,
        };
        self.bounded(self.store.upsert(&record)).await?;

        info!(owner = %owner, base_url = %record.base_url, "automation connection stored");
        Ok(ConnectionStatus::from(&record))
    }

    /// Remove the owner's connection. Idempotent.
    pub async fn disconnect(&self, owner: &OwnerId) -> Result<(), CliniqError> {
        let existed = self.bounded(self.store.delete(owner)).await?;
        info!(owner = %owner, existed, "automation connection removed");
        Ok(())
    }

    /// Non-secret view of the owner's connection.
    pub async fn status(&self, owner: &OwnerId) -> Result<ConnectionStatus, CliniqError> {
        let record = self.bounded(self.store.get(owner)).await?;
        Ok(record
            .as_ref()
            .map(ConnectionStatus::from)
            .unwrap_or_else(ConnectionStatus::disconnected))
    }
}

/// Absolute http(s) URL with a host, no query, fragment, or userinfo; trailing
/// slashes stripped.
fn normalize_base_url(raw: &str) -> Result<String, CliniqError> {
    let trimmed = raw.trim();
    let url = url::Url::parse(trimmed)
        .map_err(|e| CliniqError::InvalidInput(format!("base_url is not a valid URL: {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(CliniqError::InvalidInput(
            "base_url must use http or https".to_string(),
        ));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(CliniqError::InvalidInput("base_url must have a host".to_string()));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(CliniqError::InvalidInput(
            "base_url must not contain a query or fragment".to_string(),
        ));
    }
    if !url.username().is_empty() || url.password().is_some() {
        return Err(CliniqError::InvalidInput(
            "base_url must not embed credentials".to_string(),
        ));
    }

    Ok(url.as_str().trim_end_matches('/').to_string())
}

fn normalize_scope(scope: Option<String>) -> Option<String> {
    scope
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
