// SPDX-FileCopyrightText: 2026 Cliniq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the vault, storage, proxy, and gateway crates.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Stable identifier of the authenticated account that owns a connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(pub String);

impl OwnerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OwnerId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// One account's stored automation connection.
///
/// `encrypted_secret` is the sealed API key; the plaintext never lives in this
/// type. The `Debug` impl masks it anyway so a stray `{:?}` cannot leak even
/// the ciphertext into logs.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionRecord {
    pub owner_id: OwnerId,
    /// Root of the automation API, e.g. `https://n8n.example.com/api/v1`.
    pub base_url: String,
    pub encrypted_secret: String,
    /// Comma-separated workflow ids the connection may touch. `None` means unrestricted.
    pub workflow_scope: Option<String>,
    /// RFC 3339 timestamp of first insert.
    pub created_at: String,
    /// RFC 3339 timestamp of the latest upsert.
    pub updated_at: String,
}

impl fmt::Debug for ConnectionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionRecord")
            .field("owner_id", &self.owner_id)
            .field("base_url", &self.base_url)
            .field("encrypted_secret", &"[SEALED]")
            .field("workflow_scope", &self.workflow_scope)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// Non-secret view of a stored connection, safe to return to the owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl ConnectionStatus {
    pub fn disconnected() -> Self {
        Self {
            connected: false,
            base_url: None,
            workflow_scope: None,
            updated_at: None,
        }
    }
}

impl From<&ConnectionRecord> for ConnectionStatus {
    fn from(record: &ConnectionRecord) -> Self {
        Self {
            connected: true,
            base_url: Some(record.base_url.clone()),
            workflow_scope: record.workflow_scope.clone(),
            updated_at: Some(record.updated_at.clone()),
        }
    }
}

/// HTTP verbs the proxy will forward.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

/// A single authenticated call to forward to the caller's automation API.
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyRequest {
    pub caller: OwnerId,
    /// Path relative to the stored base URL, starting with `/`.
    pub endpoint_path: String,
    pub method: HttpMethod,
    pub body: Option<serde_json::Value>,
    pub query: BTreeMap<String, String>,
}

impl ProxyRequest {
    pub fn get(caller: OwnerId, endpoint_path: impl Into<String>) -> Self {
        Self {
            caller,
            endpoint_path: endpoint_path.into(),
            method: HttpMethod::Get,
            body: None,
            query: BTreeMap::new(),
        }
    }
}

/// Bearer credential presented by a caller.
#[derive(Clone)]
pub struct AuthToken(pub String);

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken([REDACTED])")
    }
}

/// The verified caller, as established by an [`crate::AuthAdapter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthIdentity {
    pub owner: OwnerId,
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the type of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Storage,
    Auth,
}
