// SPDX-FileCopyrightText: 2026 Cliniq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Cliniq credential proxy.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Cliniq configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// Every section defaults; the two secrets (`auth.jwt_secret`,
/// `vault.operator_secret`) are enforced by validation rather than by serde.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CliniqConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Caller session-token verification.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Credential sealing settings.
    #[serde(default)]
    pub vault: VaultConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Outbound automation API settings.
    #[serde(default)]
    pub upstream: UpstreamConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind the server to.
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8710
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Session-token verification configuration.
///
/// Tokens are HS256 JWTs issued by the hosted auth provider; the `sub` claim
/// is the owner id.
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Shared HS256 signing secret. Required.
    #[serde(default)]
    pub jwt_secret: Option<String>,

    /// Expected `aud` claim. `None` skips the audience check.
    #[serde(default)]
    pub jwt_audience: Option<String>,

    /// Expected `iss` claim. `None` skips the issuer check.
    #[serde(default)]
    pub jwt_issuer: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "[REDACTED]"))
            .field("jwt_audience", &self.jwt_audience)
            .field("jwt_issuer", &self.jwt_issuer)
            .finish()
    }
}

/// Credential sealing configuration.
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VaultConfig {
    /// Operator-held secret the sealing key is derived from. Required.
    ///
    /// Usually supplied as `CLINIQ_VAULT_OPERATOR_SECRET` rather than in a file.
    #[serde(default)]
    pub operator_secret: Option<String>,
}

impl std::fmt::Debug for VaultConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultConfig")
            .field(
                "operator_secret",
                &self.operator_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,

    /// Upper bound on any single store call, in seconds.
    #[serde(default = "default_storage_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
            timeout_secs: default_storage_timeout_secs(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("cliniq").join("cliniq.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("cliniq.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

fn default_storage_timeout_secs() -> u64 {
    5
}

/// Outbound automation API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UpstreamConfig {
    /// Header that carries the API key on every outbound call.
    #[serde(default = "default_api_key_header")]
    pub api_key_header: String,

    /// Path (relative to the base URL) probed during onboarding.
    #[serde(default = "default_probe_path")]
    pub probe_path: String,

    /// Total timeout for one outbound call, in seconds.
    #[serde(default = "default_upstream_timeout_secs")]
    pub timeout_secs: u64,

    /// TCP/TLS connect timeout, in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Refuse to connect to private, loopback, and link-local addresses.
    #[serde(default = "default_block_private_networks")]
    pub block_private_networks: bool,

    /// Private IP addresses exempt from the block (e.g. a self-hosted engine on the LAN).
    #[serde(default)]
    pub allowed_private_ips: Vec<String>,

    /// Require `https://` base URLs. Localhost is always exempt.
    #[serde(default = "default_require_tls")]
    pub require_tls: bool,

    /// Upstream error bodies are truncated to this many characters.
    #[serde(default = "default_max_error_body_chars")]
    pub max_error_body_chars: usize,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_key_header: default_api_key_header(),
            probe_path: default_probe_path(),
            timeout_secs: default_upstream_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            block_private_networks: default_block_private_networks(),
            allowed_private_ips: Vec::new(),
            require_tls: default_require_tls(),
            max_error_body_chars: default_max_error_body_chars(),
        }
    }
}

fn default_api_key_header() -> String {
    "X-N8N-API-KEY".to_string()
}

fn default_probe_path() -> String {
    "/workflows?limit=1".to_string()
}

fn default_upstream_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_block_private_networks() -> bool {
    true
}

fn default_require_tls() -> bool {
    true
}

fn default_max_error_body_chars() -> usize {
    512
}
