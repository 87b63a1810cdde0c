// SPDX-FileCopyrightText: 2026 Cliniq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./cliniq.toml` > `~/.config/cliniq/cliniq.toml` > `/etc/cliniq/cliniq.toml`
//! with environment variable overrides via `CLINIQ_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::CliniqConfig;

/// Config sections, used to turn `CLINIQ_<SECTION>_<KEY>` into `<section>.<key>`.
const SECTIONS: &[&str] = &["server", "auth", "vault", "storage", "upstream"];

pub(crate) const SYSTEM_CONFIG_PATH: &str = "/etc/cliniq/cliniq.toml";
pub(crate) const LOCAL_CONFIG_PATH: &str = "cliniq.toml";

pub(crate) fn user_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("cliniq/cliniq.toml"))
        .unwrap_or_default()
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/cliniq/cliniq.toml` (system-wide)
/// 3. `~/.config/cliniq/cliniq.toml` (user XDG config)
/// 4. `./cliniq.toml` (local directory)
/// 5. `CLINIQ_*` environment variables
pub fn load_config() -> Result<CliniqConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<CliniqConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CliniqConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<CliniqConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CliniqConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(CliniqConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path()))
        .merge(Toml::file(LOCAL_CONFIG_PATH))
        .merge(env_provider())
}

/// Create the environment variable provider with explicit section mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `CLINIQ_VAULT_OPERATOR_SECRET` must map to
/// `vault.operator_secret`, not `vault.operator.secret`.
fn env_provider() -> Env {
    Env::prefixed("CLINIQ_").map(|key| map_env_key(key.as_str()).into())
}

/// Map a lowercased, prefix-stripped env var name to a dotted config path.
pub(crate) fn map_env_key(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_sections() {
        assert_eq!(map_env_key("vault_operator_secret"), "vault.operator_secret");
        assert_eq!(map_env_key("auth_jwt_secret"), "auth.jwt_secret");
        assert_eq!(
            map_env_key("upstream_api_key_header"),
            "upstream.api_key_header"
        );
        assert_eq!(map_env_key("storage_timeout_secs"), "storage.timeout_secs");
        assert_eq!(map_env_key("server_port"), "server.port");
    }

    #[test]
    fn section_name_inside_key_is_not_split() {
        // `upstream_...` contains no other section prefix, and only the
        // leading section is ever mapped.
        assert_eq!(
            map_env_key("upstream_block_private_networks"),
            "upstream.block_private_networks"
        );
        assert_eq!(map_env_key("unknown_thing"), "unknown_thing");
    }

    #[test]
    fn file_provider_reads_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cliniq.toml");
        std::fs::write(&path, "[server]\nport = 9001\n").unwrap();

        let config = load_config_from_path(&path).unwrap();
        assert_eq!(config.server.port, 9001);
    }
}
