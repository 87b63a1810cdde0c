// SPDX-FileCopyrightText: 2026 Cliniq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes:
//! required secrets, bind addresses, header names, and positive timeouts.

use crate::diagnostic::ConfigError;
use crate::model::CliniqConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &CliniqConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut invalid = |message: String| errors.push(ConfigError::Validation { message });

    // [server]
    let host = config.server.host.trim();
    if host.is_empty() {
        invalid("server.host must not be empty".to_string());
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            invalid(format!(
                "server.host `{host}` is not a valid IP address or hostname"
            ));
        }
    }

    if !LOG_LEVELS.contains(&config.server.log_level.as_str()) {
        invalid(format!(
            "server.log_level `{}` must be one of: {}",
            config.server.log_level,
            LOG_LEVELS.join(", ")
        ));
    }

    // [auth]
    if is_blank(config.auth.jwt_secret.as_deref()) {
        invalid(
            "auth.jwt_secret is required (set CLINIQ_AUTH_JWT_SECRET); session tokens cannot be verified without it"
                .to_string(),
        );
    }

    // [vault]
    if is_blank(config.vault.operator_secret.as_deref()) {
        invalid(
            "vault.operator_secret is required (set CLINIQ_VAULT_OPERATOR_SECRET); stored credentials cannot be sealed or opened without it"
                .to_string(),
        );
    }

    // [storage]
    if config.storage.database_path.trim().is_empty() {
        invalid("storage.database_path must not be empty".to_string());
    }
    if config.storage.timeout_secs == 0 {
        invalid("storage.timeout_secs must be greater than 0".to_string());
    }

    // [upstream]
    let header = &config.upstream.api_key_header;
    if header.is_empty()
        || !header
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        invalid(format!(
            "upstream.api_key_header `{header}` is not a valid HTTP header name"
        ));
    }

    if !config.upstream.probe_path.starts_with('/') {
        invalid(format!(
            "upstream.probe_path `{}` must start with `/`",
            config.upstream.probe_path
        ));
    }

    if config.upstream.timeout_secs == 0 {
        invalid("upstream.timeout_secs must be greater than 0".to_string());
    }
    if config.upstream.connect_timeout_secs == 0 {
        invalid("upstream.connect_timeout_secs must be greater than 0".to_string());
    }
    if config.upstream.max_error_body_chars == 0 {
        invalid("upstream.max_error_body_chars must be greater than 0".to_string());
    }

    for ip in &config.upstream.allowed_private_ips {
        if ip.parse::<std::net::IpAddr>().is_err() {
            invalid(format!(
                "upstream.allowed_private_ips entry `{ip}` is not a valid IP address"
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> CliniqConfig {
        let mut config = CliniqConfig::default();
        config.auth.jwt_secret = Some("jwt-secret".to_string());
        config.vault.operator_secret = Some("operator-secret".to_string());
        config
    }

    fn has_error(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn configured_defaults_validate() {
        assert!(validate_config(&configured()).is_ok());
    }

    #[test]
    fn missing_secrets_are_both_reported() {
        let errors = validate_config(&CliniqConfig::default()).unwrap_err();
        assert!(has_error(&errors, "auth.jwt_secret"));
        assert!(has_error(&errors, "vault.operator_secret"));
    }

    #[test]
    fn whitespace_operator_secret_is_missing() {
        let mut config = configured();
        config.vault.operator_secret = Some("   ".to_string());
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "vault.operator_secret"));
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = configured();
        config.storage.database_path = "".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "database_path"));
    }

    #[test]
    fn bad_header_name_fails_validation() {
        let mut config = configured();
        config.upstream.api_key_header = "X API Key".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "api_key_header"));
    }

    #[test]
    fn probe_path_must_be_absolute() {
        let mut config = configured();
        config.upstream.probe_path = "workflows".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "probe_path"));
    }

    #[test]
    fn zero_timeouts_fail_validation() {
        let mut config = configured();
        config.storage.timeout_secs = 0;
        config.upstream.timeout_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "storage.timeout_secs"));
        assert!(has_error(&errors, "upstream.timeout_secs"));
    }

    #[test]
    fn invalid_allowed_ip_fails_validation() {
        let mut config = configured();
        config.upstream.allowed_private_ips = vec!["10.0.0.5".into(), "not-an-ip".into()];
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(has_error(&errors, "not-an-ip"));
    }

    #[test]
    fn unknown_log_level_fails_validation() {
        let mut config = configured();
        config.server.log_level = "verbose".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "log_level"));
    }
}
