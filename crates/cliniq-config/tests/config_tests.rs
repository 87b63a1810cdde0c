// SPDX-FileCopyrightText: 2026 Cliniq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Cliniq configuration system.

use cliniq_config::diagnostic::ConfigError;
use cliniq_config::model::CliniqConfig;
use cliniq_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};

const SECRETS: &str = r#"
[auth]
jwt_secret = "jwt-test-secret"

[vault]
operator_secret = "operator-test-secret"
"#;

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_cliniq_config() {
    let toml = r#"
[server]
host = "0.0.0.0"
port = 9000
log_level = "debug"

[auth]
jwt_secret = "jwt-test-secret"
jwt_audience = "authenticated"
jwt_issuer = "https://auth.example.com"

[vault]
operator_secret = "operator-test-secret"

[storage]
database_path = "/tmp/cliniq-test.db"
wal_mode = false
timeout_secs = 2

[upstream]
api_key_header = "X-API-KEY"
probe_path = "/health"
timeout_secs = 15
connect_timeout_secs = 3
block_private_networks = false
allowed_private_ips = ["10.0.0.5"]
require_tls = false
max_error_body_chars = 256
"#;

    let config = load_and_validate_str(toml).expect("valid TOML should load");
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.server.log_level, "debug");
    assert_eq!(config.auth.jwt_audience.as_deref(), Some("authenticated"));
    assert_eq!(
        config.auth.jwt_issuer.as_deref(),
        Some("https://auth.example.com")
    );
    assert_eq!(
        config.vault.operator_secret.as_deref(),
        Some("operator-test-secret")
    );
    assert_eq!(config.storage.database_path, "/tmp/cliniq-test.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.storage.timeout_secs, 2);
    assert_eq!(config.upstream.api_key_header, "X-API-KEY");
    assert_eq!(config.upstream.probe_path, "/health");
    assert_eq!(config.upstream.timeout_secs, 15);
    assert_eq!(config.upstream.connect_timeout_secs, 3);
    assert!(!config.upstream.block_private_networks);
    assert_eq!(config.upstream.allowed_private_ips, vec!["10.0.0.5"]);
    assert!(!config.upstream.require_tls);
    assert_eq!(config.upstream.max_error_body_chars, 256);
}

/// Missing optional sections use defaults without error.
#[test]
fn missing_optional_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");

    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 8710);
    assert_eq!(config.server.log_level, "info");
    assert!(config.auth.jwt_secret.is_none());
    assert!(config.vault.operator_secret.is_none());
    assert!(config.storage.wal_mode);
    assert_eq!(config.storage.timeout_secs, 5);
    assert_eq!(config.upstream.api_key_header, "X-N8N-API-KEY");
    assert_eq!(config.upstream.timeout_secs, 30);
}

/// A missing operator secret is fatal at load time.
#[test]
fn missing_operator_secret_fails_validation() {
    let toml = r#"
[auth]
jwt_secret = "jwt-test-secret"
"#;

    let errors = load_and_validate_str(toml).expect_err("operator secret is required");
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        &errors[0],
        ConfigError::Validation { message } if message.contains("vault.operator_secret")
    ));
}

/// Unknown key produces an UnknownKey diagnostic with a suggestion.
#[test]
fn unknown_key_produces_suggestion() {
    let toml = format!("{SECRETS}\n[upstream]\nprobe_pth = \"/x\"\n");

    let errors = load_and_validate_str(&toml).expect_err("should reject unknown field");
    let unknown = errors
        .iter()
        .find_map(|e| match e {
            ConfigError::UnknownKey {
                key, suggestion, ..
            } => Some((key.clone(), suggestion.clone())),
            _ => None,
        })
        .expect("should contain UnknownKey");

    assert_eq!(unknown.0, "probe_pth");
    assert_eq!(unknown.1.as_deref(), Some("probe_path"));
}

/// Unknown top-level section is rejected.
#[test]
fn unknown_section_is_rejected() {
    let toml = format!("{SECRETS}\n[telegram]\nbot_token = \"x\"\n");
    assert!(load_and_validate_str(&toml).is_err());
}

/// Wrong value type produces an InvalidType diagnostic naming the key.
#[test]
fn wrong_type_produces_invalid_type_error() {
    let toml = format!("{SECRETS}\n[server]\nport = \"eighty\"\n");

    let errors = load_and_validate_str(&toml).expect_err("port must be an integer");
    assert!(errors.iter().any(|e| matches!(
        e,
        ConfigError::InvalidType { key, .. } if key.contains("port")
    )));
}

/// Dotted overrides (the shape env vars are mapped to) win over file values.
#[test]
fn dotted_override_sets_operator_secret() {
    use figment::{
        Figment,
        providers::{Format, Serialized, Toml},
    };

    let config: CliniqConfig = Figment::new()
        .merge(Serialized::defaults(CliniqConfig::default()))
        .merge(Toml::string(SECRETS))
        .merge(("vault.operator_secret", "from-env"))
        .extract()
        .expect("should merge override");

    assert_eq!(config.vault.operator_secret.as_deref(), Some("from-env"));
}

/// Missing config files are silently skipped.
#[test]
fn missing_config_files_silently_skipped() {
    use figment::{
        Figment,
        providers::{Format, Serialized, Toml},
    };

    let config: CliniqConfig = Figment::new()
        .merge(Serialized::defaults(CliniqConfig::default()))
        .merge(Toml::file("/nonexistent/path/cliniq.toml"))
        .extract()
        .expect("missing file should be silently skipped");

    assert_eq!(config.server.port, 8710);
}

/// Explicit config file path loads and validates.
#[test]
fn explicit_path_loads_and_validates() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cliniq.toml");
    std::fs::write(&path, format!("{SECRETS}\n[server]\nport = 9100\n")).unwrap();

    let config = load_and_validate_path(&path).expect("file config should validate");
    assert_eq!(config.server.port, 9100);
}

/// Unknown key errors from a file carry a source span for rendering.
#[test]
fn file_unknown_key_has_source_span() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cliniq.toml");
    std::fs::write(&path, format!("{SECRETS}\n[storage]\nwal_mod = true\n")).unwrap();

    let errors = load_and_validate_path(&path).expect_err("typo should be rejected");
    assert!(errors.iter().any(|e| matches!(
        e,
        ConfigError::UnknownKey { span: Some(_), suggestion: Some(s), .. } if s == "wal_mode"
    )));
}

/// Every diagnostic renders through miette without panicking.
#[test]
fn config_errors_render() {
    let errors = load_and_validate_str("").expect_err("secrets missing");
    assert!(!errors.is_empty());
    cliniq_config::render_errors(&errors);
}
