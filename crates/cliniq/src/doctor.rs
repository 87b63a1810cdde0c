// SPDX-FileCopyrightText: 2026 Cliniq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `cliniq doctor` command implementation.
//!
//! Runs diagnostic checks against the configuration and the credential store.
//! Output carries counts only: no owner ids, ciphertext, or secrets.

use std::io::IsTerminal;
use std::time::{Duration, Instant};

use cliniq_config::model::CliniqConfig;
use cliniq_core::{CredentialStore, HealthStatus, PluginAdapter};
use cliniq_storage::SqliteCredentialStore;
use cliniq_vault::CredentialCipher;
use secrecy::SecretString;

/// Status of a diagnostic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

impl CheckResult {
    fn new(name: &str, status: CheckStatus, message: impl Into<String>, start: Instant) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.into(),
            duration: start.elapsed(),
        }
    }
}

/// Run the `cliniq doctor` command. Returns the number of failed checks.
pub async fn run_doctor(config: &CliniqConfig, plain: bool) -> usize {
    let use_color = !plain && std::io::stdout().is_terminal();
    let results = collect_checks(config).await;

    println!();
    println!("  cliniq doctor");
    println!("  {}", "-".repeat(50));

    let mut fail_count = 0;
    let mut warn_count = 0;
    for result in &results {
        match result.status {
            CheckStatus::Pass => {}
            CheckStatus::Warn => warn_count += 1,
            CheckStatus::Fail => fail_count += 1,
        }
        println!("{}", format_line(result, use_color));
    }

    println!();
    if fail_count > 0 || warn_count > 0 {
        let issues = fail_count + warn_count;
        let issue_word = if issues == 1 { "issue" } else { "issues" };
        println!("  {issues} {issue_word} found.");
    } else {
        println!("  All checks passed.");
    }
    println!();

    fail_count
}

fn format_line(result: &CheckResult, use_color: bool) -> String {
    use colored::Colorize;

    let duration_ms = result.duration.as_millis();
    if !use_color {
        let tag = match result.status {
            CheckStatus::Pass => "[OK]  ",
            CheckStatus::Warn => "[WARN]",
            CheckStatus::Fail => "[FAIL]",
        };
        return format!(
            "    {tag} {:<20} {} ({duration_ms}ms)",
            result.name, result.message
        );
    }

    let (symbol, message) = match result.status {
        CheckStatus::Pass => ("✓".green(), result.message.normal()),
        CheckStatus::Warn => ("!".yellow(), result.message.yellow()),
        CheckStatus::Fail => ("✗".red(), result.message.red()),
    };
    format!(
        "    {symbol} {:<20} {message} ({duration_ms}ms)",
        result.name
    )
}

pub(crate) async fn collect_checks(config: &CliniqConfig) -> Vec<CheckResult> {
    let mut results = vec![check_upstream_policy(config)];

    let cipher = check_operator_secret(config, &mut results);

    let store = SqliteCredentialStore::new(config.storage.clone());
    let storage_ok = check_storage(&store, &mut results).await;

    if storage_ok {
        if let Some(cipher) = &cipher {
            results.push(check_stored_records(&store, cipher).await);
        }
        let _ = store.shutdown().await;
    }

    results
}

fn check_upstream_policy(config: &CliniqConfig) -> CheckResult {
    let start = Instant::now();
    let upstream = &config.upstream;
    let mut relaxed = Vec::new();
    if !upstream.require_tls {
        relaxed.push("plain HTTP allowed");
    }
    if !upstream.block_private_networks {
        relaxed.push("private networks reachable");
    }

    if relaxed.is_empty() {
        CheckResult::new(
            "Upstream policy",
            CheckStatus::Pass,
            "TLS required, private networks blocked",
            start,
        )
    } else {
        CheckResult::new("Upstream policy", CheckStatus::Warn, relaxed.join(", "), start)
    }
}

fn check_operator_secret(
    config: &CliniqConfig,
    results: &mut Vec<CheckResult>,
) -> Option<CredentialCipher> {
    let start = Instant::now();
    let cipher = config
        .vault
        .operator_secret
        .clone()
        .ok_or_else(|| "not set".to_string())
        .and_then(|s| {
            CredentialCipher::from_operator_secret(&SecretString::from(s)).map_err(|e| e.to_string())
        });

    match cipher {
        Ok(cipher) => {
            results.push(CheckResult::new(
                "Operator secret",
                CheckStatus::Pass,
                "sealing key derived",
                start,
            ));
            Some(cipher)
        }
        Err(e) => {
            results.push(CheckResult::new(
                "Operator secret",
                CheckStatus::Fail,
                e,
                start,
            ));
            None
        }
    }
}

async fn check_storage(store: &SqliteCredentialStore, results: &mut Vec<CheckResult>) -> bool {
    let start = Instant::now();
    if let Err(e) = store.initialize().await {
        results.push(CheckResult::new(
            "Storage",
            CheckStatus::Fail,
            format!("cannot open: {e}"),
            start,
        ));
        return false;
    }

    let (status, message, ok) = match store.health_check().await {
        Ok(HealthStatus::Healthy) => (CheckStatus::Pass, "healthy".to_string(), true),
        Ok(HealthStatus::Degraded(reason)) => (CheckStatus::Warn, reason, true),
        Ok(HealthStatus::Unhealthy(reason)) => (CheckStatus::Fail, reason, false),
        Err(e) => (CheckStatus::Fail, e.to_string(), false),
    };
    results.push(CheckResult::new("Storage", status, message, start));
    ok
}

/// Every stored record must open under the configured operator secret.
async fn check_stored_records(store: &SqliteCredentialStore, cipher: &CredentialCipher) -> CheckResult {
    let start = Instant::now();
    let records = match store.list_records().await {
        Ok(records) => records,
        Err(e) => {
            return CheckResult::new(
                "Stored credentials",
                CheckStatus::Fail,
                format!("cannot list: {e}"),
                start,
            );
        }
    };

    let total = records.len();
    let sealed_ok = records
        .iter()
        .filter(|r| cipher.open(&r.encrypted_secret).is_ok())
        .count();
    let failed = total - sealed_ok;

    if failed == 0 {
        CheckResult::new(
            "Stored credentials",
            CheckStatus::Pass,
            format!("{total} record(s), all open"),
            start,
        )
    } else {
        CheckResult::new(
            "Stored credentials",
            CheckStatus::Fail,
            format!("{failed} of {total} record(s) fail integrity check"),
            start,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cliniq_core::{ConnectionRecord, OwnerId};

    fn config(dir: &tempfile::TempDir, secret: Option<&str>) -> CliniqConfig {
        let mut config = CliniqConfig::default();
        config.vault.operator_secret = secret.map(str::to_string);
        config.storage.database_path = dir.path().join("doctor.db").to_string_lossy().into_owned();
        config
    }

    fn find<'a>(results: &'a [CheckResult], name: &str) -> &'a CheckResult {
        results.iter().find(|r| r.name == name).unwrap()
    }

    async fn seed(config: &CliniqConfig, sealed: String) {
        let store = SqliteCredentialStore::new(config.storage.clone());
        store.initialize().await.unwrap();
        store
            .upsert(&ConnectionRecord {
                owner_id: OwnerId::from("owner-a"),
                base_url: "https://n8n.example.com/api/v1".into(),
                encrypted_secret: sealed,
                workflow_scope: None,
                created_at: "2026-01-01T00:00:00Z".into(),
                updated_at: "2026-01-01T00:00:00Z".into(),
            })
            .await
            .unwrap();
        store.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn healthy_store_with_matching_secret_passes() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = config(&dir, Some("doctor-secret"));
        let cipher =
            CredentialCipher::from_operator_secret(&SecretString::from("doctor-secret".to_string()))
                .unwrap();
        seed(&config, cipher.seal("api-key").unwrap()).await;

        let results = collect_checks(&config).await;
        assert_eq!(find(&results, "Storage").status, CheckStatus::Pass);
        let records = find(&results, "Stored credentials");
        assert_eq!(records.status, CheckStatus::Pass);
        assert!(records.message.contains("1 record"));
    }

    #[tokio::test]
    async fn rotated_secret_fails_integrity_without_leaking_owner() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = config(&dir, Some("new-secret"));
        let old =
            CredentialCipher::from_operator_secret(&SecretString::from("old-secret".to_string()))
                .unwrap();
        seed(&config, old.seal("api-key").unwrap()).await;

        let results = collect_checks(&config).await;
        let records = find(&results, "Stored credentials");
        assert_eq!(records.status, CheckStatus::Fail);
        assert!(!records.message.contains("owner-a"));
    }

    #[tokio::test]
    async fn missing_secret_fails_and_skips_record_check() {
        let dir = tempfile::TempDir::new().unwrap();
        let results = collect_checks(&config(&dir, None)).await;
        assert_eq!(find(&results, "Operator secret").status, CheckStatus::Fail);
        assert!(results.iter().all(|r| r.name != "Stored credentials"));
    }

    #[test]
    fn relaxed_upstream_policy_warns() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = config(&dir, Some("s"));
        config.upstream.require_tls = false;
        let result = check_upstream_policy(&config);
        assert_eq!(result.status, CheckStatus::Warn);
        assert!(result.message.contains("plain HTTP"));
    }

    #[test]
    fn plain_output_has_tags() {
        let line = format_line(
            &CheckResult {
                name: "Storage".into(),
                status: CheckStatus::Fail,
                message: "cannot open".into(),
                duration: Duration::from_millis(3),
            },
            false,
        );
        assert!(line.contains("[FAIL]"));
        assert!(line.contains("Storage"));
    }
}
