// SPDX-FileCopyrightText: 2026 Cliniq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `cliniq serve` command implementation.
//!
//! Derives the sealing key, opens the credential store, and runs the gateway
//! until SIGINT/SIGTERM. Any configuration fault aborts before the socket is
//! bound.

use std::sync::{Arc, RwLock};

use cliniq_config::model::CliniqConfig;
use cliniq_core::{CliniqError, CredentialStore, PluginAdapter};
use cliniq_gateway::{GatewayState, HealthState, JwtAuthenticator, MetricsRender, start_server};
use cliniq_proxy::ProxyService;
use cliniq_security::{RedactingWriter, RedactionList};
use cliniq_storage::SqliteCredentialStore;
use cliniq_vault::CredentialCipher;
use secrecy::SecretString;
use tracing::{info, warn};

use crate::shutdown;

/// Run the `cliniq serve` command.
pub async fn run_serve(config: CliniqConfig) -> Result<(), CliniqError> {
    let redactions = secret_redactions(&config);
    init_tracing(&config.server.log_level, redactions);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        db = %config.storage.database_path,
        "cliniq starting"
    );

    let metrics = match cliniq_gateway::install_recorder() {
        Ok(render) => Some(render),
        Err(e) => {
            warn!("metrics disabled: {e}");
            None
        }
    };

    let (state, store) = build_state(&config, metrics).await?;
    let cancel = shutdown::install_signal_handler();

    let served = start_server(&config.server, state, cancel).await;

    if let Err(e) = store.shutdown().await {
        warn!("storage shutdown failed: {e}");
    }
    served?;

    info!("cliniq serve shutdown complete");
    Ok(())
}

/// Wire cipher, store, proxy service, and authenticator together.
pub(crate) async fn build_state(
    config: &CliniqConfig,
    metrics: Option<MetricsRender>,
) -> Result<(GatewayState, Arc<SqliteCredentialStore>), CliniqError> {
    let operator_secret = config
        .vault
        .operator_secret
        .clone()
        .map(SecretString::from)
        .ok_or_else(|| CliniqError::Config("vault.operator_secret is not set".to_string()))?;
    let cipher = Arc::new(CredentialCipher::from_operator_secret(&operator_secret)?);
    let auth = JwtAuthenticator::from_config(&config.auth)?;

    let store = Arc::new(SqliteCredentialStore::new(config.storage.clone()));
    store.initialize().await?;

    let service = ProxyService::new(
        store.clone(),
        cipher,
        config.upstream.clone(),
        &config.storage,
    )?;

    let state = GatewayState {
        service,
        auth: Arc::new(auth),
        health: HealthState::new(metrics),
    };
    Ok((state, store))
}

/// Configured secrets that must never reach a log line.
fn secret_redactions(config: &CliniqConfig) -> RedactionList {
    let list: RedactionList = Arc::new(RwLock::new(Vec::new()));
    let secrets = [&config.vault.operator_secret, &config.auth.jwt_secret];
    for secret in secrets.into_iter().flatten() {
        RedactingWriter::<std::io::Stderr>::add_known_value(&list, secret.clone());
    }
    list
}

/// Initialize the tracing subscriber with `RUST_LOG` override and secret
/// redaction on every line written.
fn init_tracing(log_level: &str, redactions: RedactionList) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("cliniq={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(move || RedactingWriter::new(std::io::stderr(), redactions.clone()))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(dir: &tempfile::TempDir) -> CliniqConfig {
        let mut config = CliniqConfig::default();
        config.vault.operator_secret = Some("serve-test-operator".to_string());
        config.auth.jwt_secret = Some("serve-test-jwt".to_string());
        config.storage.database_path = dir.path().join("serve.db").to_string_lossy().into_owned();
        config
    }

    #[tokio::test]
    async fn build_state_opens_store() {
        let dir = tempfile::TempDir::new().unwrap();
        let (state, store) = build_state(&config(&dir), None).await.unwrap();
        assert_eq!(
            store.health_check().await.unwrap(),
            cliniq_core::HealthStatus::Healthy
        );
        assert!(state.health.prometheus_render.is_none());
    }

    #[tokio::test]
    async fn missing_operator_secret_is_config_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = config(&dir);
        config.vault.operator_secret = None;
        let err = build_state(&config, None).await.err().unwrap();
        assert!(matches!(err, CliniqError::Config(_)));
        assert!(!dir.path().join("serve.db").exists());
    }

    #[test]
    fn redactions_cover_both_secrets() {
        let dir = tempfile::TempDir::new().unwrap();
        let list = secret_redactions(&config(&dir));
        let values = list.read().unwrap().clone();
        assert!(values.contains(&"serve-test-operator".to_string()));
        assert!(values.contains(&"serve-test-jwt".to_string()));
    }
}
