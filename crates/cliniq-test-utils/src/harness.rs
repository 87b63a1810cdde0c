// SPDX-FileCopyrightText: 2026 Cliniq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles the full stack: temp SQLite store, credential
//! cipher, proxy service, JWT authenticator, axum router, and a mock
//! automation engine. Requests go through the router with
//! `tower::ServiceExt::oneshot`, exactly as a real client's would.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use cliniq_config::model::{AuthConfig, StorageConfig, UpstreamConfig};
use cliniq_core::{CliniqError, CredentialStore, OwnerId};
use cliniq_gateway::{GatewayState, HealthState, JwtAuthenticator, build_router};
use cliniq_proxy::ProxyService;
use cliniq_storage::SqliteCredentialStore;
use cliniq_vault::CredentialCipher;
use http_body_util::BodyExt;
use jsonwebtoken::{EncodingKey, Header, encode};
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::mock_engine::MockEngine;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    api_key: String,
    operator_secret: String,
    jwt_secret: String,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            api_key: "n8n_test_api_key_0001".to_string(),
            operator_secret: "harness-operator-secret".to_string(),
            jwt_secret: "harness-jwt-secret".to_string(),
        }
    }

    /// API key the mock engine accepts.
    pub fn with_api_key(mut self, key: &str) -> Self {
        self.api_key = key.to_string();
        self
    }

    /// Operator secret the cipher key is derived from.
    pub fn with_operator_secret(mut self, secret: &str) -> Self {
        self.operator_secret = secret.to_string();
        self
    }

    /// Build the harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, CliniqError> {
        let temp_dir = tempfile::TempDir::new().map_err(CliniqError::storage)?;
        let storage_config = StorageConfig {
            database_path: temp_dir
                .path()
                .join("test.db")
                .to_string_lossy()
                .into_owned(),
            ..StorageConfig::default()
        };
        let store = Arc::new(SqliteCredentialStore::new(storage_config.clone()));
        store.initialize().await?;

        // The mock engine listens on loopback over plain HTTP.
        let upstream = UpstreamConfig {
            block_private_networks: false,
            require_tls: false,
            timeout_secs: 3,
            connect_timeout_secs: 1,
            ..UpstreamConfig::default()
        };
        let cipher = Arc::new(CredentialCipher::from_operator_secret(&SecretString::from(
            self.operator_secret.clone(),
        ))?);
        let service = ProxyService::new(store.clone(), cipher, upstream, &storage_config)?;

        let auth = JwtAuthenticator::from_config(&AuthConfig {
            jwt_secret: Some(self.jwt_secret.clone()),
            ..AuthConfig::default()
        })?;

        let state = GatewayState {
            service,
            auth: Arc::new(auth),
            health: HealthState::new(None),
        };

        let engine = MockEngine::start(&self.api_key).await;

        Ok(TestHarness {
            state,
            store,
            engine,
            api_key: self.api_key,
            jwt_secret: self.jwt_secret,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with a mock engine and temp storage.
pub struct TestHarness {
    /// Shared gateway state (router is rebuilt per request).
    pub state: GatewayState,
    /// SQLite store (temp DB, cleaned up on drop).
    pub store: Arc<SqliteCredentialStore>,
    /// Mock automation engine.
    pub engine: MockEngine,
    /// API key the mock engine accepts.
    pub api_key: String,
    jwt_secret: String,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Mint a session token for `owner`, valid until 2100.
    pub fn token_for(&self, owner: &str) -> String {
        encode(
            &Header::default(),
            &json!({"sub": owner, "exp": 4_102_444_800u64}),
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .unwrap_or_default()
    }

    /// Send one request through the router as `owner` (or anonymously).
    ///
    /// Returns the status and the body parsed as JSON (`Null` when empty).
    pub async fn send(
        &self,
        verb: &str,
        uri: &str,
        owner: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(verb).uri(uri);
        if let Some(owner) = owner {
            builder = builder.header("authorization", format!("Bearer {}", self.token_for(owner)));
        }
        let request = match body {
            Some(b) => builder
                .header("content-type", "application/json")
                .body(Body::from(b.to_string())),
            None => builder.body(Body::empty()),
        };
        let Ok(request) = request else {
            return (StatusCode::BAD_REQUEST, Value::Null);
        };

        let response = match build_router(self.state.clone()).oneshot(request).await {
            Ok(response) => response,
            Err(never) => match never {},
        };
        let status = response.status();
        let bytes = match response.into_body().collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(_) => return (status, Value::Null),
        };
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    /// Onboard `owner` against the mock engine with the accepted key.
    pub async fn connect(&self, owner: &str, scope: Option<&str>) -> (StatusCode, Value) {
        let mut body = json!({"base_url": self.engine.base_url(), "api_key": self.api_key});
        if let Some(scope) = scope {
            body["workflow_scope"] = json!(scope);
        }
        self.send("POST", "/v1/connection", Some(owner), Some(body))
            .await
    }

    /// Proxy a call for `owner`.
    pub async fn proxy(&self, owner: &str, body: Value) -> (StatusCode, Value) {
        self.send("POST", "/v1/proxy", Some(owner), Some(body)).await
    }

    /// Read the stored record straight from the store.
    pub async fn stored(&self, owner: &str) -> Option<cliniq_core::ConnectionRecord> {
        self.store.get(&OwnerId::from(owner)).await.ok().flatten()
    }
}
