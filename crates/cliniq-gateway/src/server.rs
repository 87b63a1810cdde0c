// SPDX-FileCopyrightText: 2026 Cliniq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
};
use cliniq_config::model::ServerConfig;
use cliniq_core::{AuthAdapter, CliniqError};
use cliniq_proxy::ProxyService;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::auth_middleware;
use crate::handlers;
use crate::prometheus::MetricsRender;

/// Request bodies above this size are rejected before deserialization.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Health state for unauthenticated health/metrics endpoints.
#[derive(Clone)]
pub struct HealthState {
    /// Process start time for uptime calculation.
    pub start_time: std::time::Instant,
    /// Optional Prometheus metrics render function.
    pub prometheus_render: Option<MetricsRender>,
}

impl HealthState {
    pub fn new(prometheus_render: Option<MetricsRender>) -> Self {
        Self {
            start_time: std::time::Instant::now(),
            prometheus_render,
        }
    }
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub service: ProxyService,
    pub auth: Arc<dyn AuthAdapter>,
    pub health: HealthState,
}

/// Build the full router.
///
/// - `GET /health`, `GET /metrics` (public)
/// - `POST|GET|DELETE /v1/connection`, `POST /v1/proxy` (bearer auth)
pub fn build_router(state: GatewayState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::get_public_health))
        .route("/metrics", get(handlers::get_public_metrics))
        .with_state(state.clone());

    let api_routes = Router::new()
        .route(
            "/v1/connection",
            post(handlers::post_connection)
                .get(handlers::get_connection)
                .delete(handlers::delete_connection),
        )
        .route("/v1/proxy", post(handlers::post_proxy))
        .route_layer(axum_middleware::from_fn_with_state(
            state.auth.clone(),
            auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind and serve until `cancel` fires, then drain in-flight requests.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    cancel: CancellationToken,
) -> Result<(), CliniqError> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| CliniqError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await
        .map_err(|e| CliniqError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("gateway stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_state_starts_now() {
        let health = HealthState::new(None);
        assert!(health.start_time.elapsed().as_secs() < 5);
        assert!(health.prometheus_render.is_none());
    }

    #[test]
    fn health_state_renders_metrics() {
        let render: MetricsRender = Arc::new(|| "cliniq_proxy_requests_total 0\n".to_string());
        let health = HealthState::new(Some(render));
        let cloned = health.clone();
        let out = cloned.prometheus_render.as_ref().map(|r| r());
        assert_eq!(out.as_deref(), Some("cliniq_proxy_requests_total 0\n"));
    }

    fn state(dir: &tempfile::TempDir) -> GatewayState {
        use cliniq_config::model::{AuthConfig, StorageConfig, UpstreamConfig};
        use cliniq_storage::SqliteCredentialStore;
        use cliniq_vault::CredentialCipher;
        use secrecy::SecretString;

        let storage = StorageConfig {
            database_path: dir.path().join("srv.db").to_string_lossy().into_owned(),
            ..StorageConfig::default()
        };
        let cipher =
            CredentialCipher::from_operator_secret(&SecretString::from("srv-secret".to_string()))
                .unwrap();
        let service = ProxyService::new(
            Arc::new(SqliteCredentialStore::new(storage.clone())),
            Arc::new(cipher),
            UpstreamConfig::default(),
            &storage,
        )
        .unwrap();
        let auth = crate::JwtAuthenticator::from_config(&AuthConfig {
            jwt_secret: Some("srv-jwt".to_string()),
            ..AuthConfig::default()
        })
        .unwrap();
        GatewayState {
            service,
            auth: Arc::new(auth),
            health: HealthState::new(None),
        }
    }

    #[tokio::test]
    async fn server_stops_when_cancelled() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            ..ServerConfig::default()
        };
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            start_server(&config, state(&dir), cancel),
        )
        .await
        .expect("server should stop promptly");
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn bind_failure_is_reported() {
        let dir = tempfile::TempDir::new().unwrap();
        let taken = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: taken.local_addr().unwrap().port(),
            ..ServerConfig::default()
        };
        let err = start_server(&config, state(&dir), CancellationToken::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("failed to bind"));
    }
}
