// SPDX-FileCopyrightText: 2026 Cliniq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway REST API.
//!
//! Handles `/v1/connection` (POST, GET, DELETE), `POST /v1/proxy`, and the
//! public `/health` and `/metrics` endpoints.

use std::collections::BTreeMap;
use std::str::FromStr;

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use cliniq_core::{
    AuthIdentity, CliniqError, ConnectionStatus, HealthStatus, HttpMethod, ProxyRequest,
};
use cliniq_proxy::ConnectInput;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;
use crate::server::GatewayState;

/// Request body for `POST /v1/connection`.
#[derive(Deserialize)]
pub struct ConnectBody {
    pub base_url: String,
    pub api_key: String,
    #[serde(default)]
    pub workflow_scope: Option<String>,
}

impl std::fmt::Debug for ConnectBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectBody")
            .field("base_url", &self.base_url)
            .field("api_key", &"[redacted]")
            .field("workflow_scope", &self.workflow_scope)
            .finish()
    }
}

/// Request body for `POST /v1/proxy`.
#[derive(Debug, Deserialize)]
pub struct ProxyBody {
    pub endpoint_path: String,
    /// Any case; defaults to GET.
    #[serde(default)]
    pub http_method: Option<String>,
    #[serde(default)]
    pub body: Option<Value>,
    #[serde(default)]
    pub query: BTreeMap<String, String>,
}

/// Response body for `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub storage: String,
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(b)| b)
        .map_err(|e| ApiError(CliniqError::InvalidInput(e.body_text())))
}

/// POST /v1/connection
pub async fn post_connection(
    State(state): State<GatewayState>,
    Extension(identity): Extension<AuthIdentity>,
    body: Result<Json<ConnectBody>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let body = json_body(body)?;
    let input = ConnectInput {
        base_url: body.base_url,
        api_key: SecretString::from(body.api_key),
        workflow_scope: body.workflow_scope,
    };
    state.service.connect(&identity.owner, input).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/connection
pub async fn get_connection(
    State(state): State<GatewayState>,
    Extension(identity): Extension<AuthIdentity>,
) -> Result<Json<ConnectionStatus>, ApiError> {
    Ok(Json(state.service.status(&identity.owner).await?))
}

/// DELETE /v1/connection
pub async fn delete_connection(
    State(state): State<GatewayState>,
    Extension(identity): Extension<AuthIdentity>,
) -> Result<StatusCode, ApiError> {
    state.service.disconnect(&identity.owner).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /v1/proxy
///
/// Relays the upstream JSON body verbatim (including `null` for empty bodies).
pub async fn post_proxy(
    State(state): State<GatewayState>,
    Extension(identity): Extension<AuthIdentity>,
    body: Result<Json<ProxyBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let body = json_body(body)?;
    let method = match body.http_method.as_deref() {
        None => HttpMethod::default(),
        Some(m) => HttpMethod::from_str(m.trim()).map_err(|_| {
            ApiError(CliniqError::InvalidInput(format!(
                "unsupported http_method `{m}`"
            )))
        })?,
    };

    let request = ProxyRequest {
        caller: identity.owner,
        endpoint_path: body.endpoint_path,
        method,
        body: body.body,
        query: body.query,
    };
    Ok(Json(state.service.forward(request).await?))
}

/// GET /health (unauthenticated)
///
/// 503 when the credential store is unhealthy.
pub async fn get_public_health(State(state): State<GatewayState>) -> Response {
    let storage = match state.service.store().health_check().await {
        Ok(status) => status,
        Err(e) => HealthStatus::Unhealthy(e.to_string()),
    };

    let (code, status, storage) = match storage {
        HealthStatus::Healthy => (StatusCode::OK, "ok", "healthy".to_string()),
        HealthStatus::Degraded(reason) => (StatusCode::OK, "degraded", reason),
        HealthStatus::Unhealthy(reason) => {
            tracing::warn!(reason = %reason, "storage health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unhealthy", reason)
        }
    };

    let body = HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.health.start_time.elapsed().as_secs(),
        storage,
    };
    (code, Json(body)).into_response()
}

/// GET /metrics (unauthenticated)
pub async fn get_public_metrics(State(state): State<GatewayState>) -> Response {
    match &state.health.prometheus_render {
        Some(render) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4")],
            render(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "metrics not enabled").into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proxy_body_defaults() {
        let body: ProxyBody = serde_json::from_str(r#"{"endpoint_path": "/workflows"}"#).unwrap();
        assert_eq!(body.endpoint_path, "/workflows");
        assert!(body.http_method.is_none());
        assert!(body.body.is_none());
        assert!(body.query.is_empty());
    }

    #[test]
    fn proxy_body_with_all_fields() {
        let body: ProxyBody = serde_json::from_str(
            r#"{
                "endpoint_path": "/workflows/7",
                "http_method": "patch",
                "body": {"active": false},
                "query": {"dry": "true"}
            }"#,
        )
        .unwrap();
        assert_eq!(body.http_method.as_deref(), Some("patch"));
        assert_eq!(body.query.get("dry").map(String::as_str), Some("true"));
    }

    #[test]
    fn connect_body_debug_hides_key() {
        let body: ConnectBody = serde_json::from_str(
            r#"{"base_url": "https://n8n.example.com", "api_key": "key-123456"}"#,
        )
        .unwrap();
        assert!(body.workflow_scope.is_none());
        assert!(!format!("{body:?}").contains("key-123456"));
    }

    #[test]
    fn health_response_serializes() {
        let resp = HealthResponse {
            status: "ok".to_string(),
            version: "0.1.0".to_string(),
            uptime_secs: 42,
            storage: "healthy".to_string(),
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"status\":\"ok\""));
        assert!(json.contains("\"uptime_secs\":42"));
        assert!(json.contains("\"storage\":\"healthy\""));
    }
}
