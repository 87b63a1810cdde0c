// SPDX-FileCopyrightText: 2026 Cliniq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Caller authentication for the `/v1` routes.
//!
//! Callers present `Authorization: Bearer <session token>`. The token is an
//! HS256 JWT issued elsewhere; its `sub` claim becomes the [`OwnerId`].
//! Missing, malformed, expired, or wrongly signed tokens are rejected
//! (fail-closed).

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use cliniq_config::model::AuthConfig;
use cliniq_core::{
    AdapterType, AuthAdapter, AuthIdentity, AuthToken, CliniqError, HealthStatus, OwnerId,
    PluginAdapter,
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::Deserialize;

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
struct SessionClaims {
    sub: String,
}

/// Verifies HS256 session tokens.
pub struct JwtAuthenticator {
    key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtAuthenticator")
            .field("key", &"[redacted]")
            .field("audience", &self.validation.aud)
            .field("issuer", &self.validation.iss)
            .finish()
    }
}

impl JwtAuthenticator {
    /// Build from the `[auth]` config section. A missing secret is a config error.
    pub fn from_config(config: &AuthConfig) -> Result<Self, CliniqError> {
        let secret = config
            .jwt_secret
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| CliniqError::Config("auth.jwt_secret is not set".to_string()))?;

        let mut validation = Validation::new(Algorithm::HS256);
        match &config.jwt_audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }
        if let Some(iss) = &config.jwt_issuer {
            validation.set_issuer(&[iss]);
        }

        Ok(Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }
}

#[async_trait]
impl PluginAdapter for JwtAuthenticator {
    fn name(&self) -> &str {
        "jwt-hs256"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Auth
    }

    async fn health_check(&self) -> Result<HealthStatus, CliniqError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), CliniqError> {
        Ok(())
    }
}

#[async_trait]
impl AuthAdapter for JwtAuthenticator {
    async fn authenticate(&self, token: AuthToken) -> Result<AuthIdentity, CliniqError> {
        let data = decode::<SessionClaims>(&token.0, &self.key, &self.validation)
            .map_err(|e| CliniqError::Unauthorized(format!("invalid session token: {e}")))?;

        let sub = data.claims.sub.trim();
        if sub.is_empty() {
            return Err(CliniqError::Unauthorized(
                "session token has an empty subject".to_string(),
            ));
        }
        Ok(AuthIdentity {
            owner: OwnerId(sub.to_string()),
        })
    }
}

/// Middleware that authenticates the bearer token and attaches the
/// [`AuthIdentity`] to the request extensions.
pub async fn auth_middleware(
    State(auth): State<Arc<dyn AuthAdapter>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let Some(token) = token else {
        return ApiError(CliniqError::Unauthorized(
            "missing bearer token".to_string(),
        ))
        .into_response();
    };

    match auth.authenticate(AuthToken(token.to_string())).await {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(e) => {
            tracing::debug!(error = %e, "session token rejected");
            ApiError(e).into_response()
        }
    }
}
