// SPDX-FileCopyrightText: 2026 Cliniq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mapping of [`CliniqError`] onto `{error, kind}` JSON responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use cliniq_core::CliniqError;
use serde::Serialize;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable description, safe to show to the caller.
    pub error: String,
    /// Machine-readable error kind.
    pub kind: String,
}

/// A [`CliniqError`] on its way out of a handler.
#[derive(Debug)]
pub struct ApiError(pub CliniqError);

impl From<CliniqError> for ApiError {
    fn from(err: CliniqError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(kind = %err.kind(), error = %err, "request failed");
        }

        let body = ErrorResponse {
            error: err.public_message(),
            kind: err.kind().to_string(),
        };
        (status, Json(body)).into_response()
    }
}
