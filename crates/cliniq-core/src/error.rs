// SPDX-FileCopyrightText: 2026 Cliniq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error taxonomy for the Cliniq credential vault and proxy.
//!
//! Every failure a caller can observe maps to exactly one [`ErrorKind`], which
//! is the machine-readable value returned alongside the human-readable message.

use std::time::Duration;

use strum::{Display, EnumString, IntoStaticStr};
use thiserror::Error;

/// Machine-readable classification of a [`CliniqError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    ConfigurationError,
    Unauthorized,
    NotConfigured,
    InvalidInput,
    ConnectionTestFailed,
    IntegrityError,
    OutOfScope,
    UpstreamError,
    UpstreamMalformedResponse,
    UpstreamUnreachable,
    Timeout,
    StorageError,
    InternalError,
}

/// The primary error type used across all Cliniq crates.
#[derive(Debug, Error)]
pub enum CliniqError {
    /// Missing or invalid process configuration. Fatal at startup.
    #[error("configuration error: {0}")]
    Config(String),

    /// The caller's identity is missing or could not be verified.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The caller has no stored automation connection.
    #[error("no automation connection is configured for this account")]
    NotConfigured,

    /// The caller submitted a malformed request.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The onboarding liveness probe against the automation API failed.
    #[error("connection test failed: {message}")]
    ConnectionTestFailed {
        status: Option<u16>,
        message: String,
    },

    /// A sealed credential failed authentication (tampering or operator secret mismatch).
    #[error("credential integrity check failed: {0}")]
    Integrity(String),

    /// The request targets a workflow outside the connection's scope.
    #[error("request is outside the connection's workflow scope: {0}")]
    OutOfScope(String),

    /// The automation API answered with a non-success status.
    #[error("upstream returned {status}: {message}")]
    Upstream { status: u16, message: String },

    /// The automation API answered 2xx with a body that is not JSON.
    #[error("upstream response could not be parsed: {0}")]
    UpstreamMalformedResponse(String),

    /// The automation API could not be reached.
    #[error("upstream unreachable: {message}")]
    UpstreamUnreachable {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CliniqError {
    /// Returns the machine-readable kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::ConfigurationError,
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::NotConfigured => ErrorKind::NotConfigured,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::ConnectionTestFailed { .. } => ErrorKind::ConnectionTestFailed,
            Self::Integrity(_) => ErrorKind::IntegrityError,
            Self::OutOfScope(_) => ErrorKind::OutOfScope,
            Self::Upstream { .. } => ErrorKind::UpstreamError,
            Self::UpstreamMalformedResponse(_) => ErrorKind::UpstreamMalformedResponse,
            Self::UpstreamUnreachable { .. } => ErrorKind::UpstreamUnreachable,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Storage { .. } => ErrorKind::StorageError,
            Self::Internal(_) => ErrorKind::InternalError,
        }
    }

    /// HTTP status code a boundary layer should answer with.
    ///
    /// Upstream 4xx/5xx statuses are mirrored; anything else the upstream
    /// returned (e.g. an unfollowed redirect) becomes 502.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidInput(_) | Self::ConnectionTestFailed { .. } => 400,
            Self::Unauthorized(_) => 401,
            Self::OutOfScope(_) => 403,
            Self::NotConfigured => 404,
            Self::Upstream { status, .. } if (400..=599).contains(status) => *status,
            Self::Upstream { .. }
            | Self::UpstreamMalformedResponse(_)
            | Self::UpstreamUnreachable { .. } => 502,
            Self::Timeout { .. } => 504,
            Self::Config(_) | Self::Integrity(_) | Self::Storage { .. } | Self::Internal(_) => 500,
        }
    }

    /// Message that is safe to show to the caller.
    ///
    /// Server-side faults are replaced by generic text; their detail only
    /// goes to the log.
    pub fn public_message(&self) -> String {
        match self {
            Self::Config(_) => "automation service is misconfigured".to_string(),
            Self::Integrity(_) => "stored automation credential could not be decrypted".to_string(),
            Self::Storage { .. } => "credential storage is unavailable".to_string(),
            Self::Internal(_) => "internal error".to_string(),
            Self::UpstreamUnreachable { .. } => "automation service is unreachable".to_string(),
            other => other.to_string(),
        }
    }

    /// Wraps any error as a storage error.
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage {
            source: Box::new(err),
        }
    }
}
