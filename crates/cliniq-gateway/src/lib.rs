// SPDX-FileCopyrightText: 2026 Cliniq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Cliniq credential proxy.
//!
//! Exposes onboarding (`/v1/connection`) and the authenticated proxy
//! (`/v1/proxy`) over axum, plus public health and metrics endpoints.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod prometheus;
pub mod server;

pub use auth::JwtAuthenticator;
pub use error::{ApiError, ErrorResponse};
pub use prometheus::{MetricsRender, install_recorder};
pub use server::{GatewayState, HealthState, build_router, start_server};
