// SPDX-FileCopyrightText: 2026 Cliniq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound HTTP client policy.
//!
//! Provides the hardened reqwest client used for every automation API call
//! and the URL policy check applied to user-supplied base URLs.

use std::sync::Arc;
use std::time::Duration;

use cliniq_config::model::UpstreamConfig;
use cliniq_core::CliniqError;
use tracing::{error, warn};

use crate::ssrf::{SsrfSafeResolver, validate_url_host};

/// Build a reqwest::Client with security defaults.
///
/// - Minimum TLS 1.2 for all connections.
/// - Total and connect timeouts from config.
/// - Redirects are never followed, so the API key header cannot be replayed
///   to another host.
/// - SSRF-safe DNS resolver when `block_private_networks` is on.
pub fn build_secure_client(config: &UpstreamConfig) -> Result<reqwest::Client, CliniqError> {
    let mut builder = reqwest::Client::builder()
        .min_tls_version(reqwest::tls::Version::TLS_1_2)
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .redirect(reqwest::redirect::Policy::none())
        .user_agent(concat!("cliniq/", env!("CARGO_PKG_VERSION")));

    if config.block_private_networks {
        let resolver = SsrfSafeResolver::new(&config.allowed_private_ips);
        builder = builder.dns_resolver(Arc::new(resolver));
    }

    builder.build().map_err(|e| {
        error!("failed to build secure HTTP client: {e}");
        CliniqError::Config(format!("failed to build secure HTTP client: {e}"))
    })
}

/// Validate a user-supplied base URL against the outbound policy.
///
/// - Remote URLs must use HTTPS when `require_tls` is set. Localhost is exempt.
/// - Literal private IPs are rejected when `block_private_networks` is set.
pub fn validate_url(url: &url::Url, config: &UpstreamConfig) -> Result<(), CliniqError> {
    let host = url.host_str().unwrap_or("");

    if config.require_tls && url.scheme() != "https" && !is_localhost(host) {
        warn!(host = %host, "plain HTTP base URL rejected");
        return Err(CliniqError::InvalidInput(
            "base_url must use https:// for remote hosts".to_string(),
        ));
    }

    if config.block_private_networks {
        let resolver = SsrfSafeResolver::new(&config.allowed_private_ips);
        validate_url_host(url, &resolver)?;
    }

    Ok(())
}

/// Check if an address refers to localhost.
pub fn is_localhost(addr: &str) -> bool {
    matches!(addr, "127.0.0.1" | "::1" | "localhost" | "[::1]") || addr.starts_with("127.")
}
