// SPDX-FileCopyrightText: 2026 Cliniq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prometheus recorder installation for the `/metrics` endpoint.

use std::sync::Arc;

use cliniq_core::CliniqError;
use metrics_exporter_prometheus::PrometheusBuilder;

/// Render closure stored in [`crate::HealthState`].
pub type MetricsRender = Arc<dyn Fn() -> String + Send + Sync>;

/// Install the Prometheus recorder globally and register metric descriptions.
///
/// Only one recorder can be installed per process.
pub fn install_recorder() -> Result<MetricsRender, CliniqError> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| CliniqError::Internal(format!("failed to install Prometheus recorder: {e}")))?;

    cliniq_proxy::register_metrics();
    tracing::info!("prometheus metrics recorder installed");

    Ok(Arc::new(move || handle.render()))
}
