// SPDX-FileCopyrightText: 2026 Cliniq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade; the gateway installs the Prometheus recorder.

use cliniq_core::CliniqError;
use metrics::describe_counter;

pub const PROXY_REQUESTS: &str = "cliniq_proxy_requests_total";
pub const INTEGRITY_FAILURES: &str = "cliniq_vault_integrity_failures_total";
pub const ONBOARDING_ATTEMPTS: &str = "cliniq_onboarding_total";

/// Register metric descriptions. Called once after the recorder is installed.
pub fn register_metrics() {
    describe_counter!(PROXY_REQUESTS, "Proxied automation calls by outcome");
    describe_counter!(
        INTEGRITY_FAILURES,
        "Stored credentials that failed to decrypt"
    );
    describe_counter!(ONBOARDING_ATTEMPTS, "Connection onboarding attempts by outcome");
}

fn outcome<T>(result: &Result<T, CliniqError>) -> &'static str {
    match result {
        Ok(_) => "success",
        Err(e) => e.kind().into(),
    }
}

pub(crate) fn record_proxy<T>(result: &Result<T, CliniqError>) {
    metrics::counter!(PROXY_REQUESTS, "outcome" => outcome(result)).increment(1);
}

pub(crate) fn record_onboarding<T>(result: &Result<T, CliniqError>) {
    metrics::counter!(ONBOARDING_ATTEMPTS, "outcome" => outcome(result)).increment(1);
}

pub(crate) fn record_integrity_failure() {
    metrics::counter!(INTEGRITY_FAILURES).increment(1);
}
