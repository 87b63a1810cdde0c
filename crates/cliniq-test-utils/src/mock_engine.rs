// SPDX-FileCopyrightText: 2026 Cliniq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A mock workflow-automation engine backed by wiremock.
//!
//! Serves its API under `/api/v1` and only answers requests that carry the
//! expected API key; everything else gets 401 like the real engine.

use serde_json::{Value, json};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Header the mock engine authenticates on.
pub const API_KEY_HEADER: &str = "X-N8N-API-KEY";

/// API root relative to the server origin.
pub const API_ROOT: &str = "/api/v1";

pub struct MockEngine {
    server: MockServer,
    api_key: String,
}

impl MockEngine {
    /// Start a mock engine that accepts `api_key`.
    ///
    /// Mounts the onboarding probe route and a catch-all 401 for wrong keys.
    pub async fn start(api_key: &str) -> Self {
        let server = MockServer::start().await;
        let engine = Self {
            server,
            api_key: api_key.to_string(),
        };

        // Default listing for the onboarding probe; tests can shadow it
        // through `mount_json`, which mounts at a higher priority.
        Mock::given(method("GET"))
            .and(path(format!("{API_ROOT}/workflows")))
            .and(header(API_KEY_HEADER, engine.api_key.as_str()))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"data": [], "nextCursor": null})),
            )
            .with_priority(5)
            .mount(&engine.server)
            .await;

        // Lowest priority, so it only catches bad keys and unknown routes.
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"message": "unauthorized"})),
            )
            .with_priority(10)
            .mount(&engine.server)
            .await;

        engine
    }

    /// Base URL an owner would paste into onboarding.
    pub fn base_url(&self) -> String {
        format!("{}{API_ROOT}", self.server.uri())
    }

    /// Answer `verb {API_ROOT}{route}` with `status` and a JSON body when the
    /// API key matches.
    pub async fn mount_json(&self, verb: &str, route: &str, status: u16, body: Value) {
        Mock::given(method(verb))
            .and(path(format!("{API_ROOT}{route}")))
            .and(header(API_KEY_HEADER, self.api_key.as_str()))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .with_priority(1)
            .mount(&self.server)
            .await;
    }

    /// Answer with a raw, non-JSON body.
    pub async fn mount_raw(&self, verb: &str, route: &str, status: u16, body: &str) {
        Mock::given(method(verb))
            .and(path(format!("{API_ROOT}{route}")))
            .and(header(API_KEY_HEADER, self.api_key.as_str()))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .with_priority(1)
            .mount(&self.server)
            .await;
    }

    /// Every request the engine has seen so far.
    pub async fn received(&self) -> Vec<wiremock::Request> {
        self.server.received_requests().await.unwrap_or_default()
    }
}
