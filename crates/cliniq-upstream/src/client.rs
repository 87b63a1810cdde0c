// SPDX-FileCopyrightText: 2026 Cliniq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the workflow-automation API.
//!
//! The API key travels only in the configured header, marked sensitive. It is
//! scrubbed from any upstream text before that text is logged or relayed.

use std::time::{Duration, Instant};

use cliniq_config::model::UpstreamConfig;
use cliniq_core::{CliniqError, HttpMethod, ProxyRequest};
use cliniq_security::{build_secure_client, redact, truncate_chars};
use reqwest::header::{HeaderName, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, warn};

/// HTTP client for automation API communication.
///
/// One instance is shared by all requests; it holds no per-caller state.
#[derive(Debug, Clone)]
pub struct AutomationClient {
    client: reqwest::Client,
    api_key_header: HeaderName,
    probe_path: String,
    timeout: Duration,
    max_error_body_chars: usize,
}

impl AutomationClient {
    /// Build the client from the `[upstream]` config section.
    pub fn new(config: &UpstreamConfig) -> Result<Self, CliniqError> {
        let api_key_header = HeaderName::from_bytes(config.api_key_header.as_bytes())
            .map_err(|e| CliniqError::Config(format!("invalid upstream.api_key_header: {e}")))?;

        Ok(Self {
            client: build_secure_client(config)?,
            api_key_header,
            probe_path: config.probe_path.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            max_error_body_chars: config.max_error_body_chars,
        })
    }

    /// Check that `api_key` is accepted by the automation API at `base_url`.
    ///
    /// Any failure (non-2xx, network error, timeout, non-JSON body) becomes
    /// [`CliniqError::ConnectionTestFailed`].
    pub async fn probe(&self, base_url: &str, api_key: &SecretString) -> Result<(), CliniqError> {
        let raw = format!("{}{}", base_url.trim_end_matches('/'), self.probe_path);
        let url = url::Url::parse(&raw).map_err(|e| CliniqError::ConnectionTestFailed {
            status: None,
            message: format!("probe URL is invalid: {e}"),
        })?;

        let key = self
            .key_header_value(api_key)
            .map_err(|message| CliniqError::ConnectionTestFailed {
                status: None,
                message,
            })?;

        let request = self.client.get(url).header(&self.api_key_header, key);
        match self.execute(request, api_key).await {
            Ok(_) => Ok(()),
            Err(err) => Err(probe_failure(err)),
        }
    }

    /// Forward one proxied call to `url` and return the parsed response body.
    ///
    /// `url` is the fully joined target; path validation happens before this.
    pub async fn forward(
        &self,
        url: url::Url,
        request: &ProxyRequest,
        api_key: &SecretString,
    ) -> Result<Value, CliniqError> {
        let key = self.key_header_value(api_key).map_err(CliniqError::Internal)?;

        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), url)
            .header(&self.api_key_header, key);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        self.execute(builder, api_key).await
    }

    fn key_header_value(&self, api_key: &SecretString) -> Result<HeaderValue, String> {
        let mut value = HeaderValue::from_str(api_key.expose_secret())
            .map_err(|_| "API key contains characters not allowed in an HTTP header".to_string())?;
        value.set_sensitive(true);
        Ok(value)
    }

    /// Send, then classify the response. No retries.
    async fn execute(
        &self,
        builder: reqwest::RequestBuilder,
        api_key: &SecretString,
    ) -> Result<Value, CliniqError> {
        let started = Instant::now();
        let response = builder.send().await.map_err(|e| self.transport_error(e))?;

        let status = response.status();
        debug!(
            status = status.as_u16(),
            host = response.url().host_str().unwrap_or(""),
            path = response.url().path(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "upstream responded"
        );

        let body = response.bytes().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            let message = self.error_message(status, &body, api_key);
            warn!(status = status.as_u16(), "upstream returned error status");
            return Err(CliniqError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }

        serde_json::from_slice(&body).map_err(|e| {
            CliniqError::UpstreamMalformedResponse(format!("response body is not JSON: {e}"))
        })
    }

    fn transport_error(&self, e: reqwest::Error) -> CliniqError {
        if e.is_timeout() {
            return CliniqError::Timeout {
                duration: self.timeout,
            };
        }
        let e = e.without_url();
        CliniqError::UpstreamUnreachable {
            message: e.to_string(),
            source: Some(Box::new(e)),
        }
    }

    /// Prefer the upstream's `message` field, else the raw body; always
    /// redacted and truncated.
    fn error_message(
        &self,
        status: reqwest::StatusCode,
        body: &[u8],
        api_key: &SecretString,
    ) -> String {
        let text = String::from_utf8_lossy(body);
        let extracted = serde_json::from_str::<Value>(&text)
            .ok()
            .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_else(|| text.trim().to_string());

        let message = if extracted.is_empty() {
            status
                .canonical_reason()
                .unwrap_or("upstream error")
                .to_string()
        } else {
            extracted
        };

        let redacted = redact(&message, &[api_key.expose_secret().to_string()]);
        truncate_chars(&redacted, self.max_error_body_chars)
    }
}

fn to_reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Delete => reqwest::Method::DELETE,
    }
}

fn probe_failure(err: CliniqError) -> CliniqError {
    let (status, message) = match err {
        CliniqError::Upstream { status, message } if status == 401 || status == 403 => (
            Some(status),
            format!("the automation service rejected the API key ({message})"),
        ),
        CliniqError::Upstream { status, message } => (
            Some(status),
            format!("the automation service returned {status}: {message}"),
        ),
        CliniqError::Timeout { duration } => (
            None,
            format!("the automation service did not respond within {duration:?}"),
        ),
        CliniqError::UpstreamUnreachable { message, .. } => (
            None,
            format!("could not reach the automation service: {message}"),
        ),
        CliniqError::UpstreamMalformedResponse(_) => (
            None,
            "the endpoint did not return JSON; check that base_url points at the API root"
                .to_string(),
        ),
        other => (None, other.to_string()),
    };
    CliniqError::ConnectionTestFailed { status, message }
}
