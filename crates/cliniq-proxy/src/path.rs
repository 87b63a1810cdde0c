// SPDX-FileCopyrightText: 2026 Cliniq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Endpoint path policy.
//!
//! A proxied path is always relative to the owner's stored base URL. These
//! checks keep a caller from steering the API key to another host or outside
//! the API root, and from touching workflows outside the connection scope.

use std::collections::BTreeMap;

use cliniq_core::CliniqError;
use percent_encoding::percent_decode_str;
use url::Url;

/// Segment that addresses individual workflows, e.g. `/workflows/{id}/activate`.
const WORKFLOWS_SEGMENT: &str = "workflows";

/// Query parameter some list endpoints use to filter by workflow.
const WORKFLOW_ID_PARAM: &str = "workflowId";

/// Structural checks on a caller-supplied endpoint path.
pub fn validate_endpoint_path(path: &str) -> Result<(), CliniqError> {
    let invalid = |reason: &str| Err(CliniqError::InvalidInput(format!("endpoint_path {reason}")));

    if !path.starts_with('/') {
        return invalid("must start with '/'");
    }
    if path.starts_with("//") {
        return invalid("must not start with '//'");
    }
    if path.contains("://") {
        return invalid("must not contain a scheme");
    }
    if path.contains('#') {
        return invalid("must not contain a fragment");
    }
    if path.contains('\\') || path.chars().any(|c| c.is_control() || c.is_whitespace()) {
        return invalid("contains forbidden characters");
    }

    let route = path.split('?').next().unwrap_or(path);
    let segments: Vec<&str> = route[1..].split('/').collect();
    if segments.iter().any(|s| is_dot_segment(s)) {
        return invalid("must not contain '.' or '..' segments");
    }
    // Only a single trailing slash may leave a segment empty.
    if segments[..segments.len() - 1].iter().any(|s| s.is_empty()) {
        return invalid("must not contain empty segments");
    }

    Ok(())
}

/// `.` and `..`, including percent-encoded spellings.
fn is_dot_segment(segment: &str) -> bool {
    let decoded = decode(segment);
    decoded == "." || decoded == ".."
}

fn decode(segment: &str) -> String {
    percent_decode_str(segment).decode_utf8_lossy().into_owned()
}

/// Join `path` onto `base_url` and confirm the result stays under the base.
pub fn join_endpoint(base_url: &str, path: &str) -> Result<Url, CliniqError> {
    let base = Url::parse(base_url)
        .map_err(|e| CliniqError::Internal(format!("stored base_url is invalid: {e}")))?;
    let joined = Url::parse(&format!("{}{path}", base_url.trim_end_matches('/')))
        .map_err(|e| CliniqError::InvalidInput(format!("endpoint_path does not form a URL: {e}")))?;

    let same_origin = joined.scheme() == base.scheme()
        && joined.host_str() == base.host_str()
        && joined.port_or_known_default() == base.port_or_known_default()
        && joined.username().is_empty()
        && joined.password().is_none();
    let base_path = base.path().trim_end_matches('/');
    if !same_origin || !joined.path().starts_with(base_path) {
        return Err(CliniqError::InvalidInput(
            "endpoint_path escapes the connection's base URL".to_string(),
        ));
    }

    Ok(joined)
}

/// Parse a stored scope string into workflow ids. Blank entries are dropped.
pub fn scope_ids(scope: &str) -> Vec<&str> {
    scope
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .collect()
}

/// Reject requests that address a specific workflow outside `scope`.
///
/// Runs on the joined URL that will actually be sent, so a `workflowId`
/// written into the endpoint path is seen as well as one in `query`.
/// Segment and parameter names match case-insensitively after
/// percent-decoding. `None` means the connection is unrestricted. Collection
/// routes such as `/workflows` stay reachable; the automation API filters
/// them server-side.
pub fn check_scope(
    base_url: &str,
    url: &Url,
    query: &BTreeMap<String, String>,
    scope: Option<&str>,
) -> Result<(), CliniqError> {
    let Some(scope) = scope else {
        return Ok(());
    };
    let allowed = scope_ids(scope);
    let check = |id: &str| {
        if allowed.contains(&id) {
            Ok(())
        } else {
            Err(CliniqError::OutOfScope(format!("workflow {id}")))
        }
    };

    let base = Url::parse(base_url)
        .map_err(|e| CliniqError::Internal(format!("stored base_url is invalid: {e}")))?;
    let relative = url
        .path()
        .strip_prefix(base.path().trim_end_matches('/'))
        .ok_or_else(|| {
            CliniqError::InvalidInput("endpoint_path escapes the connection's base URL".to_string())
        })?;

    let segments: Vec<String> = relative
        .split('/')
        .filter(|s| !s.is_empty())
        .map(decode)
        .collect();
    for pair in segments.windows(2) {
        if pair[0].eq_ignore_ascii_case(WORKFLOWS_SEGMENT) {
            check(&pair[1])?;
        }
    }

    let embedded = url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned()));
    let supplied = query.iter().map(|(k, v)| (k.clone(), v.clone()));
    for (key, value) in embedded.chain(supplied) {
        if key.eq_ignore_ascii_case(WORKFLOW_ID_PARAM) {
            check(&value)?;
        }
    }

    Ok(())
}
