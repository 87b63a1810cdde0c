// SPDX-FileCopyrightText: 2026 Cliniq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Secret redaction for log output and relayed upstream error text.
//!
//! Two complementary mechanisms:
//! 1. **Regex-based**: catches known secret shapes (JWT-style API keys,
//!    Bearer tokens, API-key header echoes).
//! 2. **Exact-match**: catches concrete values known at runtime, such as the
//!    decrypted key of the current call or the process secrets.

use std::io::Write;
use std::sync::{Arc, LazyLock, RwLock};

use regex::Regex;

/// Known secret patterns to redact from output.
static REDACTION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // Bearer tokens in headers
        r"Bearer\s+[a-zA-Z0-9._\-]{10,}",
        // JWT-shaped tokens (n8n public API keys are JWTs)
        r"eyJ[a-zA-Z0-9_\-]{8,}\.[a-zA-Z0-9_\-]{8,}\.[a-zA-Z0-9_\-]{8,}",
        // API-key headers echoed back in error bodies
        r#"(?i)(x-[a-z0-9\-]*api-key|api[_\-]?key)("?\s*[:=]\s*"?)[^\s",}]+"#,
        // Generic secret keys: sk-...
        r"sk-[a-zA-Z0-9_\-]{20,}",
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

/// The redaction placeholder.
pub const REDACTED: &str = "[REDACTED]";

/// Redact secrets from a string using regex patterns and exact-match values.
pub fn redact(input: &str, known_values: &[String]) -> String {
    // Exact values first, longest first, so a partial regex hit cannot leave a suffix behind.
    let mut sorted_values: Vec<&String> = known_values.iter().collect();
    sorted_values.sort_by_key(|v| std::cmp::Reverse(v.len()));

    let mut result = input.to_string();
    for value in sorted_values {
        if !value.is_empty() {
            result = result.replace(value.as_str(), REDACTED);
        }
    }

    for pattern in REDACTION_PATTERNS.iter() {
        result = pattern
            .replace_all(&result, |caps: &regex::Captures<'_>| {
                // Keep the header name for the key=value pattern.
                match (caps.get(1), caps.get(2)) {
                    (Some(name), Some(sep)) => format!("{}{}{REDACTED}", name.as_str(), sep.as_str()),
                    _ => REDACTED.to_string(),
                }
            })
            .into_owned();
    }

    result
}

/// Truncate to at most `max_chars` characters, appending an ellipsis when cut.
pub fn truncate_chars(input: &str, max_chars: usize) -> String {
    match input.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}…", &input[..byte_idx]),
        None => input.to_string(),
    }
}

/// Shared list of exact values that [`RedactingWriter`] scrubs.
pub type RedactionList = Arc<RwLock<Vec<String>>>;

/// A writer wrapper that redacts secrets from output.
///
/// Used as the tracing writer so that no log line can carry a configured
/// secret, even one interpolated into an error message.
pub struct RedactingWriter<W> {
    inner: W,
    known_values: RedactionList,
}

impl<W: Write> RedactingWriter<W> {
    pub fn new(inner: W, known_values: RedactionList) -> Self {
        Self {
            inner,
            known_values,
        }
    }

    /// Add a value to the redaction list.
    pub fn add_known_value(known_values: &RedactionList, value: String) {
        if value.is_empty() {
            return;
        }
        if let Ok(mut values) = known_values.write()
            && !values.contains(&value)
        {
            values.push(value);
        }
    }
}

impl<W: Write> Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let input = String::from_utf8_lossy(buf);
        let values = self
            .known_values
            .read()
            .map(|v| v.clone())
            .unwrap_or_default();
        let redacted = redact(&input, &values);
        self.inner.write_all(redacted.as_bytes())?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}
