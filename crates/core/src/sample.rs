//! Sample payload formatting.
//!
//! Samples are illustrative JSON snippets. A sample that does not parse is
//! rendered as the empty string instead of failing the caller.

use serde_json::Value;
use tracing::debug;

use crate::field::PLACEHOLDER;

fn parse(sample: &str) -> Option<Value> {
    let trimmed = sample.trim();
    if trimmed.is_empty() || trimmed == PLACEHOLDER {
        return None;
    }
    match serde_json::from_str(trimmed) {
        Ok(v) => Some(v),
        Err(e) => {
            debug!(error = %e, "malformed sample ignored");
            None
        }
    }
}

/// Re-serialize with two-space indentation.
pub fn pretty(sample: &str) -> String {
    parse(sample)
        .and_then(|v| serde_json::to_string_pretty(&v).ok())
        .unwrap_or_default()
}

/// Re-serialize on a single line.
pub fn compact(sample: &str) -> String {
    parse(sample)
        .and_then(|v| serde_json::to_string(&v).ok())
        .unwrap_or_default()
}

/// Parsed sample value, or `None` for placeholders and malformed input.
pub fn value(sample: &str) -> Option<Value> {
    parse(sample)
}
