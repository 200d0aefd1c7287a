// crates/story-spoiler-harness/src/assertions.rs
// ============================================================================
// Module: Assertion Layer
// Description: Status, body substring, and non-empty checks for responses.
// Purpose: Turn mismatches into descriptive errors instead of panics.
// Dependencies: reqwest (StatusCode), serde_json, thiserror
// ============================================================================

//! ## Overview
//! Every check returns `Result<(), AssertionError>`; the error names the
//! expected and actual values so a scenario report is self-explanatory.
//! Response bodies quoted in messages are truncated to [`BODY_PREVIEW_CHARS`].

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Maximum body characters quoted in a failure message.
pub const BODY_PREVIEW_CHARS: usize = 256;

/// Assertion failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssertionError {
    /// Unexpected HTTP status.
    #[error("expected status {expected} but got {actual}; body: {body}")]
    StatusMismatch {
        /// Expected status.
        expected: StatusCode,
        /// Actual status.
        actual: StatusCode,
        /// Body preview.
        body: String,
    },
    /// Body lacks a required substring.
    #[error("expected body to contain {expected:?}; body: {body}")]
    BodyMissingSubstring {
        /// Required substring.
        expected: String,
        /// Body preview.
        body: String,
    },
    /// A captured value was empty.
    #[error("{0}")]
    EmptyValue(String),
    /// Body was not a JSON array.
    #[error("expected body to be a JSON array: {0}")]
    NotJsonArray(String),
    /// Body was an empty JSON array.
    #[error("expected a non-empty JSON array but got []")]
    EmptyArray,
}

/// Checks the response status.
///
/// # Errors
///
/// Returns [`AssertionError::StatusMismatch`] when the statuses differ.
pub fn assert_status(
    actual: StatusCode,
    expected: StatusCode,
    body: &str,
) -> Result<(), AssertionError> {
    if actual == expected {
        return Ok(());
    }
    Err(AssertionError::StatusMismatch {
        expected,
        actual,
        body: preview(body),
    })
}

/// Checks that the body contains a substring.
///
/// # Errors
///
/// Returns [`AssertionError::BodyMissingSubstring`] when it does not.
pub fn assert_body_contains(body: &str, substring: &str) -> Result<(), AssertionError> {
    if body.contains(substring) {
        return Ok(());
    }
    Err(AssertionError::BodyMissingSubstring {
        expected: substring.to_string(),
        body: preview(body),
    })
}

/// Checks that a captured value is not empty.
///
/// # Errors
///
/// Returns [`AssertionError::EmptyValue`] carrying `message`.
pub fn assert_not_empty(value: &str, message: &str) -> Result<(), AssertionError> {
    if value.trim().is_empty() {
        return Err(AssertionError::EmptyValue(message.to_string()));
    }
    Ok(())
}

/// Checks that the body parses as a non-empty JSON array.
///
/// # Errors
///
/// Returns [`AssertionError::NotJsonArray`] or [`AssertionError::EmptyArray`].
pub fn assert_json_array_not_empty(body: &str) -> Result<(), AssertionError> {
    let value: Value =
        serde_json::from_str(body).map_err(|err| AssertionError::NotJsonArray(err.to_string()))?;
    match value {
        Value::Array(items) if items.is_empty() => Err(AssertionError::EmptyArray),
        Value::Array(_) => Ok(()),
        other => Err(AssertionError::NotJsonArray(format!("found {}", json_kind(&other)))),
    }
}

/// Truncates a body for inclusion in messages.
fn preview(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= BODY_PREVIEW_CHARS {
        return format!("{trimmed:?}");
    }
    let head: String = trimmed.chars().take(BODY_PREVIEW_CHARS).collect();
    format!("{head:?}...")
}

/// Names the JSON type of a value.
const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
