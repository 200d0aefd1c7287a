// crates/story-spoiler-harness/src/secret.rs
// ============================================================================
// Module: Secret Values
// Description: Redacting wrapper for passwords and bearer tokens.
// Purpose: Keep credentials out of Debug output, events, and reports.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! [`Secret`] holds the login password and the bearer token. Its `Debug`
//! output is always redacted, and the raw value is only readable through
//! [`Secret::expose`], so credentials never reach events or reports by
//! formatting alone.

use std::fmt;

use serde::Deserialize;

/// Credential string whose `Debug` output is redacted.
///
/// # Invariants
/// - The raw value is only reachable through [`Secret::expose`].
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    /// Wraps a credential value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the raw credential value.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns true when the credential is empty or whitespace.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("Secret(<empty>)")
        } else {
            f.write_str("Secret(<redacted>)")
        }
    }
}
