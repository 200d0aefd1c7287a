// crates/story-spoiler-harness/src/scenario.rs
// ============================================================================
// Module: Scenario Model
// Description: Scenario descriptors, path templates, and the shared suite context.
// Purpose: Describe ordered API test cases declaratively.
// Dependencies: reqwest (StatusCode), serde_json
// ============================================================================

//! ## Overview
//! A [`Scenario`] is a request plus the expectations on its response. Path
//! templates may embed a value captured into the [`SuiteContext`] by an
//! earlier scenario; resolving such a template before the value exists is a
//! [`PreconditionError`], never an empty path segment.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

use crate::client::HttpMethod;

// ============================================================================
// SECTION: Suite Context
// ============================================================================

/// Keys for values shared between scenarios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ContextKey {
    /// Identifier returned by the create-story call.
    CreatedStoryId,
}

impl ContextKey {
    /// Returns a stable label for the key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreatedStoryId => "created_story_id",
        }
    }
}

/// Mutable state shared across one suite run.
///
/// # Invariants
/// - Values are written only by scenarios declaring a [`Capture`].
/// - Stored values are never empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuiteContext {
    /// Captured values by key.
    values: BTreeMap<ContextKey, String>,
}

impl SuiteContext {
    /// Returns a captured value.
    #[must_use]
    pub fn get(&self, key: ContextKey) -> Option<&str> {
        self.values.get(&key).map(String::as_str)
    }

    /// Returns the identifier of the story created in this run.
    #[must_use]
    pub fn created_story_id(&self) -> Option<&str> {
        self.get(ContextKey::CreatedStoryId)
    }

    /// Stores a captured value; blank values are ignored.
    pub fn set(&mut self, key: ContextKey, value: impl Into<String>) {
        let value = value.into();
        if !value.trim().is_empty() {
            self.values.insert(key, value);
        }
    }
}

// ============================================================================
// SECTION: Path Templates
// ============================================================================

/// Value substituted into the final path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathParam {
    /// Value captured into the suite context.
    Context(ContextKey),
    /// Fixed literal value.
    Literal(String),
}

/// A request path, optionally followed by one parameter segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    /// Fixed path prefix.
    base: String,
    /// Optional trailing parameter.
    param: Option<PathParam>,
}

/// Raised when a path needs a context value that has not been captured.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("precondition not met: {} is not set", .key.as_str())]
pub struct PreconditionError {
    /// Missing key.
    pub key: ContextKey,
}

impl PathTemplate {
    /// Fixed path with no parameter.
    #[must_use]
    pub fn fixed(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            param: None,
        }
    }

    /// Path followed by a context value.
    #[must_use]
    pub fn with_context(base: impl Into<String>, key: ContextKey) -> Self {
        Self {
            base: base.into(),
            param: Some(PathParam::Context(key)),
        }
    }

    /// Path followed by a literal value.
    #[must_use]
    pub fn with_literal(base: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            param: Some(PathParam::Literal(value.into())),
        }
    }

    /// Returns the trailing parameter, if any.
    #[must_use]
    pub const fn param(&self) -> Option<&PathParam> {
        self.param.as_ref()
    }

    /// Resolves the template against the suite context.
    ///
    /// # Errors
    ///
    /// Returns [`PreconditionError`] when a context value is missing.
    pub fn resolve(&self, context: &SuiteContext) -> Result<String, PreconditionError> {
        let base = self.base.trim_end_matches('/');
        match &self.param {
            None => Ok(self.base.clone()),
            Some(PathParam::Literal(value)) => Ok(format!("{base}/{value}")),
            Some(PathParam::Context(key)) => context
                .get(*key)
                .map(|value| format!("{base}/{value}"))
                .ok_or(PreconditionError {
                    key: *key,
                }),
        }
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let base = self.base.trim_end_matches('/');
        match &self.param {
            None => f.write_str(&self.base),
            Some(PathParam::Literal(value)) => write!(f, "{base}/{value}"),
            Some(PathParam::Context(key)) => write!(f, "{base}/{{{}}}", key.as_str()),
        }
    }
}

// ============================================================================
// SECTION: Scenarios
// ============================================================================

/// A check on the scenario's response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expectation {
    /// Exact status code.
    Status(StatusCode),
    /// Body contains a substring.
    BodyContains(String),
    /// Body parses as a non-empty JSON array.
    JsonArrayNotEmpty,
}

/// Captures a JSON string field from the response into the suite context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    /// Top-level JSON field to read.
    pub field: String,
    /// Context key receiving the value.
    pub into: ContextKey,
    /// Failure message when the value is missing or empty.
    pub empty_message: String,
}

/// One ordered API test case.
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    /// Declared position in the suite (1-based).
    pub order: u32,
    /// Unique scenario name.
    pub name: String,
    /// HTTP method.
    pub method: HttpMethod,
    /// Request path.
    pub path: PathTemplate,
    /// Optional JSON request body.
    pub payload: Option<Value>,
    /// Checks applied to the response.
    pub expectations: Vec<Expectation>,
    /// Optional value capture.
    pub capture: Option<Capture>,
    /// Orders of scenarios that must pass first.
    pub depends_on: Vec<u32>,
}

impl Scenario {
    /// Creates a scenario with no payload, expectations, or dependencies.
    #[must_use]
    pub fn new(order: u32, name: impl Into<String>, method: HttpMethod, path: PathTemplate) -> Self {
        Self {
            order,
            name: name.into(),
            method,
            path,
            payload: None,
            expectations: Vec::new(),
            capture: None,
            depends_on: Vec::new(),
        }
    }

    /// Sets the JSON request body.
    #[must_use]
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Expects an exact status code.
    #[must_use]
    pub fn expect_status(mut self, status: StatusCode) -> Self {
        self.expectations.push(Expectation::Status(status));
        self
    }

    /// Expects the body to contain a substring.
    #[must_use]
    pub fn expect_body_contains(mut self, substring: impl Into<String>) -> Self {
        self.expectations.push(Expectation::BodyContains(substring.into()));
        self
    }

    /// Expects the body to be a non-empty JSON array.
    #[must_use]
    pub fn expect_json_array_not_empty(mut self) -> Self {
        self.expectations.push(Expectation::JsonArrayNotEmpty);
        self
    }

    /// Captures a non-empty JSON string field into the context.
    #[must_use]
    pub fn capture(
        mut self,
        field: impl Into<String>,
        into: ContextKey,
        empty_message: impl Into<String>,
    ) -> Self {
        self.capture = Some(Capture {
            field: field.into(),
            into,
            empty_message: empty_message.into(),
        });
        self
    }

    /// Requires another scenario to pass first.
    #[must_use]
    pub fn depends_on(mut self, order: u32) -> Self {
        self.depends_on.push(order);
        self
    }
}
