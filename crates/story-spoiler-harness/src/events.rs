// crates/story-spoiler-harness/src/events.rs
// ============================================================================
// Module: Harness Event Log
// Description: Structured JSON-lines events for sessions, requests, and scenarios.
// Purpose: Emit redacted run logs without hard dependencies on a logging stack.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Events are plain serializable payloads routed through an [`EventSink`].
//! Sinks write one JSON object per line. Credentials never appear in events:
//! request events carry method, path, status, sizes and latency only.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;
use std::time::Instant;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use crate::client::HttpMethod;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Session lifecycle event payload.
#[derive(Debug, Clone, Serialize)]
pub struct SessionEvent {
    /// Event identifier (`session_opened`, `auth_token_missing`, `session_closed`).
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u64,
    /// Base URL of the API under test.
    pub base_url: String,
    /// Login username when relevant.
    pub username: Option<String>,
    /// Free-form detail (for example the close reason).
    pub detail: Option<String>,
}

/// HTTP request event payload.
#[derive(Debug, Clone, Serialize)]
pub struct RequestEvent {
    /// Event identifier (`request_completed` or `request_failed`).
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u64,
    /// HTTP method.
    pub method: HttpMethod,
    /// Request path relative to the base URL.
    pub path: String,
    /// Response status when a response arrived.
    pub status: Option<u16>,
    /// Response body size in bytes.
    pub response_bytes: usize,
    /// Round-trip latency in milliseconds.
    pub latency_ms: u64,
    /// Transport error when the request failed.
    pub error: Option<String>,
}

/// Scenario outcome event payload.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioEvent {
    /// Event identifier (`scenario_finished`).
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u64,
    /// Declared scenario order.
    pub order: u32,
    /// Scenario name.
    pub name: String,
    /// Outcome label (`passed`, `failed`, `skipped`).
    pub outcome: &'static str,
    /// Failure or skip reason.
    pub reason: Option<String>,
    /// Scenario duration in milliseconds.
    pub duration_ms: u64,
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Destination for harness events.
pub trait EventSink: Send + Sync {
    /// Records a session lifecycle event.
    fn record_session(&self, event: &SessionEvent);

    /// Records a request event.
    fn record_request(&self, _event: &RequestEvent) {}

    /// Records a scenario outcome event.
    fn record_scenario(&self, _event: &ScenarioEvent) {}
}

/// Shared handle to an event sink.
pub type SharedEventSink = Arc<dyn EventSink>;

/// Event sink that logs JSON lines to stderr.
pub struct StderrEventSink;

impl EventSink for StderrEventSink {
    fn record_session(&self, event: &SessionEvent) {
        write_stderr_json(event);
    }

    fn record_request(&self, event: &RequestEvent) {
        write_stderr_json(event);
    }

    fn record_scenario(&self, event: &ScenarioEvent) {
        write_stderr_json(event);
    }
}

/// Event sink that appends JSON lines to a file.
pub struct FileEventSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileEventSink {
    /// Opens the event log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Serializes one event and appends it.
    fn append<T: Serialize>(&self, event: &T) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

impl EventSink for FileEventSink {
    fn record_session(&self, event: &SessionEvent) {
        self.append(event);
    }

    fn record_request(&self, event: &RequestEvent) {
        self.append(event);
    }

    fn record_scenario(&self, event: &ScenarioEvent) {
        self.append(event);
    }
}

/// No-op event sink.
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn record_session(&self, _event: &SessionEvent) {}
}

/// Opens the sink named by a configured destination.
///
/// `None` discards events, `-` writes to stderr, anything else is a file path.
///
/// # Errors
///
/// Returns an error if the log file cannot be opened.
pub fn sink_for_destination(destination: Option<&Path>) -> io::Result<SharedEventSink> {
    match destination {
        None => Ok(Arc::new(NoopEventSink)),
        Some(path) if path.as_os_str() == "-" => Ok(Arc::new(StderrEventSink)),
        Some(path) => Ok(Arc::new(FileEventSink::new(path)?)),
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the current time in milliseconds since the Unix epoch.
pub(crate) fn now_millis() -> u64 {
    duration_millis(SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default())
}

/// Returns the milliseconds elapsed since `started`.
pub(crate) fn elapsed_millis(started: Instant) -> u64 {
    duration_millis(started.elapsed())
}

/// Converts a duration to whole milliseconds, saturating at `u64::MAX`.
fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Writes a serialized event to stderr.
fn write_stderr_json<T: Serialize>(event: &T) {
    if let Ok(payload) = serde_json::to_string(event) {
        let _ = writeln!(std::io::stderr(), "{payload}");
    }
}
