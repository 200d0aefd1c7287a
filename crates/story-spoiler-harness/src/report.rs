// crates/story-spoiler-harness/src/report.rs
// ============================================================================
// Module: Run Report
// Description: Per-scenario outcomes and on-disk run summaries.
// Purpose: Report each scenario independently and persist a run summary.
// Dependencies: serde, serde_jcs, thiserror
// ============================================================================

//! ## Overview
//! A [`SuiteReport`] lists every scenario in declared order with its outcome.
//! [`ReportWriter`] persists it as canonical JSON (`summary.json`) and
//! Markdown (`summary.md`) under a run root.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::client::HttpMethod;
use crate::events::now_millis;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Outcome of one scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScenarioOutcome {
    /// Every expectation held.
    Passed,
    /// A request or expectation failed.
    Failed {
        /// Failure description.
        reason: String,
    },
    /// Not executed because a precondition was not met.
    Skipped {
        /// Skip description.
        reason: String,
    },
}

impl ScenarioOutcome {
    /// Returns a stable label for the outcome.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed {
                ..
            } => "failed",
            Self::Skipped {
                ..
            } => "skipped",
        }
    }

    /// Returns the failure or skip reason.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Passed => None,
            Self::Failed {
                reason,
            }
            | Self::Skipped {
                reason,
            } => Some(reason),
        }
    }

    /// Returns true for [`ScenarioOutcome::Passed`].
    #[must_use]
    pub const fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }
}

/// Result of one scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioReport {
    /// Declared order.
    pub order: u32,
    /// Scenario name.
    pub name: String,
    /// HTTP method.
    pub method: HttpMethod,
    /// Resolved path, or the template when resolution failed.
    pub path: String,
    /// Response status when a response arrived.
    pub http_status: Option<u16>,
    /// Outcome.
    pub outcome: ScenarioOutcome,
    /// Duration in milliseconds.
    pub duration_ms: u64,
}

/// Result of a suite run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuiteReport {
    /// Base URL of the API under test.
    pub base_url: String,
    /// Run start (milliseconds since epoch).
    pub started_at_ms: u64,
    /// Run end (milliseconds since epoch).
    pub ended_at_ms: u64,
    /// Scenario results in declared order.
    pub scenarios: Vec<ScenarioReport>,
}

impl SuiteReport {
    /// Starts an empty report.
    #[must_use]
    pub fn start(base_url: impl Into<String>) -> Self {
        let now = now_millis();
        Self {
            base_url: base_url.into(),
            started_at_ms: now,
            ended_at_ms: now,
            scenarios: Vec::new(),
        }
    }

    /// Stamps the end time.
    pub fn finish(&mut self) {
        self.ended_at_ms = now_millis();
    }

    /// Number of passed scenarios.
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.count("passed")
    }

    /// Number of failed scenarios.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.count("failed")
    }

    /// Number of skipped scenarios.
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.count("skipped")
    }

    /// True when every scenario passed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.scenarios.iter().all(|scenario| scenario.outcome.is_passed())
    }

    /// Looks up a scenario result by order.
    #[must_use]
    pub fn scenario(&self, order: u32) -> Option<&ScenarioReport> {
        self.scenarios.iter().find(|scenario| scenario.order == order)
    }

    /// Counts scenarios with the given outcome label.
    fn count(&self, label: &str) -> usize {
        self.scenarios.iter().filter(|scenario| scenario.outcome.label() == label).count()
    }
}

// ============================================================================
// SECTION: Writer
// ============================================================================

/// Report persistence errors.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Filesystem failure.
    #[error("report io error: {0}")]
    Io(String),
    /// Serialization failure.
    #[error("report serialization error: {0}")]
    Json(String),
}

/// Writes run summaries under a run root.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    /// Directory receiving the summaries.
    root: PathBuf,
}

impl ReportWriter {
    /// Creates the run root (a timestamped default when `None`).
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Io`] when the directory cannot be created.
    pub fn new(root: Option<PathBuf>) -> Result<Self, ReportError> {
        let root = root.unwrap_or_else(default_run_root);
        fs::create_dir_all(&root)
            .map_err(|err| ReportError::Io(format!("{}: {err}", root.display())))?;
        Ok(Self {
            root,
        })
    }

    /// Returns the run root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes `summary.json` and `summary.md`, returning their paths.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError`] when serialization or writing fails.
    pub fn write(&self, report: &SuiteReport) -> Result<Vec<PathBuf>, ReportError> {
        let json_path = self.root.join("summary.json");
        let bytes = serde_jcs::to_vec(report).map_err(|err| ReportError::Json(err.to_string()))?;
        fs::write(&json_path, bytes).map_err(|err| ReportError::Io(err.to_string()))?;
        let md_path = self.root.join("summary.md");
        fs::write(&md_path, summary_markdown(report))
            .map_err(|err| ReportError::Io(err.to_string()))?;
        Ok(vec![json_path, md_path])
    }
}

/// Renders a report as Markdown.
#[must_use]
pub fn summary_markdown(report: &SuiteReport) -> String {
    let mut out = String::new();
    out.push_str("# Story Spoiler Suite Summary\n\n");
    out.push_str("## Status\n\n");
    let _ = writeln!(out, "- Base URL: {}", report.base_url);
    let _ = writeln!(out, "- Result: {}", if report.passed() { "passed" } else { "failed" });
    let _ = writeln!(
        out,
        "- Passed: {} / Failed: {} / Skipped: {}",
        report.passed_count(),
        report.failed_count(),
        report.skipped_count()
    );
    let _ = writeln!(
        out,
        "- Duration (ms): {}",
        report.ended_at_ms.saturating_sub(report.started_at_ms)
    );
    out.push_str("\n## Scenarios\n\n");
    if report.scenarios.is_empty() {
        out.push_str("- None\n");
    }
    for scenario in &report.scenarios {
        let _ = write!(
            out,
            "- {}. {} `{} {}`: {}",
            scenario.order,
            scenario.name,
            scenario.method,
            scenario.path,
            scenario.outcome.label()
        );
        if let Some(reason) = scenario.outcome.reason() {
            let _ = write!(out, " ({reason})");
        }
        out.push('\n');
    }
    out
}

/// Default run root under `target/`.
fn default_run_root() -> PathBuf {
    PathBuf::from("target/story-spoiler").join(format!("run_{}", now_millis()))
}
