// crates/story-spoiler-harness/src/suite.rs
// ============================================================================
// Module: Story Suite Driver
// Description: End-to-end suite run from configuration to written report.
// Purpose: Give front-ends one call that validates, runs, and persists a suite.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! [`run_suite`] performs every setup step before the first scenario request:
//! plan selection, event sink, run root, and login. Any setup failure is a
//! [`HarnessError`] and no scenario runs. Once scenarios start, failures are
//! only ever recorded in the [`SuiteReport`].

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::config::HarnessConfig;
use crate::events::sink_for_destination;
use crate::report::ReportError;
use crate::report::ReportWriter;
use crate::report::SuiteReport;
use crate::runner::PlanError;
use crate::runner::ScenarioRunner;
use crate::session::Session;
use crate::session::SessionError;
use crate::story::story_plan;

/// Setup-level errors that abort a suite run.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Configuration failed to load or validate.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Login or client setup failed.
    #[error(transparent)]
    Session(#[from] SessionError),
    /// The plan or the scenario selection is invalid.
    #[error("invalid scenario plan: {0}")]
    Plan(#[from] PlanError),
    /// The run report could not be written.
    #[error(transparent)]
    Report(#[from] ReportError),
    /// The event log could not be opened.
    #[error("event log unavailable: {0}")]
    EventLog(String),
}

/// Completed suite run.
#[derive(Debug, Clone)]
pub struct SuiteRun {
    /// Per-scenario results.
    pub report: SuiteReport,
    /// Written summary files.
    pub artifacts: Vec<PathBuf>,
}

/// Runs the story suite (or the selected orders) and writes the report.
///
/// An empty `selection` runs every scenario.
///
/// # Errors
///
/// Returns [`HarnessError`] when setup fails or the report cannot be written.
pub async fn run_suite(config: &HarnessConfig, selection: &[u32]) -> Result<SuiteRun, HarnessError> {
    let mut plan = story_plan()?;
    if !selection.is_empty() {
        plan = plan.select(selection)?;
    }
    let events = sink_for_destination(config.event_log.as_deref())
        .map_err(|err| HarnessError::EventLog(err.to_string()))?;
    let writer = ReportWriter::new(config.run_root.clone())?;

    let session = Session::open(config, events.clone()).await?;
    let report = ScenarioRunner::new(&session, events).run(&plan).await;
    session.close();

    let artifacts = writer.write(&report)?;
    Ok(SuiteRun {
        report,
        artifacts,
    })
}
