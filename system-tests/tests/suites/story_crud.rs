// system-tests/tests/suites/story_crud.rs
// ============================================================================
// Module: Live Story CRUD Tests
// Description: Runs the ordered story scenarios against a real API.
// Purpose: Confirm the deployed API honors the documented contract.
// Dependencies: system-tests helpers, story-spoiler-harness, tempfile
// ============================================================================

//! Live story scenario tests for Story Spoiler system-tests.

use std::fs;
use std::path::Path;

use helpers::artifacts::TestReporter;
use helpers::artifacts::TestStatus;
use helpers::live::LiveTarget;
use serde_json::Value;
use serde_json::json;
use story_spoiler_harness::ScenarioOutcome;
use story_spoiler_harness::run_suite;
use system_tests::config::SystemTestConfig;

use crate::helpers;

#[tokio::test(flavor = "current_thread")]
async fn live_story_crud_flow() -> Result<(), Box<dyn std::error::Error>> {
    let system = SystemTestConfig::load()?;
    let mut reporter = TestReporter::new("live_story_crud_flow", &system)?;
    let config = match helpers::live::resolve(&system, reporter.artifacts().root())? {
        LiveTarget::Ready(config) => config,
        LiveTarget::Unavailable(note) => {
            if system.require_live {
                reporter.finish(TestStatus::Fail, vec![note.clone()], Vec::new())?;
                return Err(format!("live run required: {note}").into());
            }
            reporter.finish(TestStatus::Skipped, vec![note], Vec::new())?;
            return Ok(());
        }
    };

    let run = run_suite(&config, &[]).await?;
    let mut notes = vec![
        format!("base url: {}", run.report.base_url),
        format!(
            "{} passed, {} failed, {} skipped",
            run.report.passed_count(),
            run.report.failed_count(),
            run.report.skipped_count()
        ),
    ];
    for scenario in &run.report.scenarios {
        if let Some(reason) = scenario.outcome.reason() {
            notes.push(format!("{}. {}: {reason}", scenario.order, scenario.name));
        }
    }
    let mut artifacts: Vec<String> =
        run.artifacts.iter().map(|path| reporter.artifacts().relative(path)).collect();
    if let Some(event_log) = &config.event_log {
        artifacts.push(reporter.artifacts().relative(event_log));
        check_event_log(event_log, config.password.expose())?;
    }

    if !run.report.passed() {
        reporter.finish(TestStatus::Fail, notes, artifacts)?;
        return Err("live story suite did not pass".into());
    }
    if !matches!(
        run.report.scenario(1).map(|scenario| &scenario.outcome),
        Some(ScenarioOutcome::Passed)
    ) {
        reporter.finish(TestStatus::Fail, notes, artifacts)?;
        return Err("create scenario missing from report".into());
    }
    reporter.finish(TestStatus::Pass, notes, artifacts)?;
    Ok(())
}

/// Checks the event log parses as JSON lines and never carries the password.
///
/// The `username` field is exempt so accounts whose password equals the
/// username still pass.
fn check_event_log(path: &Path, password: &str) -> Result<(), String> {
    let content = fs::read_to_string(path).map_err(|err| err.to_string())?;
    check_event_lines(&content, password)
}

/// Validates event log content line by line.
fn check_event_lines(content: &str, password: &str) -> Result<(), String> {
    let mut finished = 0;
    for line in content.lines() {
        let event: Value = serde_json::from_str(line).map_err(|err| err.to_string())?;
        let Some(fields) = event.as_object() else {
            return Err(format!("event is not a JSON object: {line}"));
        };
        let leaked = fields
            .iter()
            .filter(|(key, _)| key.as_str() != "username")
            .any(|(_, value)| value_contains(value, password));
        if leaked {
            return Err("event log leaked the login password".to_string());
        }
        if event.get("event").and_then(Value::as_str) == Some("scenario_finished") {
            finished += 1;
        }
    }
    if finished != 7 {
        return Err(format!("expected 7 scenario_finished events, found {finished}"));
    }
    Ok(())
}

/// Returns true when any string inside `value` contains `needle`.
fn value_contains(value: &Value, needle: &str) -> bool {
    match value {
        Value::String(text) => text.contains(needle),
        Value::Array(items) => items.iter().any(|item| value_contains(item, needle)),
        Value::Object(map) => map.values().any(|item| value_contains(item, needle)),
        _ => false,
    }
}

fn event_log_with(detail: &str) -> String {
    let mut lines = vec![
        json!({
            "event": "session_opened",
            "timestamp_ms": 1,
            "base_url": "http://127.0.0.1:1/",
            "username": "inso92",
            "detail": detail,
        })
        .to_string(),
    ];
    for order in 1..=7 {
        lines.push(
            json!({
                "event": "scenario_finished",
                "timestamp_ms": 2,
                "order": order,
                "name": format!("scenario_{order}"),
                "outcome": "passed",
                "reason": null,
                "duration_ms": 0,
            })
            .to_string(),
        );
    }
    lines.join("\n")
}

#[test]
fn event_check_ignores_username_matching_password() -> Result<(), String> {
    check_event_lines(&event_log_with("completed"), "inso92")
}

#[test]
fn event_check_flags_password_in_other_fields() -> Result<(), Box<dyn std::error::Error>> {
    let result = check_event_lines(&event_log_with("login as inso92"), "inso92");
    if result != Err("event log leaked the login password".to_string()) {
        return Err(format!("unexpected result: {result:?}").into());
    }
    Ok(())
}

#[test]
fn reporter_summary_is_valid_json() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let system = SystemTestConfig {
        run_root: Some(dir.path().to_path_buf()),
        ..SystemTestConfig::default()
    };
    let mut reporter = TestReporter::new("summary_json", &system)?;
    reporter.finish(TestStatus::Skipped, vec!["no credentials".to_string()], Vec::new())?;

    let path = dir.path().join("summary_json").join("summary.json");
    let summary: Value = serde_json::from_str(&fs::read_to_string(path)?)?;
    let started = summary["started_at_ms"].as_u64().ok_or("started_at_ms missing")?;
    let ended = summary["ended_at_ms"].as_u64().ok_or("ended_at_ms missing")?;
    if started == 0 || ended < started {
        return Err(format!("bad timestamps: {started}..{ended}").into());
    }
    if summary["status"] != "skipped" {
        return Err(format!("unexpected status: {}", summary["status"]).into());
    }
    Ok(())
}
