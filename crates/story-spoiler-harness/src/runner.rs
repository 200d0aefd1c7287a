// crates/story-spoiler-harness/src/runner.rs
// ============================================================================
// Module: Ordered Scenario Runner
// Description: Validated scenario plans and strictly ordered execution.
// Purpose: Run stateful scenarios in declared order with per-scenario reporting.
// Dependencies: serde_json, thiserror
// ============================================================================

//! ## Overview
//! A [`ScenarioPlan`] is validated up front: orders strictly increase, names
//! are unique, and dependencies point at earlier scenarios. The
//! [`ScenarioRunner`] then executes it one scenario at a time against a single
//! [`Session`]. A failed scenario never stops the run; scenarios whose
//! dependencies did not pass, or whose path needs an uncaptured value, are
//! reported as skipped without sending a request. Nothing is retried.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::time::Instant;

use serde_json::Value;
use thiserror::Error;

use crate::assertions::AssertionError;
use crate::assertions::assert_body_contains;
use crate::assertions::assert_json_array_not_empty;
use crate::assertions::assert_not_empty;
use crate::assertions::assert_status;
use crate::client::ApiResponse;
use crate::events::ScenarioEvent;
use crate::events::SharedEventSink;
use crate::events::elapsed_millis;
use crate::events::now_millis;
use crate::report::ScenarioOutcome;
use crate::report::ScenarioReport;
use crate::report::SuiteReport;
use crate::scenario::Capture;
use crate::scenario::Expectation;
use crate::scenario::Scenario;
use crate::scenario::SuiteContext;
use crate::session::Session;

// ============================================================================
// SECTION: Plan
// ============================================================================

/// Plan validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    /// The plan has no scenarios.
    #[error("scenario plan is empty")]
    Empty,
    /// Orders are not strictly increasing.
    #[error("scenario {order} is declared after scenario {previous}; orders must strictly increase")]
    OutOfOrder {
        /// Offending order.
        order: u32,
        /// Preceding order.
        previous: u32,
    },
    /// Two scenarios share a name.
    #[error("duplicate scenario name {0:?}")]
    DuplicateName(String),
    /// A dependency does not name an earlier scenario.
    #[error("scenario {order} depends on {dependency}, which is not an earlier scenario")]
    InvalidDependency {
        /// Dependent scenario.
        order: u32,
        /// Declared dependency.
        dependency: u32,
    },
    /// A selected order is not in the plan.
    #[error("scenario {0} is not part of the plan")]
    UnknownScenario(u32),
}

/// Validated, ordered list of scenarios.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioPlan {
    /// Scenarios in declared order.
    scenarios: Vec<Scenario>,
}

impl ScenarioPlan {
    /// Validates and wraps a scenario list.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError`] when the list is empty, out of order, has duplicate
    /// names, or declares a dependency on a later or unknown scenario.
    pub fn new(scenarios: Vec<Scenario>) -> Result<Self, PlanError> {
        if scenarios.is_empty() {
            return Err(PlanError::Empty);
        }
        let mut names = BTreeSet::new();
        let mut seen = BTreeSet::new();
        let mut previous: Option<u32> = None;
        for scenario in &scenarios {
            if let Some(previous) = previous
                && scenario.order <= previous
            {
                return Err(PlanError::OutOfOrder {
                    order: scenario.order,
                    previous,
                });
            }
            if !names.insert(scenario.name.as_str()) {
                return Err(PlanError::DuplicateName(scenario.name.clone()));
            }
            for dependency in &scenario.depends_on {
                if !seen.contains(dependency) {
                    return Err(PlanError::InvalidDependency {
                        order: scenario.order,
                        dependency: *dependency,
                    });
                }
            }
            seen.insert(scenario.order);
            previous = Some(scenario.order);
        }
        Ok(Self {
            scenarios,
        })
    }

    /// Returns the scenarios in declared order.
    #[must_use]
    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    /// Keeps only the listed orders, preserving declared order.
    ///
    /// Dependencies on unselected scenarios are kept and surface as skips.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::UnknownScenario`] for an order not in the plan.
    pub fn select(&self, orders: &[u32]) -> Result<Self, PlanError> {
        if let Some(unknown) =
            orders.iter().find(|order| !self.scenarios.iter().any(|s| s.order == **order))
        {
            return Err(PlanError::UnknownScenario(*unknown));
        }
        let scenarios: Vec<Scenario> = self
            .scenarios
            .iter()
            .filter(|scenario| orders.contains(&scenario.order))
            .cloned()
            .collect();
        if scenarios.is_empty() {
            return Err(PlanError::Empty);
        }
        Ok(Self {
            scenarios,
        })
    }
}

// ============================================================================
// SECTION: Runner
// ============================================================================

/// Executes a plan against one session.
pub struct ScenarioRunner<'a> {
    /// Authenticated session shared by every scenario.
    session: &'a Session,
    /// Event destination.
    events: SharedEventSink,
}

/// Result of evaluating one scenario before it is stamped with timing.
struct Evaluation {
    /// Path used or attempted.
    path: String,
    /// Response status when a response arrived.
    http_status: Option<u16>,
    /// Outcome.
    outcome: ScenarioOutcome,
}

impl<'a> ScenarioRunner<'a> {
    /// Creates a runner over an open session.
    #[must_use]
    pub fn new(session: &'a Session, events: SharedEventSink) -> Self {
        Self {
            session,
            events,
        }
    }

    /// Runs every scenario in declared order and reports each one.
    pub async fn run(&self, plan: &ScenarioPlan) -> SuiteReport {
        let mut context = SuiteContext::default();
        self.run_with_context(plan, &mut context).await
    }

    /// Runs a plan with caller-supplied context, which is updated in place.
    pub async fn run_with_context(
        &self,
        plan: &ScenarioPlan,
        context: &mut SuiteContext,
    ) -> SuiteReport {
        let mut report = SuiteReport::start(self.session.base_url().as_str());
        let mut results: BTreeMap<u32, bool> = BTreeMap::new();
        for scenario in plan.scenarios() {
            let started = Instant::now();
            let evaluation = self.run_scenario(scenario, context, &results).await;
            let duration_ms = elapsed_millis(started);
            results.insert(scenario.order, evaluation.outcome.is_passed());
            self.events.record_scenario(&ScenarioEvent {
                event: "scenario_finished",
                timestamp_ms: now_millis(),
                order: scenario.order,
                name: scenario.name.clone(),
                outcome: evaluation.outcome.label(),
                reason: evaluation.outcome.reason().map(str::to_string),
                duration_ms,
            });
            report.scenarios.push(ScenarioReport {
                order: scenario.order,
                name: scenario.name.clone(),
                method: scenario.method,
                path: evaluation.path,
                http_status: evaluation.http_status,
                outcome: evaluation.outcome,
                duration_ms,
            });
        }
        report.finish();
        report
    }

    /// Checks preconditions, sends the request, and evaluates the response.
    async fn run_scenario(
        &self,
        scenario: &Scenario,
        context: &mut SuiteContext,
        results: &BTreeMap<u32, bool>,
    ) -> Evaluation {
        let template = scenario.path.to_string();
        if let Some(reason) = unmet_dependency(scenario, results) {
            return Evaluation {
                path: template,
                http_status: None,
                outcome: ScenarioOutcome::Skipped {
                    reason,
                },
            };
        }
        let path = match scenario.path.resolve(context) {
            Ok(path) => path,
            Err(err) => {
                return Evaluation {
                    path: template,
                    http_status: None,
                    outcome: ScenarioOutcome::Skipped {
                        reason: err.to_string(),
                    },
                };
            }
        };
        let response = match self
            .session
            .client()
            .execute(scenario.method, &path, scenario.payload.as_ref())
            .await
        {
            Ok(response) => response,
            Err(err) => {
                return Evaluation {
                    path,
                    http_status: None,
                    outcome: ScenarioOutcome::Failed {
                        reason: err.to_string(),
                    },
                };
            }
        };
        let outcome = match evaluate(scenario, &response, context) {
            Ok(()) => ScenarioOutcome::Passed,
            Err(err) => ScenarioOutcome::Failed {
                reason: err.to_string(),
            },
        };
        Evaluation {
            path,
            http_status: Some(response.status.as_u16()),
            outcome,
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns a skip reason when a declared dependency did not pass.
fn unmet_dependency(scenario: &Scenario, results: &BTreeMap<u32, bool>) -> Option<String> {
    scenario.depends_on.iter().find_map(|dependency| match results.get(dependency) {
        Some(true) => None,
        Some(false) => Some(format!("dependency {dependency} did not pass")),
        None => Some(format!("dependency {dependency} was not run")),
    })
}

/// Applies status checks, then the capture, then the remaining checks.
fn evaluate(
    scenario: &Scenario,
    response: &ApiResponse,
    context: &mut SuiteContext,
) -> Result<(), AssertionError> {
    for expectation in &scenario.expectations {
        if let Expectation::Status(expected) = expectation {
            assert_status(response.status, *expected, &response.body)?;
        }
    }
    if let Some(capture) = &scenario.capture {
        let value = captured_value(capture, &response.body);
        assert_not_empty(&value, &capture.empty_message)?;
        context.set(capture.into, value);
    }
    for expectation in &scenario.expectations {
        match expectation {
            Expectation::Status(_) => {}
            Expectation::BodyContains(substring) => {
                assert_body_contains(&response.body, substring)?;
            }
            Expectation::JsonArrayNotEmpty => assert_json_array_not_empty(&response.body)?,
        }
    }
    Ok(())
}

/// Reads the capture field as a string, or an empty string.
fn captured_value(capture: &Capture, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| value.get(&capture.field).and_then(Value::as_str).map(str::to_string))
        .unwrap_or_default()
}
