// crates/story-spoiler-harness/src/lib.rs
// ============================================================================
// Module: Story Spoiler Harness Library
// Description: Ordered, stateful HTTP scenario harness for the Story Spoiler API.
// Purpose: Provide session setup, scenario execution, and assertions for API suites.
// Dependencies: reqwest, serde, serde_json, serde_jcs, thiserror, toml, url
// ============================================================================

//! ## Overview
//! The harness opens one authenticated [`session::Session`] per suite run,
//! executes an ordered [`runner::ScenarioPlan`] against it, and reports each
//! scenario's outcome independently. Scenarios share state only through an
//! explicit [`scenario::SuiteContext`], and declared dependencies turn a failed
//! prerequisite into a skip instead of a request against an undefined id.
//!
//! The concrete Story Spoiler suite lives in [`story`]; [`suite::run_suite`]
//! drives it from configuration to a written report.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod assertions;
pub mod auth;
pub mod client;
pub mod config;
pub mod events;
pub mod report;
pub mod runner;
pub mod scenario;
pub mod secret;
pub mod session;
pub mod story;
pub mod suite;


// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use client::ApiClient;
pub use client::ApiResponse;
pub use client::HttpMethod;
pub use config::HarnessConfig;
pub use config::TokenPolicy;
pub use report::ScenarioOutcome;
pub use report::SuiteReport;
pub use runner::ScenarioPlan;
pub use runner::ScenarioRunner;
pub use secret::Secret;
pub use session::Session;
pub use suite::HarnessError;
pub use suite::SuiteRun;
pub use suite::run_suite;
