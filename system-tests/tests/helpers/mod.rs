// system-tests/tests/helpers/mod.rs
// ============================================================================
// Module: System Test Helpers
// Description: Shared helpers for Story Spoiler system-tests.
// Purpose: Provide artifact utilities and live configuration loading.
// Dependencies: system-tests, story-spoiler-harness
// ============================================================================

//! ## Overview
//! Shared helpers for Story Spoiler system-tests.
//! Invariants:
//! - Every live test writes `summary.json` and `summary.md`, even when skipped.
//! - Credentials come only from the environment and never reach artifacts.

#![allow(dead_code, reason = "Shared helpers are reused across multiple test suites.")]
