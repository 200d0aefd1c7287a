// system-tests/src/lib.rs
// ============================================================================
// Module: Story Spoiler System Tests Library
// Description: Shared configuration for live system-test binaries.
// Purpose: Provide common settings for suites run against a real story API.
// Dependencies: story-spoiler-harness
// ============================================================================

//! ## Overview
//! This crate hosts shared configuration used by the live system-tests in
//! `system-tests/tests`. Those tests only build with the `system-tests`
//! feature and read API credentials from the `STORY_SPOILER_*` environment.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
