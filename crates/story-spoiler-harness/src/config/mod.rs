// crates/story-spoiler-harness/src/config/mod.rs
// ============================================================================
// Module: Harness Configuration
// Description: Centralized configuration for Story Spoiler suite runs.
// Purpose: Provide typed, layered access to base URL, credentials, and defaults.
// Dependencies: serde, toml, url
// ============================================================================

//! ## Overview
//! Configuration is assembled from layers: built-in defaults, an optional TOML
//! file, environment variables, and explicit overrides (for example CLI flags).
//! Later layers win. The merged layer is validated into a [`HarnessConfig`]
//! and any invalid value fails closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod env;
mod harness;

// ============================================================================
// SECTION: Tests
// ============================================================================


// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use env::HarnessEnv;
pub use env::read_env_strict;
pub use harness::ConfigError;
pub use harness::ConfigLayer;
pub use harness::DEFAULT_BASE_URL;
pub use harness::DEFAULT_TIMEOUT;
pub use harness::HarnessConfig;
pub use harness::MAX_TIMEOUT_SECS;
pub use harness::TokenPolicy;
