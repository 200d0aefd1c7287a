// crates/story-spoiler-harness/src/config/env.rs
// ============================================================================
// Module: Harness Environment
// Description: Environment-backed configuration layer for suite runs.
// Purpose: Centralize env parsing with strict UTF-8 validation.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Environment values are parsed with strict UTF-8 enforcement to avoid silent
//! misconfiguration. Invalid UTF-8, empty values, and unparseable numbers or
//! booleans fail closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;

use super::harness::ConfigError;
use super::harness::ConfigLayer;
use super::harness::TokenPolicy;
use crate::secret::Secret;

// ============================================================================
// SECTION: Environment Constants
// ============================================================================

/// Environment keys for harness configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarnessEnv {
    /// Base URL of the Story Spoiler API.
    BaseUrl,
    /// Login username.
    Username,
    /// Login password.
    Password,
    /// Request timeout override in seconds (positive integer).
    TimeoutSeconds,
    /// Abort the suite when login yields no token (`true`/`false` or `1`/`0`).
    StrictAuth,
    /// Run root for report artifacts.
    RunRoot,
    /// Event log destination (`-` for stderr).
    EventLog,
    /// Path to a TOML configuration file.
    ConfigPath,
}

impl HarnessEnv {
    /// Returns the canonical environment variable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BaseUrl => "STORY_SPOILER_BASE_URL",
            Self::Username => "STORY_SPOILER_USERNAME",
            Self::Password => "STORY_SPOILER_PASSWORD",
            Self::TimeoutSeconds => "STORY_SPOILER_TIMEOUT_SEC",
            Self::StrictAuth => "STORY_SPOILER_STRICT_AUTH",
            Self::RunRoot => "STORY_SPOILER_RUN_ROOT",
            Self::EventLog => "STORY_SPOILER_EVENT_LOG",
            Self::ConfigPath => "STORY_SPOILER_CONFIG",
        }
    }

    /// Returns every recognized key.
    #[must_use]
    pub const fn all() -> [Self; 8] {
        [
            Self::BaseUrl,
            Self::Username,
            Self::Password,
            Self::TimeoutSeconds,
            Self::StrictAuth,
            Self::RunRoot,
            Self::EventLog,
            Self::ConfigPath,
        ]
    }
}

// ============================================================================
// SECTION: Layer Loading
// ============================================================================

impl ConfigLayer {
    /// Builds a configuration layer from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a value is not valid UTF-8, is
    /// empty, or fails parsing.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = read_env_nonempty(HarnessEnv::BaseUrl)?;
        let username = read_env_nonempty(HarnessEnv::Username)?;
        let password = read_env_nonempty(HarnessEnv::Password)?.map(Secret::new);
        let timeout_sec = read_env_nonempty(HarnessEnv::TimeoutSeconds)?
            .map(|value| parse_timeout_seconds(HarnessEnv::TimeoutSeconds.as_str(), &value))
            .transpose()?;
        let token_policy = read_env_nonempty(HarnessEnv::StrictAuth)?
            .map(|value| parse_bool(HarnessEnv::StrictAuth.as_str(), &value))
            .transpose()?
            .map(|strict| if strict { TokenPolicy::Strict } else { TokenPolicy::Lenient });
        let run_root = read_env_nonempty(HarnessEnv::RunRoot)?.map(PathBuf::from);
        let event_log = read_env_nonempty(HarnessEnv::EventLog)?.map(PathBuf::from);
        Ok(Self {
            base_url,
            username,
            password,
            timeout_sec,
            token_policy,
            run_root,
            event_log,
        })
    }
}

/// Resolves the config file path from the environment, when set.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] when the value is not UTF-8 or is empty.
pub(crate) fn config_path_from_env() -> Result<Option<PathBuf>, ConfigError> {
    Ok(read_env_nonempty(HarnessEnv::ConfigPath)?.map(PathBuf::from))
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads an environment variable and enforces UTF-8 validity.
///
/// # Errors
///
/// Returns an error when the environment variable contains invalid UTF-8.
pub fn read_env_strict(name: &str) -> Result<Option<String>, String> {
    std::env::var_os(name).map_or(Ok(None), |raw| {
        raw.into_string().map(Some).map_err(|_| format!("{name} must be valid UTF-8"))
    })
}

/// Reads a harness environment variable and rejects empty values.
fn read_env_nonempty(key: HarnessEnv) -> Result<Option<String>, ConfigError> {
    let name = key.as_str();
    match read_env_strict(name).map_err(ConfigError::Invalid)? {
        Some(value) if value.trim().is_empty() => {
            Err(ConfigError::Invalid(format!("{name} must not be empty")))
        }
        Some(value) => Ok(Some(value)),
        None => Ok(None),
    }
}

/// Parses a positive timeout value in seconds.
fn parse_timeout_seconds(name: &str, raw: &str) -> Result<u64, ConfigError> {
    let secs: u64 = raw.trim().parse().map_err(|_| {
        ConfigError::Invalid(format!("{name} must be a positive integer number of seconds"))
    })?;
    if secs == 0 {
        return Err(ConfigError::Invalid(format!("{name} must be greater than zero")));
    }
    Ok(secs)
}

/// Parses a boolean literal (`true`/`false`/`1`/`0`).
fn parse_bool(name: &str, raw: &str) -> Result<bool, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("true") || trimmed == "1" {
        return Ok(true);
    }
    if trimmed.eq_ignore_ascii_case("false") || trimmed == "0" {
        return Ok(false);
    }
    Err(ConfigError::Invalid(format!("{name} must be 1, 0, true, or false")))
}
