// crates/story-spoiler-harness/src/config/harness.rs
// ============================================================================
// Module: Harness Configuration Model
// Description: Layered configuration types, TOML loading, and validation.
// Purpose: Produce a validated HarnessConfig from defaults and overrides.
// Dependencies: serde, thiserror, toml, url
// ============================================================================

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use url::Url;

use super::env::config_path_from_env;
use crate::secret::Secret;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Base URL of the hosted Story Spoiler service.
pub const DEFAULT_BASE_URL: &str = "https://d3s5nxhwblsjbi.cloudfront.net";
/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Maximum accepted request timeout in seconds.
pub const MAX_TIMEOUT_SECS: u64 = 300;
/// Maximum configuration file size in bytes.
const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a username.
const MAX_USERNAME_LENGTH: usize = 256;

// ============================================================================
// SECTION: Types
// ============================================================================

/// How the suite treats a login response without an access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenPolicy {
    /// Continue with an empty token and emit a warning event.
    #[default]
    Lenient,
    /// Abort the suite before any scenario runs.
    Strict,
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// One configuration layer; unset fields defer to earlier layers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigLayer {
    /// Base URL of the API under test.
    pub base_url: Option<String>,
    /// Login username.
    pub username: Option<String>,
    /// Login password.
    pub password: Option<Secret>,
    /// Request timeout in seconds.
    pub timeout_sec: Option<u64>,
    /// Missing-token policy.
    pub token_policy: Option<TokenPolicy>,
    /// Run root for report artifacts.
    pub run_root: Option<PathBuf>,
    /// Event log destination (`-` for stderr).
    pub event_log: Option<PathBuf>,
}

impl ConfigLayer {
    /// Parses a layer from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown keys.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Reads a layer from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read, exceeds the size
    /// limit, is not UTF-8, or fails to parse.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let bytes = fs::read(path)
            .map_err(|err| ConfigError::Io(format!("{}: {err}", path.display())))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Overlays `other` on top of this layer; set fields in `other` win.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self {
            base_url: other.base_url.or(self.base_url),
            username: other.username.or(self.username),
            password: other.password.or(self.password),
            timeout_sec: other.timeout_sec.or(self.timeout_sec),
            token_policy: other.token_policy.or(self.token_policy),
            run_root: other.run_root.or(self.run_root),
            event_log: other.event_log.or(self.event_log),
        }
    }
}

/// Validated configuration for one suite run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Base URL of the API under test.
    pub base_url: Url,
    /// Login username.
    pub username: String,
    /// Login password.
    pub password: Secret,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Missing-token policy.
    pub token_policy: TokenPolicy,
    /// Run root for report artifacts (a timestamped default when unset).
    pub run_root: Option<PathBuf>,
    /// Event log destination (`-` for stderr).
    pub event_log: Option<PathBuf>,
}

impl HarnessConfig {
    /// Loads configuration from the optional file, the environment, and the
    /// supplied overrides, in that precedence order.
    ///
    /// `config_path` falls back to `STORY_SPOILER_CONFIG` when `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when any layer fails to load or the merged
    /// configuration is invalid.
    pub fn load(config_path: Option<&Path>, overrides: ConfigLayer) -> Result<Self, ConfigError> {
        let path = match config_path {
            Some(path) => Some(path.to_path_buf()),
            None => config_path_from_env()?,
        };
        let file = path.as_deref().map(ConfigLayer::from_toml_file).transpose()?;
        let merged =
            file.unwrap_or_default().merge(ConfigLayer::from_env()?).merge(overrides);
        Self::from_layer(merged)
    }

    /// Validates a merged layer, applying defaults for unset fields.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a value is missing or out of range.
    pub fn from_layer(layer: ConfigLayer) -> Result<Self, ConfigError> {
        let base_url = parse_base_url(layer.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL))?;
        let username = layer
            .username
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ConfigError::Invalid("username is required".to_string()))?;
        if username.len() > MAX_USERNAME_LENGTH {
            return Err(ConfigError::Invalid("username exceeds max length".to_string()));
        }
        let password = layer
            .password
            .filter(|value| !value.is_blank())
            .ok_or_else(|| ConfigError::Invalid("password is required".to_string()))?;
        let timeout = match layer.timeout_sec {
            None => DEFAULT_TIMEOUT,
            Some(0) => {
                return Err(ConfigError::Invalid("timeout_sec must be greater than zero".into()));
            }
            Some(secs) if secs > MAX_TIMEOUT_SECS => {
                return Err(ConfigError::Invalid(format!(
                    "timeout_sec must be at most {MAX_TIMEOUT_SECS}"
                )));
            }
            Some(secs) => Duration::from_secs(secs),
        };
        Ok(Self {
            base_url,
            username,
            password,
            timeout,
            token_policy: layer.token_policy.unwrap_or_default(),
            run_root: layer.run_root,
            event_log: layer.event_log,
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Parses and checks the base URL.
fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|err| ConfigError::Invalid(format!("base_url is not a valid url: {err}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Invalid("base_url must use http or https".to_string()));
    }
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(ConfigError::Invalid("base_url must include a host".to_string()));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(ConfigError::Invalid(
            "base_url must not carry a query or fragment".to_string(),
        ));
    }
    Ok(url)
}
