// crates/story-spoiler-harness/src/auth.rs
// ============================================================================
// Module: Authenticator
// Description: Login call and access-token extraction for suite sessions.
// Purpose: Obtain the bearer token attached to every scenario request.
// Dependencies: serde_json, thiserror
// ============================================================================

//! ## Overview
//! The login endpoint takes `{username, password}` and answers with
//! `{accessToken}`. A body that is not JSON, or lacks a string `accessToken`,
//! yields an empty token rather than an error; whether an empty token aborts
//! the suite is decided by [`TokenPolicy`] in [`apply_token_policy`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use serde_json::json;
use thiserror::Error;

use crate::client::ApiClient;
use crate::client::ClientError;
use crate::client::HttpMethod;
use crate::config::TokenPolicy;
use crate::secret::Secret;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Login endpoint path.
pub const LOGIN_PATH: &str = "/api/User/Authentication";
/// Response field carrying the bearer token.
pub const ACCESS_TOKEN_FIELD: &str = "accessToken";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The login endpoint could not be reached.
    #[error("login request failed: {0}")]
    Transport(#[from] ClientError),
    /// Login returned no token and the strict policy is active.
    #[error("login response did not contain a non-empty accessToken (status {status})")]
    MissingToken {
        /// HTTP status of the login response.
        status: u16,
    },
}

/// Token returned by a login call.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    /// Extracted token; empty when the response carried none.
    pub token: Secret,
    /// HTTP status of the login response.
    pub status: u16,
}

/// Performs the login call on an unauthenticated client.
#[derive(Debug)]
pub struct Authenticator<'a> {
    /// Client used for the login request.
    client: &'a ApiClient,
}

impl<'a> Authenticator<'a> {
    /// Creates an authenticator over an unauthenticated client.
    #[must_use]
    pub const fn new(client: &'a ApiClient) -> Self {
        Self {
            client,
        }
    }

    /// Logs in and returns the extracted token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Transport`] when the request cannot be delivered.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &Secret,
    ) -> Result<LoginOutcome, AuthError> {
        let body = json!({
            "username": username,
            "password": password.expose(),
        });
        let response = self.client.execute(HttpMethod::Post, LOGIN_PATH, Some(&body)).await?;
        Ok(LoginOutcome {
            token: Secret::new(extract_access_token(&response.body)),
            status: response.status.as_u16(),
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Extracts `accessToken` from a login body, or an empty string.
#[must_use]
pub fn extract_access_token(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| value.get(ACCESS_TOKEN_FIELD).and_then(Value::as_str).map(str::to_string))
        .unwrap_or_default()
}

/// Applies the missing-token policy to a login outcome.
///
/// # Errors
///
/// Returns [`AuthError::MissingToken`] when the token is empty under
/// [`TokenPolicy::Strict`].
pub fn apply_token_policy(outcome: LoginOutcome, policy: TokenPolicy) -> Result<Secret, AuthError> {
    if outcome.token.is_blank() && policy == TokenPolicy::Strict {
        return Err(AuthError::MissingToken {
            status: outcome.status,
        });
    }
    Ok(outcome.token)
}
