// crates/story-spoiler-harness/src/session.rs
// ============================================================================
// Module: Suite Session
// Description: Scoped acquisition of the authenticated client for a suite run.
// Purpose: Log in once, share the client, and guarantee release on every path.
// Dependencies: reqwest (via client), thiserror
// ============================================================================

//! ## Overview
//! [`Session::open`] logs in through a throwaway unauthenticated client, then
//! builds the shared client carrying the bearer token. The session owns that
//! client for the whole run. [`Session::close`] releases it explicitly; if the
//! session is dropped early (setup abort, panic) `Drop` releases it and logs
//! the reason.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;
use url::Url;

use crate::auth::AuthError;
use crate::auth::Authenticator;
use crate::auth::apply_token_policy;
use crate::client::ApiClient;
use crate::client::ClientError;
use crate::config::HarnessConfig;
use crate::events::SessionEvent;
use crate::events::SharedEventSink;
use crate::events::now_millis;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Session setup errors; any of these aborts the suite.
#[derive(Debug, Error)]
pub enum SessionError {
    /// HTTP client construction failed.
    #[error("session client setup failed: {0}")]
    Client(#[from] ClientError),
    /// Login failed.
    #[error("session authentication failed: {0}")]
    Auth(#[from] AuthError),
}

/// Authenticated client shared by every scenario in a run.
pub struct Session {
    /// Client carrying the bearer token.
    client: ApiClient,
    /// Login username, echoed in session events.
    username: String,
    /// Whether login produced a non-empty token.
    has_token: bool,
    /// Event destination.
    events: SharedEventSink,
    /// Set once the session has been released.
    released: bool,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("client", &self.client)
            .field("username", &self.username)
            .field("has_token", &self.has_token)
            .field("released", &self.released)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Logs in and opens the session.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] when the client cannot be built, the login
    /// endpoint is unreachable, or the strict token policy rejects the login.
    pub async fn open(config: &HarnessConfig, events: SharedEventSink) -> Result<Self, SessionError> {
        let login_client =
            ApiClient::new(config.base_url.clone(), config.timeout, events.clone())?;
        let outcome = Authenticator::new(&login_client)
            .authenticate(&config.username, &config.password)
            .await?;
        let login_status = outcome.status;
        let token = apply_token_policy(outcome, config.token_policy)?;
        let has_token = !token.is_blank();
        if !has_token {
            events.record_session(&SessionEvent {
                event: "auth_token_missing",
                timestamp_ms: now_millis(),
                base_url: config.base_url.to_string(),
                username: Some(config.username.clone()),
                detail: Some(format!("login returned status {login_status} without accessToken")),
            });
        }
        drop(login_client);

        let client = ApiClient::new(config.base_url.clone(), config.timeout, events.clone())?
            .with_bearer_token(token);
        events.record_session(&SessionEvent {
            event: "session_opened",
            timestamp_ms: now_millis(),
            base_url: config.base_url.to_string(),
            username: Some(config.username.clone()),
            detail: None,
        });
        Ok(Self {
            client,
            username: config.username.clone(),
            has_token,
            events,
            released: false,
        })
    }

    /// Returns the shared authenticated client.
    #[must_use]
    pub const fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Returns the base URL of the API under test.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        self.client.base_url()
    }

    /// Returns true when login produced a non-empty token.
    #[must_use]
    pub const fn has_token(&self) -> bool {
        self.has_token
    }

    /// Releases the session after a completed run.
    pub fn close(mut self) {
        self.release("completed");
    }

    /// Emits the close event once.
    fn release(&mut self, reason: &str) {
        if self.released {
            return;
        }
        self.released = true;
        self.events.record_session(&SessionEvent {
            event: "session_closed",
            timestamp_ms: now_millis(),
            base_url: self.client.base_url().to_string(),
            username: Some(self.username.clone()),
            detail: Some(reason.to_string()),
        });
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        let reason = if std::thread::panicking() { "panic" } else { "dropped" };
        self.release(reason);
    }
}
