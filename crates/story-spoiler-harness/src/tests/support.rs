// crates/story-spoiler-harness/src/tests/support.rs
// ============================================================================
// Module: Story API Stub
// Description: In-process axum stand-in for the Story Spoiler API.
// Purpose: Exercise sessions and scenarios without the hosted service.
// Dependencies: axum, serde_json, tokio
// ============================================================================

//! ## Overview
//! The stub mirrors the hosted API's routes, status codes and messages. Story
//! routes require `Authorization: Bearer` with [`STUB_TOKEN`]; anything else
//! gets `401` with an empty body. Every request line is recorded so tests can
//! assert which calls were (or were not) sent.

#![allow(dead_code, reason = "Each test module uses a different subset of helpers.")]

use std::collections::BTreeMap;
use std::net::TcpListener as StdTcpListener;
use std::sync::Arc;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::Path;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::http::header::LOCATION;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::delete;
use axum::routing::get;
use axum::routing::post;
use axum::routing::put;
use serde_json::Value;
use serde_json::json;
use tokio::runtime::Builder;
use tokio::sync::oneshot;
use url::Url;

use crate::client::ApiClient;
use crate::client::MAX_RESPONSE_BYTES;
use crate::config::HarnessConfig;
use crate::config::TokenPolicy;
use crate::events::EventSink;
use crate::events::RequestEvent;
use crate::events::ScenarioEvent;
use crate::events::SessionEvent;
use crate::events::SharedEventSink;
use crate::secret::Secret;

// ============================================================================
// SECTION: Stub Server
// ============================================================================

/// Token issued by the stub login endpoint.
pub const STUB_TOKEN: &str = "stub-jwt-token";

/// Route answering with a body one byte over the client limit.
pub const OVERSIZED_PATH: &str = "/stub/oversized";

/// Route answering `302 Found` with a `Location` pointing at the list route.
pub const REDIRECT_PATH: &str = "/stub/redirect";

/// Behavior switches for the stub.
#[derive(Debug, Clone, Copy)]
pub struct StubOptions {
    /// Whether login responses carry `accessToken`.
    pub issue_token: bool,
    /// Whether create responses carry `storyId`.
    pub return_story_id: bool,
}

impl Default for StubOptions {
    fn default() -> Self {
        Self {
            issue_token: true,
            return_story_id: true,
        }
    }
}

/// Mutable stub data.
#[derive(Default)]
struct StubData {
    /// Stored stories by id.
    stories: BTreeMap<String, Value>,
    /// Last issued numeric id.
    next_id: u64,
    /// Request lines (`METHOD /path`) in arrival order.
    requests: Vec<String>,
}

/// Shared stub state.
struct StubState {
    /// Behavior switches.
    options: StubOptions,
    /// Stories and request log.
    data: Mutex<StubData>,
}

impl StubState {
    /// Records a request line.
    fn record(&self, line: String) {
        self.data.lock().expect("stub lock").requests.push(line);
    }
}

/// Handle for a running stub; shuts the server down on drop.
pub struct StoryApiStub {
    /// Base URL of the stub.
    base_url: Url,
    /// Shared state for inspection.
    state: Arc<StubState>,
    /// Shutdown trigger.
    shutdown: Option<oneshot::Sender<()>>,
    /// Server thread.
    join: Option<thread::JoinHandle<()>>,
}

impl StoryApiStub {
    /// Starts a stub with default behavior.
    pub fn start() -> Self {
        Self::start_with(StubOptions::default())
    }

    /// Starts a stub with the given behavior.
    pub fn start_with(options: StubOptions) -> Self {
        let listener = StdTcpListener::bind("127.0.0.1:0").expect("bind stub listener");
        listener.set_nonblocking(true).expect("stub listener nonblocking");
        let addr = listener.local_addr().expect("stub local addr");
        let base_url = Url::parse(&format!("http://{addr}")).expect("stub base url");
        let state = Arc::new(StubState {
            options,
            data: Mutex::new(StubData::default()),
        });
        let app = Router::new()
            .route("/api/User/Authentication", post(login))
            .route("/api/Story/Create", post(create_story))
            .route("/api/Story/Edit/{id}", put(edit_story))
            .route("/api/Story/All", get(list_stories))
            .route("/api/Story/Delete/{id}", delete(delete_story))
            .route(OVERSIZED_PATH, get(oversized))
            .route(REDIRECT_PATH, get(redirect_to_list))
            .with_state(Arc::clone(&state));
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let join = thread::spawn(move || {
            let runtime = Builder::new_current_thread().enable_all().build().expect("stub runtime");
            runtime.block_on(async move {
                let listener =
                    tokio::net::TcpListener::from_std(listener).expect("stub listener from_std");
                let server = axum::serve(listener, app).with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                });
                let _ = server.await;
            });
        });
        Self {
            base_url,
            state,
            shutdown: Some(shutdown_tx),
            join: Some(join),
        }
    }

    /// Returns the stub base URL.
    pub fn base_url(&self) -> Url {
        self.base_url.clone()
    }

    /// Returns the recorded request lines.
    pub fn requests(&self) -> Vec<String> {
        self.state.data.lock().expect("stub lock").requests.clone()
    }

    /// Returns the number of stored stories.
    pub fn story_count(&self) -> usize {
        self.state.data.lock().expect("stub lock").stories.len()
    }

    /// Builds a lenient configuration pointing at the stub.
    pub fn config(&self) -> HarnessConfig {
        HarnessConfig {
            base_url: self.base_url(),
            username: "tester".to_string(),
            password: Secret::new("tester-password"),
            timeout: Duration::from_secs(5),
            token_policy: TokenPolicy::Lenient,
            run_root: None,
            event_log: None,
        }
    }

    /// Builds a client that already carries the stub token.
    pub fn authorized_client(&self, events: SharedEventSink) -> ApiClient {
        ApiClient::new(self.base_url(), Duration::from_secs(5), events)
            .expect("stub client")
            .with_bearer_token(Secret::new(STUB_TOKEN))
    }

    /// Stops the server and waits for its thread.
    pub fn stop(mut self) {
        self.shutdown_now();
    }

    /// Signals shutdown and joins the server thread.
    fn shutdown_now(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

impl Drop for StoryApiStub {
    fn drop(&mut self) {
        self.shutdown_now();
    }
}

/// Returns a base URL nothing listens on.
pub fn unreachable_base_url() -> Url {
    let listener = StdTcpListener::bind("127.0.0.1:0").expect("bind probe listener");
    let addr = listener.local_addr().expect("probe local addr");
    drop(listener);
    Url::parse(&format!("http://{addr}")).expect("unreachable base url")
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Returns true when the request carries the stub bearer token.
fn authorized(headers: &HeaderMap) -> bool {
    let expected = format!("Bearer {STUB_TOKEN}");
    headers.get(AUTHORIZATION).and_then(|value| value.to_str().ok()) == Some(expected.as_str())
}

/// Reads a non-empty string field from a JSON body.
fn non_empty_field(body: &Value, field: &str) -> bool {
    body.get(field).and_then(Value::as_str).is_some_and(|value| !value.trim().is_empty())
}

/// Builds a JSON response.
fn reply(status: StatusCode, body: &Value) -> Response {
    (status, Json(body.clone())).into_response()
}

/// `POST /api/User/Authentication`.
async fn login(State(state): State<Arc<StubState>>, bytes: Bytes) -> Response {
    state.record("POST /api/User/Authentication".to_string());
    let body: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    let username = body.get("username").cloned().unwrap_or(Value::Null);
    if state.options.issue_token {
        reply(StatusCode::OK, &json!({ "username": username, "accessToken": STUB_TOKEN }))
    } else {
        reply(StatusCode::OK, &json!({ "username": username }))
    }
}

/// `POST /api/Story/Create`.
async fn create_story(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    bytes: Bytes,
) -> Response {
    state.record("POST /api/Story/Create".to_string());
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let body: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    if !non_empty_field(&body, "Title") || !non_empty_field(&body, "Description") {
        return reply(
            StatusCode::BAD_REQUEST,
            &json!({ "title": "One or more validation errors occurred.", "status": 400 }),
        );
    }
    let mut data = state.data.lock().expect("stub lock");
    data.next_id += 1;
    let id = format!("story-{}", data.next_id);
    data.stories.insert(id.clone(), body);
    if state.options.return_story_id {
        reply(StatusCode::CREATED, &json!({ "storyId": id, "msg": "Successfully created!" }))
    } else {
        reply(StatusCode::CREATED, &json!({ "msg": "Successfully created!" }))
    }
}

/// `PUT /api/Story/Edit/{id}`.
async fn edit_story(
    State(state): State<Arc<StubState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    bytes: Bytes,
) -> Response {
    state.record(format!("PUT /api/Story/Edit/{id}"));
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let body: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    let mut data = state.data.lock().expect("stub lock");
    match data.stories.get_mut(&id) {
        Some(story) => {
            *story = body;
            reply(StatusCode::OK, &json!({ "msg": "Successfully edited" }))
        }
        None => reply(StatusCode::NOT_FOUND, &json!({ "msg": "No spoilers..." })),
    }
}

/// `GET /api/Story/All`.
async fn list_stories(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    state.record("GET /api/Story/All".to_string());
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let data = state.data.lock().expect("stub lock");
    let stories: Vec<Value> = data
        .stories
        .iter()
        .map(|(id, story)| {
            json!({
                "id": id,
                "title": story.get("Title").cloned().unwrap_or(Value::Null),
                "description": story.get("Description").cloned().unwrap_or(Value::Null),
                "url": story.get("Url").cloned().unwrap_or(Value::Null),
            })
        })
        .collect();
    reply(StatusCode::OK, &Value::Array(stories))
}

/// `DELETE /api/Story/Delete/{id}`.
async fn delete_story(
    State(state): State<Arc<StubState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    state.record(format!("DELETE /api/Story/Delete/{id}"));
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let mut data = state.data.lock().expect("stub lock");
    if data.stories.remove(&id).is_some() {
        reply(StatusCode::OK, &json!({ "msg": "Deleted successfully!" }))
    } else {
        reply(StatusCode::BAD_REQUEST, &json!({ "msg": "Unable to delete this story spoiler!" }))
    }
}

/// `GET /stub/oversized`.
async fn oversized(State(state): State<Arc<StubState>>) -> Response {
    state.record(format!("GET {OVERSIZED_PATH}"));
    (StatusCode::OK, vec![b'x'; MAX_RESPONSE_BYTES + 1]).into_response()
}

/// `GET /stub/redirect`.
async fn redirect_to_list(State(state): State<Arc<StubState>>) -> Response {
    state.record(format!("GET {REDIRECT_PATH}"));
    (StatusCode::FOUND, [(LOCATION, "/api/Story/All")]).into_response()
}

// ============================================================================
// SECTION: Event Capture
// ============================================================================

/// Event sink that keeps every event in memory.
#[derive(Default)]
pub struct RecordingSink {
    /// Session events.
    sessions: Mutex<Vec<SessionEvent>>,
    /// Request events.
    requests: Mutex<Vec<RequestEvent>>,
    /// Scenario events.
    scenarios: Mutex<Vec<ScenarioEvent>>,
}

impl RecordingSink {
    /// Creates a sink and a shared handle to it.
    pub fn shared() -> (Arc<Self>, SharedEventSink) {
        let sink = Arc::new(Self::default());
        let shared: SharedEventSink = sink.clone();
        (sink, shared)
    }

    /// Returns recorded session events.
    pub fn sessions(&self) -> Vec<SessionEvent> {
        self.sessions.lock().expect("sink lock").clone()
    }

    /// Returns recorded request events.
    pub fn requests(&self) -> Vec<RequestEvent> {
        self.requests.lock().expect("sink lock").clone()
    }

    /// Returns recorded scenario events.
    pub fn scenarios(&self) -> Vec<ScenarioEvent> {
        self.scenarios.lock().expect("sink lock").clone()
    }

    /// Returns session event names in order.
    pub fn session_event_names(&self) -> Vec<&'static str> {
        self.sessions().iter().map(|event| event.event).collect()
    }
}

impl EventSink for RecordingSink {
    fn record_session(&self, event: &SessionEvent) {
        self.sessions.lock().expect("sink lock").push(event.clone());
    }

    fn record_request(&self, event: &RequestEvent) {
        self.requests.lock().expect("sink lock").push(event.clone());
    }

    fn record_scenario(&self, event: &ScenarioEvent) {
        self.scenarios.lock().expect("sink lock").push(event.clone());
    }
}
