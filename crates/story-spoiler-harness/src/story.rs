// crates/story-spoiler-harness/src/story.rs
// ============================================================================
// Module: Story Suite Catalog
// Description: The ordered Story Spoiler CRUD scenarios.
// Purpose: Declare the create/edit/list/delete suite against the story API.
// Dependencies: reqwest (StatusCode), serde_json
// ============================================================================

//! ## Overview
//! Seven scenarios in fixed order. Scenario 1 creates a story and captures its
//! `storyId`; scenarios 2 through 4 edit, list and delete it and declare a
//! dependency on scenario 1. Scenarios 5 through 7 cover the error paths and
//! use the literal id [`NON_EXISTENT_STORY_ID`], so they run whatever
//! scenario 1 did.

use reqwest::StatusCode;
use serde_json::json;

use crate::client::HttpMethod;
use crate::runner::PlanError;
use crate::runner::ScenarioPlan;
use crate::scenario::ContextKey;
use crate::scenario::PathTemplate;
use crate::scenario::Scenario;

// ============================================================================
// SECTION: Endpoints
// ============================================================================

/// Story creation endpoint.
pub const CREATE_PATH: &str = "/api/Story/Create";
/// Story edit endpoint prefix; the story id is the final segment.
pub const EDIT_PATH: &str = "/api/Story/Edit";
/// Story listing endpoint.
pub const LIST_PATH: &str = "/api/Story/All";
/// Story deletion endpoint prefix; the story id is the final segment.
pub const DELETE_PATH: &str = "/api/Story/Delete";
/// Id used by the not-found scenarios.
pub const NON_EXISTENT_STORY_ID: &str = "123";
/// Response field carrying the created story id.
pub const STORY_ID_FIELD: &str = "storyId";

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// Returns the story scenarios in declared order.
#[must_use]
pub fn story_scenarios() -> Vec<Scenario> {
    vec![
        Scenario::new(
            1,
            "create_story_returns_created",
            HttpMethod::Post,
            PathTemplate::fixed(CREATE_PATH),
        )
        .with_payload(json!({
            "Title": "New Story",
            "Description": "Interesting story",
            "Url": "",
        }))
        .expect_status(StatusCode::CREATED)
        .capture(STORY_ID_FIELD, ContextKey::CreatedStoryId, "Story ID should not be null or empty.")
        .expect_body_contains("Successfully created!"),
        Scenario::new(
            2,
            "edit_story_returns_success",
            HttpMethod::Put,
            PathTemplate::with_context(EDIT_PATH, ContextKey::CreatedStoryId),
        )
        .with_payload(json!({
            "Title": "Edited Story",
            "Description": "This is an updated test story description.",
            "Url": "",
        }))
        .expect_status(StatusCode::OK)
        .expect_body_contains("Successfully edited")
        .depends_on(1),
        Scenario::new(
            3,
            "list_stories_returns_non_empty",
            HttpMethod::Get,
            PathTemplate::fixed(LIST_PATH),
        )
        .expect_status(StatusCode::OK)
        .expect_json_array_not_empty()
        .depends_on(1),
        Scenario::new(
            4,
            "delete_story_returns_success",
            HttpMethod::Delete,
            PathTemplate::with_context(DELETE_PATH, ContextKey::CreatedStoryId),
        )
        .expect_status(StatusCode::OK)
        .expect_body_contains("Deleted successfully!")
        .depends_on(1),
        Scenario::new(
            5,
            "create_story_without_required_fields_returns_bad_request",
            HttpMethod::Post,
            PathTemplate::fixed(CREATE_PATH),
        )
        .with_payload(json!({
            "Title": "",
            "Description": "",
        }))
        .expect_status(StatusCode::BAD_REQUEST),
        Scenario::new(
            6,
            "edit_missing_story_returns_not_found",
            HttpMethod::Put,
            PathTemplate::with_literal(EDIT_PATH, NON_EXISTENT_STORY_ID),
        )
        .with_payload(json!({
            "Title": "Edited Non-Existing Story",
            "Description": "This is an updated test story description for a non-existing story.",
            "Url": "",
        }))
        .expect_status(StatusCode::NOT_FOUND)
        .expect_body_contains("No spoilers..."),
        Scenario::new(
            7,
            "delete_missing_story_returns_bad_request",
            HttpMethod::Delete,
            PathTemplate::with_literal(DELETE_PATH, NON_EXISTENT_STORY_ID),
        )
        .expect_status(StatusCode::BAD_REQUEST)
        .expect_body_contains("Unable to delete this story spoiler!"),
    ]
}

/// Returns the validated story plan.
///
/// # Errors
///
/// Returns [`PlanError`] if the catalog is malformed.
pub fn story_plan() -> Result<ScenarioPlan, PlanError> {
    ScenarioPlan::new(story_scenarios())
}
