//! Integration tests for the Wellnest API endpoints.
//!
//! These tests verify the full request/response cycle through the HTTP API.

use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::{TestRequest, TestServer};
use serde_json::{Value, json};

use wellnest::api::{AppState, USER_ID_HEADER, router};
use wellnest::calendar::DayBoundary;
use wellnest::daily_pick::MemoryPickStore;
use wellnest::storage::Storage;

async fn create_test_server() -> TestServer {
    let storage = Storage::new("sqlite::memory:").await.unwrap();
    let state = AppState::with_pick_store(
        storage,
        Arc::new(MemoryPickStore::new()),
        DayBoundary::utc(),
    );

    TestServer::new(router(state)).unwrap()
}

fn as_user(request: TestRequest, user: &'static str) -> TestRequest {
    request.add_header(
        HeaderName::from_static(USER_ID_HEADER),
        HeaderValue::from_static(user),
    )
}

async fn create_task(server: &TestServer, user: &'static str, body: Value) -> Value {
    let response = as_user(server.post("/todos"), user).json(&body).await;
    response.assert_status(StatusCode::CREATED);
    response.json()
}

#[tokio::test]
async fn test_health_endpoint() {
    let server = create_test_server().await;

    let response = server.get("/health").await;

    response.assert_status_ok();
}

#[tokio::test]
async fn test_missing_identity_is_unauthorized() {
    let server = create_test_server().await;

    let response = server.get("/todos").await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], 401);
}

#[tokio::test]
async fn test_create_task_defaults_and_positions() {
    let server = create_test_server().await;

    let first = create_task(&server, "alice", json!({ "text": "Journal for 10 minutes" })).await;
    assert_eq!(first["category"], "personal");
    assert_eq!(first["priority"], "medium");
    assert_eq!(first["completed"], false);
    assert_eq!(first["position"], 0);

    let second = create_task(
        &server,
        "alice",
        json!({ "text": "Gym", "category": "health", "priority": "high" }),
    )
    .await;
    assert_eq!(second["position"], 1);

    let response = as_user(server.get("/todos"), "alice").await;
    response.assert_status_ok();
    let tasks: Value = response.json();
    assert_eq!(tasks.as_array().unwrap().len(), 2);

    let response = as_user(server.get("/todos"), "bob").await;
    let tasks: Value = response.json();
    assert!(tasks.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_create_task_validation() {
    let server = create_test_server().await;

    as_user(server.post("/todos"), "alice")
        .json(&json!({ "text": "   " }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    as_user(server.post("/todos"), "alice")
        .json(&json!({ "text": "x", "priority": "urgent" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    as_user(server.post("/todos"), "alice")
        .json(&json!({ "text": "x", "category": "travel" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_and_delete_enforce_ownership() {
    let server = create_test_server().await;
    let task = create_task(&server, "alice", json!({ "text": "Read" })).await;
    let path = format!("/todos/{}", task["id"]);

    as_user(server.put(&path), "mallory")
        .json(&json!({ "completed": true }))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    as_user(server.delete(&path), "mallory")
        .await
        .assert_status(StatusCode::FORBIDDEN);

    as_user(server.put("/todos/9999"), "alice")
        .json(&json!({ "completed": true }))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let response = as_user(server.put(&path), "alice")
        .json(&json!({ "completed": true, "notes": "chapter 3" }))
        .await;
    response.assert_status_ok();
    let updated: Value = response.json();
    assert_eq!(updated["completed"], true);
    assert_eq!(updated["notes"], "chapter 3");
    assert_eq!(updated["text"], "Read");

    as_user(server.delete(&path), "alice").await.assert_status_ok();
    as_user(server.delete(&path), "alice")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_can_clear_due_date() {
    let server = create_test_server().await;
    let task = create_task(
        &server,
        "alice",
        json!({ "text": "Evening run", "dueDate": "2024-03-20T18:00:00Z" }),
    )
    .await;
    assert_eq!(task["dueDate"], "2024-03-20T18:00:00Z");
    let path = format!("/todos/{}", task["id"]);

    let kept: Value = as_user(server.put(&path), "alice")
        .json(&json!({ "completed": true }))
        .await
        .json();
    assert_eq!(kept["dueDate"], "2024-03-20T18:00:00Z");

    let response = as_user(server.put(&path), "alice")
        .json(&json!({ "dueDate": null }))
        .await;
    response.assert_status_ok();
    let cleared: Value = response.json();
    assert!(cleared["dueDate"].is_null());

    let tasks: Value = as_user(server.get("/todos"), "alice").await.json();
    assert!(tasks[0]["dueDate"].is_null());
}

#[tokio::test]
async fn test_malformed_body_returns_error_envelope() {
    let server = create_test_server().await;

    let response = as_user(server.post("/todos"), "alice")
        .json(&json!({ "text": ["not", "a", "string"] }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], 400);
    assert!(body["error"]["message"].is_string());
}

#[tokio::test]
async fn test_reorder_positions() {
    let server = create_test_server().await;
    let a = create_task(&server, "alice", json!({ "text": "a" })).await;
    let b = create_task(&server, "alice", json!({ "text": "b" })).await;
    let foreign = create_task(&server, "bob", json!({ "text": "c" })).await;

    as_user(server.post("/todos/positions"), "alice")
        .json(&json!({ "todos": [
            { "id": a["id"], "position": 1 },
            { "id": foreign["id"], "position": 0 }
        ]}))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    as_user(server.post("/todos/positions"), "alice")
        .json(&json!({ "todos": [
            { "id": a["id"], "position": 1 },
            { "id": a["id"], "position": 0 }
        ]}))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    as_user(server.post("/todos/positions"), "alice")
        .json(&json!({ "todos": [
            { "id": a["id"], "position": 1 },
            { "id": b["id"], "position": 0 }
        ]}))
        .await
        .assert_status_ok();

    let tasks: Value = as_user(server.get("/todos"), "alice").await.json();
    assert_eq!(tasks[0]["text"], "b");
    assert_eq!(tasks[1]["text"], "a");
}

#[tokio::test]
async fn test_clear_completed_and_category_filter() {
    let server = create_test_server().await;
    let done = create_task(&server, "alice", json!({ "text": "done", "category": "work" })).await;
    create_task(&server, "alice", json!({ "text": "open", "category": "health" })).await;

    as_user(server.put(&format!("/todos/{}", done["id"])), "alice")
        .json(&json!({ "completed": true }))
        .await
        .assert_status_ok();

    let health: Value = as_user(server.get("/todos/category/health"), "alice").await.json();
    assert_eq!(health.as_array().unwrap().len(), 1);

    let all: Value = as_user(server.get("/todos/category/all"), "alice").await.json();
    assert_eq!(all.as_array().unwrap().len(), 2);

    let response = as_user(server.delete("/todos/completed"), "alice").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["count"], 1);

    let remaining: Value = as_user(server.get("/todos"), "alice").await.json();
    assert_eq!(remaining.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_productivity_stats() {
    let server = create_test_server().await;

    let high = create_task(
        &server,
        "alice",
        json!({ "text": "Finish report", "category": "work", "priority": "high" }),
    )
    .await;
    create_task(
        &server,
        "alice",
        json!({ "text": "Call mum", "category": "personal", "priority": "medium" }),
    )
    .await;
    create_task(
        &server,
        "alice",
        json!({ "text": "Taxes", "category": "work", "priority": "high" }),
    )
    .await;

    as_user(server.put(&format!("/todos/{}", high["id"])), "alice")
        .json(&json!({ "completed": true }))
        .await
        .assert_status_ok();

    let response = as_user(server.get("/todos/stats?timeframe=week"), "alice").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["timeframe"], "week");
    assert_eq!(body["totalTasks"], 3);
    assert_eq!(body["completedTasks"], 1);
    assert_eq!(body["highPriorityPending"], 1);
    // 45 of 45 + 35 + 45 = 125 points -> 36
    assert_eq!(body["productivityScore"], 36);
    assert_eq!(body["streak"], 0);
    assert_eq!(body["categoryBreakdown"]["work"], 2);
    assert_eq!(body["categoryBreakdown"]["personal"], 1);
    assert!(body["categoryBreakdown"].get("health").is_none());
    assert_eq!(body["dailySeries"].as_array().unwrap().len(), 1);
    assert!(body["mostProductiveDay"].is_string());
}

#[tokio::test]
async fn test_productivity_stats_timeframes() {
    let server = create_test_server().await;

    let response = as_user(server.get("/todos/stats"), "alice").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["timeframe"], "all");
    assert_eq!(body["productivityScore"], 0);
    assert!(body["mostProductiveDay"].is_null());

    let response = as_user(server.get("/todos/stats?timeframe=fortnight"), "alice").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"]["message"].as_str().unwrap().contains("fortnight"));
}

#[tokio::test]
async fn test_mood_entries_and_insights() {
    let server = create_test_server().await;

    for mood in ["happy", "happy", "sad"] {
        as_user(server.post("/mood"), "alice")
            .json(&json!({ "mood": mood, "journal": "today" }))
            .await
            .assert_status(StatusCode::CREATED);
    }

    as_user(server.post("/mood"), "alice")
        .json(&json!({ "journal": "no mood" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    as_user(server.post("/mood"), "alice")
        .json(&json!({ "mood": "ecstatic" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let entries: Value = as_user(server.get("/mood"), "alice").await.json();
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 3);

    let path = format!("/mood/{}", entries[0]["id"]);
    as_user(server.get(&path), "alice").await.assert_status_ok();
    as_user(server.get(&path), "bob")
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let response = as_user(server.get("/mood/insights?timeframe=week"), "alice").await;
    response.assert_status_ok();
    let insights: Value = response.json();
    assert_eq!(insights["totalEntries"], 3);
    assert_eq!(insights["distribution"]["happy"], 2);
    assert_eq!(insights["distribution"]["sad"], 1);
    assert_eq!(insights["distribution"]["angry"], 0);
    assert_eq!(insights["recent"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_daily_quote_and_challenge() {
    let server = create_test_server().await;

    let response = as_user(server.get("/daily/quote"), "alice").await;
    response.assert_status_ok();
    let first: Value = response.json();
    assert!(first["quote"]["text"].is_string());

    let again: Value = as_user(server.get("/daily/quote"), "alice").await.json();
    assert_eq!(first, again);

    let challenge: Value = as_user(server.get("/daily/challenge"), "alice").await.json();
    assert_eq!(challenge["completed"], false);

    let toggled: Value = as_user(server.post("/daily/challenge/toggle"), "alice")
        .await
        .json();
    assert_eq!(toggled["completed"], true);
    assert_eq!(toggled["challenge"], challenge["challenge"]);

    let reread: Value = as_user(server.get("/daily/challenge"), "alice").await.json();
    assert_eq!(reread["completed"], true);

    let other: Value = as_user(server.get("/daily/challenge"), "bob").await.json();
    assert_eq!(other["completed"], false);
}

#[tokio::test]
async fn test_daily_picks_persist_in_storage() {
    let storage = Storage::new("sqlite::memory:").await.unwrap();
    let server = TestServer::new(router(AppState::new(storage, DayBoundary::utc()))).unwrap();

    as_user(server.post("/daily/challenge/toggle"), "alice")
        .await
        .assert_status_ok();

    let challenge: Value = as_user(server.get("/daily/challenge"), "alice").await.json();
    assert_eq!(challenge["completed"], true);
}
