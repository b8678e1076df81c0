//! HTTP API handlers for Wellnest.
//!
//! Every route except `/health` acts on behalf of the caller named in the
//! `x-user-id` header. Authentication happens upstream; this layer only
//! enforces that users touch their own records.
//!
//! Request bodies are never logged: journal text and task notes stay out of
//! the trace output.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::{FromRequest, FromRequestParts, Path, Query, State},
    http::{StatusCode, request::Parts},
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use chrono::Utc;
use serde_json::{Value, json};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{info, instrument, warn};

use crate::calendar::{DayBoundary, TimeRange};
use crate::daily_pick::{DailyPicker, PickStore, QuoteOfTheDay, TodaysChallenge};
use crate::error::{AppError, AppResult};
use crate::model::{
    Category, CreateMoodRequest, CreateTaskRequest, Mood, MoodEntry, PositionsRequest, Priority,
    Task, TimeframeQuery, UpdateTaskRequest,
};
use crate::mood::{MoodInsights, compute_insights};
use crate::productivity::{ProductivityReport, compute_report};
use crate::storage::Storage;

/// Header carrying the authenticated caller's id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub storage: Storage,
    pub picker: DailyPicker,
    pub day_boundary: DayBoundary,
}

impl AppState {
    /// State whose daily picks are persisted in `storage`.
    pub fn new(storage: Storage, day_boundary: DayBoundary) -> Self {
        let picks: Arc<dyn PickStore> = Arc::new(storage.clone());
        Self::with_pick_store(storage, picks, day_boundary)
    }

    pub fn with_pick_store(
        storage: Storage,
        picks: Arc<dyn PickStore>,
        day_boundary: DayBoundary,
    ) -> Self {
        Self {
            storage,
            picker: DailyPicker::new(picks),
            day_boundary,
        }
    }
}

/// Build the full router with request tracing.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/todos", get(list_tasks).post(create_task))
        .route("/todos/positions", post(update_positions))
        .route("/todos/completed", delete(clear_completed))
        .route("/todos/stats", get(productivity_stats))
        .route("/todos/category/:category", get(tasks_by_category))
        .route("/todos/:id", put(update_task).delete(delete_task))
        .route("/mood", get(list_mood_entries).post(create_mood_entry))
        .route("/mood/insights", get(mood_insights))
        .route("/mood/:id", get(get_mood_entry))
        .route("/daily/quote", get(quote_of_the_day))
        .route("/daily/challenge", get(todays_challenge))
        .route("/daily/challenge/toggle", post(toggle_challenge))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

/// JSON body extractor whose failures use the API error body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// The caller's user id, taken from [`USER_ID_HEADER`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserId(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for UserId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| UserId(value.to_string()))
            .ok_or(AppError::Unauthorized)
    }
}

/// GET /health - Simple health check endpoint.
pub async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

// ============================================================================
// Tasks
// ============================================================================

fn validate_task_fields(
    category: Option<&Category>,
    priority: Option<&Priority>,
) -> AppResult<()> {
    if let Some(category) = category.filter(|c| !c.is_recognized()) {
        return Err(AppError::Validation(format!(
            "unknown category '{category}', expected personal, work, health, education or leisure"
        )));
    }
    if let Some(priority) = priority.filter(|p| !p.is_recognized()) {
        return Err(AppError::Validation(format!(
            "unknown priority '{priority}', expected high, medium or low"
        )));
    }
    Ok(())
}

/// Load a task and check that `user` owns it.
async fn owned_task(storage: &Storage, user: &UserId, id: i64) -> AppResult<Task> {
    let task = storage
        .get_task(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("task {id} not found")))?;

    if task.user_id != user.0 {
        warn!(task_id = id, "Task access denied");
        return Err(AppError::Forbidden(format!("task {id} belongs to another user")));
    }
    Ok(task)
}

/// GET /todos - List the caller's tasks by position, newest first within a
/// position.
#[instrument(skip(state))]
pub async fn list_tasks(State(state): State<AppState>, user: UserId) -> AppResult<Json<Vec<Task>>> {
    let tasks = state.storage.list_tasks(&user.0).await?;
    info!(count = tasks.len(), "Tasks listed");
    Ok(Json(tasks))
}

/// POST /todos - Create a task.
///
/// # Request Body
///
/// ```json
/// {
///     "text": "Evening run",
///     "category": "health",
///     "priority": "high",
///     "dueDate": "2024-03-20T18:00:00Z",
///     "notes": "5k"
/// }
/// ```
///
/// Only `text` is required. Category defaults to `personal`, priority to
/// `medium`. The task is appended after the caller's last position.
///
/// # Response
///
/// `201 Created` with the stored task.
#[instrument(skip(state, request))]
pub async fn create_task(
    State(state): State<AppState>,
    user: UserId,
    AppJson(request): AppJson<CreateTaskRequest>,
) -> AppResult<(StatusCode, Json<Task>)> {
    let text = request.text.trim();
    if text.is_empty() {
        return Err(AppError::Validation("text is required".to_string()));
    }
    validate_task_fields(request.category.as_ref(), request.priority.as_ref())?;

    let now = Utc::now();
    let task = Task {
        id: 0,
        user_id: user.0.clone(),
        text: text.to_string(),
        completed: false,
        category: request.category.unwrap_or_default(),
        priority: request.priority.unwrap_or_default(),
        due_date: request.due_date,
        position: state.storage.next_position(&user.0).await?,
        notes: request.notes.unwrap_or_default(),
        created_at: now,
        updated_at: now,
    };

    let task = state.storage.insert_task(&task).await?;
    info!(
        task_id = task.id,
        category = %task.category,
        priority = %task.priority,
        "Task created"
    );
    Ok((StatusCode::CREATED, Json(task)))
}

/// PUT /todos/:id - Update the provided fields of a task.
#[instrument(skip(state, request))]
pub async fn update_task(
    State(state): State<AppState>,
    user: UserId,
    Path(id): Path<i64>,
    AppJson(request): AppJson<UpdateTaskRequest>,
) -> AppResult<Json<Task>> {
    validate_task_fields(request.category.as_ref(), request.priority.as_ref())?;

    let mut task = owned_task(&state.storage, &user, id).await?;

    if let Some(text) = request.text {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::Validation("text cannot be empty".to_string()));
        }
        task.text = text.to_string();
    }
    if let Some(completed) = request.completed {
        task.completed = completed;
    }
    if let Some(category) = request.category {
        task.category = category;
    }
    if let Some(priority) = request.priority {
        task.priority = priority;
    }
    if let Some(due_date) = request.due_date {
        task.due_date = due_date;
    }
    if let Some(notes) = request.notes {
        task.notes = notes;
    }
    task.updated_at = Utc::now();

    state.storage.update_task(&task).await?;
    info!(task_id = id, completed = task.completed, "Task updated");
    Ok(Json(task))
}

/// DELETE /todos/:id - Delete a task.
#[instrument(skip(state))]
pub async fn delete_task(
    State(state): State<AppState>,
    user: UserId,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    owned_task(&state.storage, &user, id).await?;
    state.storage.delete_task(id).await?;
    info!(task_id = id, "Task deleted");
    Ok(Json(json!({ "message": "task deleted", "id": id })))
}

/// POST /todos/positions - Reorder tasks.
///
/// # Request Body
///
/// ```json
/// { "todos": [ { "id": 3, "position": 0 }, { "id": 1, "position": 1 } ] }
/// ```
///
/// All-or-nothing: if any id is missing or not the caller's, nothing changes
/// and the response is `403`.
#[instrument(skip(state, request))]
pub async fn update_positions(
    State(state): State<AppState>,
    user: UserId,
    AppJson(request): AppJson<PositionsRequest>,
) -> AppResult<Json<Value>> {
    let applied = state
        .storage
        .update_positions(&user.0, &request.todos)
        .await?;

    if !applied {
        warn!(count = request.todos.len(), "Reorder rejected");
        return Err(AppError::Forbidden(
            "one or more tasks are missing or belong to another user".to_string(),
        ));
    }

    info!(count = request.todos.len(), "Task positions updated");
    Ok(Json(json!({ "message": "positions updated", "count": request.todos.len() })))
}

/// DELETE /todos/completed - Remove all of the caller's completed tasks.
#[instrument(skip(state))]
pub async fn clear_completed(State(state): State<AppState>, user: UserId) -> AppResult<Json<Value>> {
    let count = state.storage.clear_completed(&user.0).await?;
    info!(count, "Completed tasks cleared");
    Ok(Json(json!({ "message": "completed tasks cleared", "count": count })))
}

/// GET /todos/category/:category - Tasks in one category (`all` for every
/// task).
#[instrument(skip(state))]
pub async fn tasks_by_category(
    State(state): State<AppState>,
    user: UserId,
    Path(category): Path<String>,
) -> AppResult<Json<Vec<Task>>> {
    let tasks = state
        .storage
        .list_tasks_by_category(&user.0, &category)
        .await?;
    info!(category = %category, count = tasks.len(), "Tasks listed by category");
    Ok(Json(tasks))
}

/// GET /todos/stats - Productivity report.
///
/// # Query Parameters
///
/// - `timeframe` (optional): `day`, `week`, `month`, `year` or `all`
///   (default: all)
///
/// # Response
///
/// ```json
/// {
///     "timeframe": "week",
///     "productivityScore": 56,
///     "totalTasks": 2,
///     "completedTasks": 1,
///     "completionRate": 50.0,
///     "highPriorityPending": 0,
///     "mostProductiveDay": "2024-03-19",
///     "streak": 1,
///     "categoryBreakdown": { "work": 2 },
///     "dailySeries": [
///         { "date": "2024-03-19", "score": 56, "totalTasks": 2, "completedTasks": 1 }
///     ]
/// }
/// ```
#[instrument(skip(state))]
pub async fn productivity_stats(
    State(state): State<AppState>,
    user: UserId,
    Query(query): Query<TimeframeQuery>,
) -> AppResult<Json<ProductivityReport>> {
    let range = TimeRange::from_selector(query.timeframe.as_deref())?;
    let tasks = state.storage.list_tasks(&user.0).await?;

    let report = compute_report(&tasks, range, Utc::now(), state.day_boundary);
    info!(
        timeframe = %range,
        score = report.overall_score,
        streak = report.streak,
        total = report.total_tasks,
        "Productivity report served"
    );
    Ok(Json(report))
}

// ============================================================================
// Mood entries
// ============================================================================

/// POST /mood - Record a mood with an optional journal entry.
///
/// # Request Body
///
/// ```json
/// { "mood": "good", "journal": "Slept well." }
/// ```
#[instrument(skip(state, request))]
pub async fn create_mood_entry(
    State(state): State<AppState>,
    user: UserId,
    AppJson(request): AppJson<CreateMoodRequest>,
) -> AppResult<(StatusCode, Json<MoodEntry>)> {
    let raw = request
        .mood
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .ok_or_else(|| AppError::Validation("mood is required".to_string()))?;
    let mood = Mood::parse(raw).ok_or_else(|| {
        AppError::Validation(format!(
            "unknown mood '{raw}', expected happy, good, neutral, sad or angry"
        ))
    })?;

    let entry = MoodEntry {
        id: 0,
        user_id: user.0.clone(),
        mood,
        journal: request.journal.unwrap_or_default(),
        predicted_mood: None,
        created_at: Utc::now(),
    };

    let entry = state.storage.insert_mood_entry(&entry).await?;
    info!(entry_id = entry.id, mood = mood.as_str(), "Mood recorded");
    Ok((StatusCode::CREATED, Json(entry)))
}

/// GET /mood - The caller's mood entries, newest first.
#[instrument(skip(state))]
pub async fn list_mood_entries(
    State(state): State<AppState>,
    user: UserId,
) -> AppResult<Json<Vec<MoodEntry>>> {
    let entries = state.storage.list_mood_entries(&user.0).await?;
    info!(count = entries.len(), "Mood entries listed");
    Ok(Json(entries))
}

/// GET /mood/:id - One mood entry.
#[instrument(skip(state))]
pub async fn get_mood_entry(
    State(state): State<AppState>,
    user: UserId,
    Path(id): Path<i64>,
) -> AppResult<Json<MoodEntry>> {
    let entry = state
        .storage
        .get_mood_entry(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("mood entry {id} not found")))?;

    if entry.user_id != user.0 {
        warn!(entry_id = id, "Mood entry access denied");
        return Err(AppError::Forbidden(format!(
            "mood entry {id} belongs to another user"
        )));
    }
    Ok(Json(entry))
}

/// GET /mood/insights - Mood distribution and per-day counts.
///
/// # Query Parameters
///
/// - `timeframe` (optional): `day`, `week`, `month`, `year` or `all`
///   (default: all)
#[instrument(skip(state))]
pub async fn mood_insights(
    State(state): State<AppState>,
    user: UserId,
    Query(query): Query<TimeframeQuery>,
) -> AppResult<Json<MoodInsights>> {
    let range = TimeRange::from_selector(query.timeframe.as_deref())?;
    let entries = state.storage.list_mood_entries(&user.0).await?;

    let insights = compute_insights(&entries, range, Utc::now(), state.day_boundary);
    info!(
        timeframe = %range,
        total = insights.total_entries,
        "Mood insights served"
    );
    Ok(Json(insights))
}

// ============================================================================
// Daily picks
// ============================================================================

/// GET /daily/quote - Today's quote for the caller.
#[instrument(skip(state))]
pub async fn quote_of_the_day(
    State(state): State<AppState>,
    user: UserId,
) -> AppResult<Json<QuoteOfTheDay>> {
    let today = state.day_boundary.day_of(Utc::now());
    let quote = state
        .picker
        .quote_of_the_day(&user.0, today)
        .await?
        .ok_or_else(|| AppError::NotFound("no quotes available".to_string()))?;
    Ok(Json(quote))
}

/// GET /daily/challenge - Today's challenge and whether it is done.
#[instrument(skip(state))]
pub async fn todays_challenge(
    State(state): State<AppState>,
    user: UserId,
) -> AppResult<Json<TodaysChallenge>> {
    let today = state.day_boundary.day_of(Utc::now());
    let challenge = state
        .picker
        .todays_challenge(&user.0, today)
        .await?
        .ok_or_else(|| AppError::NotFound("no challenges available".to_string()))?;
    Ok(Json(challenge))
}

/// POST /daily/challenge/toggle - Flip today's challenge completion.
#[instrument(skip(state))]
pub async fn toggle_challenge(
    State(state): State<AppState>,
    user: UserId,
) -> AppResult<Json<TodaysChallenge>> {
    let today = state.day_boundary.day_of(Utc::now());
    let challenge = state
        .picker
        .toggle_challenge(&user.0, today)
        .await?
        .ok_or_else(|| AppError::NotFound("no challenges available".to_string()))?;
    info!(completed = challenge.completed, "Challenge toggled");
    Ok(Json(challenge))
}
