// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::sync::Arc;

use crate::service::{ServiceError, TaskService};
use axum::{
    extract::{
        Json, Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::{
    CreateTaskPayload, ListTasksQuery, PriorityPayload, Task, ThemePayload, UpdateTaskPayload,
};
use serde_json::Value;
use tracing::{debug, info};

/// Application state shared by every handler.
pub type SharedService = Arc<TaskService>;

/// Handler for listing tasks, optionally filtered by
/// `completed`, `due_date` and `priority`.
pub async fn list_tasks(
    State(service): State<SharedService>, // State injection (task service)
    query: Result<Query<ListTasksQuery>, QueryRejection>,
) -> Result<Json<Vec<Task>>, AppError> {
    let Query(query) = query?;
    let tasks = service.list(&query).await?;
    info!("Successfully retrieved {} tasks.", tasks.len());
    Ok(Json(tasks))
}

/// Handler for fetching a single task by ID.
pub async fn get_task(
    State(service): State<SharedService>,
    Path(task_id): Path<String>, // Extract task ID from the URL path
) -> Result<Json<Task>, AppError> {
    debug!("Fetching task with ID: {}", task_id);
    Ok(Json(service.get(&task_id).await?))
}

/// Handler for creating a new task.
/// Any JSON body is accepted; one without a usable `title` (including a
/// non-object body such as `null`) is answered with "Title is required".
pub async fn create_task(
    State(service): State<SharedService>,
    body: Result<Json<Value>, JsonRejection>, // Request body as JSON
) -> Result<(StatusCode, Json<Task>), AppError> {
    let Json(body) = body?;
    let payload = CreateTaskPayload::from_body(body);
    debug!("Received request to create task: {:?}", payload.title);

    let new_task = service.create(payload).await?;

    // Return a 201 Created status with the new task as JSON.
    Ok((StatusCode::CREATED, Json(new_task)))
}

/// Handler for a partial update of a task.
pub async fn update_task(
    State(service): State<SharedService>,
    Path(task_id): Path<String>,
    payload: Result<Json<UpdateTaskPayload>, JsonRejection>,
) -> Result<Json<Task>, AppError> {
    let Json(payload) = payload?;
    Ok(Json(service.update(&task_id, payload).await?))
}

/// Handler for deleting a task by ID. Unknown IDs are answered the same way.
pub async fn delete_task(
    State(service): State<SharedService>,
    Path(task_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    debug!("Attempting to delete task with ID: {}", task_id);
    service.delete(&task_id).await?;
    Ok(Json(serde_json::json!({ "message": "Task deleted" })))
}

pub async fn complete_task(
    State(service): State<SharedService>,
    Path(task_id): Path<String>,
) -> Result<Json<Task>, AppError> {
    Ok(Json(service.set_completed(&task_id, true).await?))
}

pub async fn incomplete_task(
    State(service): State<SharedService>,
    Path(task_id): Path<String>,
) -> Result<Json<Task>, AppError> {
    Ok(Json(service.set_completed(&task_id, false).await?))
}

/// Handler for `PUT /api/tasks/{id}/priority`. Rejects unknown priorities.
pub async fn update_priority(
    State(service): State<SharedService>,
    Path(task_id): Path<String>,
    payload: Result<Json<PriorityPayload>, JsonRejection>,
) -> Result<Json<Task>, AppError> {
    let Json(payload) = payload?;
    let priority = payload.priority.as_ref().and_then(Value::as_str);
    Ok(Json(service.set_priority(&task_id, priority).await?))
}

/// Handler for `PUT /api/tasks/{id}/theme`.
pub async fn update_theme(
    State(service): State<SharedService>,
    Path(task_id): Path<String>,
    payload: Result<Json<ThemePayload>, JsonRejection>,
) -> Result<Json<Task>, AppError> {
    let Json(payload) = payload?;
    let theme = payload.theme.as_ref().and_then(Value::as_str);
    Ok(Json(service.set_theme(&task_id, theme).await?))
}

// --- Custom Error Handling ---
// Every failure leaves the API as `{"error": <message>}` with a matching
// status code.

/// Our custom error type for the application.
#[derive(Debug)]
pub struct AppError {
    code: StatusCode,
    message: String,
}

impl AppError {
    fn new(code: StatusCode, message: &str) -> Self {
        Self {
            code,
            message: message.to_string(),
        }
    }
}

/// Allows converting an `anyhow::Error` (coming from the store)
/// into our `AppError`.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        // Log the internal error for debugging.
        tracing::error!("Internal server error: {:?}", err);
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "An internal error occurred.",
        )
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(message) => Self::new(StatusCode::BAD_REQUEST, message),
            ServiceError::NotFound => Self::new(StatusCode::NOT_FOUND, "Task not found"),
            ServiceError::Store(err) => err.into(),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, &rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, &rejection.body_text())
    }
}

/// Allows Axum to convert our `AppError` into an HTTP `Response`.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Client errors are expected traffic; server errors were already
        // logged with their cause.
        if self.code.is_server_error() {
            tracing::error!(
                "Responding with error: status_code={}, message={}",
                self.code.as_u16(),
                self.message
            );
        } else {
            debug!(
                "Responding with error: status_code={}, message={}",
                self.code.as_u16(),
                self.message
            );
        }
        (
            self.code,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}
