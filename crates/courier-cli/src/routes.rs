//! HTTP route handlers.
//!
//! - GET  /                - start form
//! - POST /                - start a task (multipart)
//! - POST /stop            - stop a task (urlencoded or multipart `taskId`)
//! - GET  /status          - task table
//! - GET  /api/tasks       - all tasks as JSON
//! - GET  /api/tasks/{id}  - one task as JSON

use std::sync::Arc;

use axum::{
    Form, Json, Router,
    extract::{FromRequest, Multipart, Path, Request, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use courier_core::domain::TaskSnapshot;
use courier_core::{CourierError, StatusCounts, StopOutcome, TaskManager};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::form::{StopForm, read_start_form, read_stop_form};
use crate::render;

/// Shared handler state.
pub struct AppState {
    pub manager: Arc<TaskManager>,
}

impl AppState {
    pub fn new(manager: Arc<TaskManager>) -> Self {
        Self { manager }
    }
}

/// Response for listing tasks.
#[derive(Debug, Serialize)]
pub struct TaskListResponse {
    pub count: usize,
    pub counts: StatusCounts,
    pub tasks: Vec<TaskSnapshot>,
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index).post(start_task))
        .route("/stop", post(stop_task))
        .route("/status", get(status_page))
        .route("/api/tasks", get(list_tasks))
        .route("/api/tasks/{id}", get(get_task))
        .with_state(state)
}

fn status_code(err: &CourierError) -> StatusCode {
    match err {
        CourierError::Validation(_) => StatusCode::BAD_REQUEST,
        CourierError::NotFound(_) => StatusCode::NOT_FOUND,
        CourierError::Store(_) | CourierError::Build(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// GET /
async fn index() -> impl IntoResponse {
    Html(render::start_page(None))
}

/// POST /
async fn start_task(State(state): State<Arc<AppState>>, multipart: Multipart) -> Response {
    let request = match read_start_form(multipart).await {
        Ok(request) => request,
        Err(e) => {
            warn!("unreadable start form: {e}");
            return (
                StatusCode::BAD_REQUEST,
                Html(render::start_page(Some(&format!("Could not read the form: {e}")))),
            )
                .into_response();
        }
    };

    match state.manager.start(&request).await {
        Ok(receipt) => Html(render::started_page(&receipt)).into_response(),
        Err(err) => {
            let code = status_code(&err);
            if code.is_server_error() {
                error!("failed to start task: {err}");
            } else {
                info!("start rejected: {err}");
            }
            (code, Html(render::start_page(Some(&err.to_string())))).into_response()
        }
    }
}

/// POST /stop
async fn stop_task(State(state): State<Arc<AppState>>, req: Request) -> Response {
    let is_multipart = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("multipart/form-data"));

    let form = if is_multipart {
        match Multipart::from_request(req, &()).await {
            Ok(multipart) => read_stop_form(multipart).await.map_err(|e| e.to_string()),
            Err(rejection) => Err(rejection.body_text()),
        }
    } else {
        Form::<StopForm>::from_request(req, &())
            .await
            .map(|Form(form)| form)
            .map_err(|rejection| rejection.body_text())
    };
    let form = match form {
        Ok(form) => form,
        Err(message) => {
            warn!("unreadable stop form: {message}");
            return (StatusCode::BAD_REQUEST, Html(render::start_page(Some(&message))))
                .into_response();
        }
    };

    let task_id = form.task_id.trim();
    let (code, message) = match state.manager.stop(task_id).await {
        Ok(StopOutcome::Signalled) => (
            StatusCode::OK,
            format!("Stop signal sent to task {task_id}. Check the status below."),
        ),
        Ok(StopOutcome::NotRunning(status)) => (
            StatusCode::OK,
            format!("Task {task_id} is {status}; nothing to stop."),
        ),
        Err(err @ CourierError::NotFound(_)) => (
            status_code(&err),
            format!("No task with ID '{task_id}' was found."),
        ),
        Err(err) => {
            error!("failed to stop task {task_id}: {err}");
            (status_code(&err), err.to_string())
        }
    };

    let tasks = state.manager.status().await;
    (code, Html(render::status_page(&tasks, Some(&message)))).into_response()
}

/// GET /status
async fn status_page(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let tasks = state.manager.status().await;
    Html(render::status_page(&tasks, None))
}

/// GET /api/tasks
async fn list_tasks(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let tasks = state.manager.status().await;
    Json(TaskListResponse {
        count: tasks.len(),
        counts: StatusCounts::from_snapshots(&tasks),
        tasks,
    })
}

/// GET /api/tasks/{id}
async fn get_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    match state.manager.get(&id).await {
        Ok(task) => Json(task).into_response(),
        Err(err) => (
            status_code(&err),
            Json(serde_json::json!({"error": err.to_string()})),
        )
            .into_response(),
    }
}

#[cfg(test)]
#[path = "routes_tests.rs"]
mod tests;
