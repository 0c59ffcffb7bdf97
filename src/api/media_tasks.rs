use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::api::handler_utils::{into_json, ApiObject};
use crate::api::server::AppState;
use crate::tasks::{TaskKind, TaskStatus};

#[derive(Debug, Clone, Deserialize)]
pub struct AnimateRequest {
    pub media_id: String,
    #[serde(default)]
    pub style: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RestoreRequest {
    pub media_id: String,
    #[serde(default)]
    pub enhancement_level: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
struct PendingTaskResponse {
    status: TaskStatus,
    task_id: String,
    message: &'static str,
}

#[derive(Debug, Clone, Serialize)]
struct MissingTaskResponse {
    task_id: String,
    status: TaskStatus,
}

const DEFAULT_ANIMATION_STYLE: &str = "natural";
const DEFAULT_ENHANCEMENT_LEVEL: i64 = 5;

pub async fn animate_handler(
    State(state): State<AppState>,
    Json(payload): Json<AnimateRequest>,
) -> ApiObject<Value> {
    debug!(
        style = payload.style.as_deref().unwrap_or(DEFAULT_ANIMATION_STYLE),
        "animate requested"
    );
    let record = state
        .tasks
        .submit_pending(TaskKind::Animate, payload.media_id.as_str());
    pending(record.id, "Animation is not yet implemented")
}

pub async fn restore_handler(
    State(state): State<AppState>,
    Json(payload): Json<RestoreRequest>,
) -> ApiObject<Value> {
    debug!(
        enhancement_level = payload
            .enhancement_level
            .unwrap_or(DEFAULT_ENHANCEMENT_LEVEL),
        "restore requested"
    );
    let record = state
        .tasks
        .submit_pending(TaskKind::Restore, payload.media_id.as_str());
    pending(record.id, "Restoration is not yet implemented")
}

pub async fn task_status_handler(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> ApiObject<Value> {
    match state.tasks.status(task_id.as_str()) {
        Some(record) => (StatusCode::OK, into_json(record)),
        None => (
            StatusCode::OK,
            into_json(MissingTaskResponse {
                task_id,
                status: TaskStatus::NotFound,
            }),
        ),
    }
}

fn pending(task_id: String, message: &'static str) -> ApiObject<Value> {
    (
        StatusCode::OK,
        into_json(PendingTaskResponse {
            status: TaskStatus::Processing,
            task_id,
            message,
        }),
    )
}
