use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::handler_utils::{analysis_failed, into_json, map_analysis_error, ApiObject};
use crate::api::server::AppState;
use crate::tasks::TaskStatus;
use crate::vision::AnalysisResult;

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeRequest {
    pub media_id: String,
}

#[derive(Debug, Clone, Serialize)]
struct AnalyzeResponse {
    status: TaskStatus,
    task_id: String,
    analysis: AnalysisResult,
}

pub async fn analyze_handler(
    State(state): State<AppState>,
    Json(payload): Json<AnalyzeRequest>,
) -> ApiObject<Value> {
    let tasks = state.tasks.clone();
    let result =
        tokio::task::spawn_blocking(move || tasks.analyze(payload.media_id.as_str())).await;

    match result {
        Ok(Ok(completed)) => (
            StatusCode::OK,
            into_json(AnalyzeResponse {
                status: TaskStatus::Completed,
                task_id: completed.task_id,
                analysis: completed.analysis,
            }),
        ),
        Ok(Err(error)) => map_analysis_error(error),
        Err(join_error) => analysis_failed(format!("analysis task failed: {join_error}")),
    }
}
