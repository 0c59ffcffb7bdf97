use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use serde_json::Value;
use tracing::error;

use crate::api::error::ErrorKind;
use crate::vision::AnalysisError;

pub type ApiObject<T> = (StatusCode, Json<T>);

#[derive(Debug, Clone, Serialize)]
struct ErrorResponse {
    ok: bool,
    error: String,
    error_kind: ErrorKind,
    error_code: String,
}

pub fn error_response(
    status: StatusCode,
    kind: ErrorKind,
    code: impl Into<String>,
    message: impl Into<String>,
) -> ApiObject<Value> {
    (
        status,
        into_json(ErrorResponse {
            ok: false,
            error: message.into(),
            error_kind: kind,
            error_code: code.into(),
        }),
    )
}

pub fn map_analysis_error(error: AnalysisError) -> ApiObject<Value> {
    match error {
        AnalysisError::NotConfigured => error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Config,
            "xai_not_configured",
            "XAI_API_KEY not configured",
        ),
        AnalysisError::Upstream { .. } => error_response(
            StatusCode::BAD_GATEWAY,
            ErrorKind::Provider,
            "upstream_error",
            "AI service unavailable",
        ),
        other @ (AnalysisError::Transport(_) | AnalysisError::InvalidEnvelope(_)) => {
            analysis_failed(other.to_string())
        }
    }
}

/// 500 for faults the caller cannot act on. The message is passed through so
/// clients see what went wrong.
pub fn analysis_failed(message: impl Into<String>) -> ApiObject<Value> {
    let detail = message.into();
    error!(detail = %detail, "analysis failed");
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        ErrorKind::Infra,
        "analysis_failed",
        detail,
    )
}

pub fn into_json(payload: impl Serialize) -> Json<Value> {
    Json(serde_json::to_value(payload).expect("api payload should serialize"))
}
