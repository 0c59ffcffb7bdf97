use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::{ServiceConfig, PROVIDER_TIMEOUT};
use crate::tasks::{TaskService, TaskStore};
use crate::vision::{AnalysisError, SharedVisionProvider, VisionAnalyzer, XaiVisionProvider};

pub const SERVICE_NAME: &str = "HeirLink AI Service";

#[derive(Clone)]
pub struct AppState {
    pub service_name: &'static str,
    pub service_version: &'static str,
    pub tasks: TaskService,
}

impl AppState {
    pub fn new(config: &ServiceConfig, provider: SharedVisionProvider) -> Self {
        Self::with_store(config, provider, Arc::new(TaskStore::new()))
    }

    pub fn with_store(
        config: &ServiceConfig,
        provider: SharedVisionProvider,
        store: Arc<TaskStore>,
    ) -> Self {
        Self {
            service_name: SERVICE_NAME,
            service_version: env!("CARGO_PKG_VERSION"),
            tasks: TaskService::new(store, VisionAnalyzer::new(config, provider)),
        }
    }

    pub fn xai_configured(&self) -> bool {
        self.tasks.analyzer().is_configured()
    }
}

/// Router backed by the live xAI transport. Call from a blocking context;
/// `serve` does this on `spawn_blocking`.
pub fn build_router(config: &ServiceConfig) -> Result<Router, AnalysisError> {
    let provider: SharedVisionProvider = Arc::new(XaiVisionProvider::new(PROVIDER_TIMEOUT)?);
    Ok(build_router_with_provider(config, provider))
}

pub fn build_router_with_provider(config: &ServiceConfig, provider: SharedVisionProvider) -> Router {
    build_router_with_state(AppState::new(config, provider))
}

pub fn build_router_with_state(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/api/animate", post(crate::api::media_tasks::animate_handler))
        .route("/api/restore", post(crate::api::media_tasks::restore_handler))
        .route("/api/analyze", post(crate::api::analyze::analyze_handler))
        .route(
            "/api/task/{task_id}",
            get(crate::api::media_tasks::task_status_handler),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(config: ServiceConfig) -> std::io::Result<()> {
    let addr: SocketAddr = config
        .bind
        .parse()
        .map_err(|e| std::io::Error::other(format!("invalid bind address '{}': {e}", config.bind)))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let router_config = config.clone();
    let app = tokio::task::spawn_blocking(move || build_router(&router_config))
        .await
        .map_err(|e| std::io::Error::other(format!("router setup task failed: {e}")))?
        .map_err(std::io::Error::other)?;
    info!(
        bind = %addr,
        xai_configured = config.xai_configured(),
        "starting heirlink-ai-service HTTP surface"
    );
    axum::serve(listener, app).await
}

async fn root_handler(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "message": state.service_name,
            "status": "running",
        })),
    )
}

async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "xai_configured": state.xai_configured(),
        })),
    )
}
