use crate::pipeline::NewsPipeline;
use crate::types::{Cohort, PipelineError};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

pub struct AppState {
    pub pipeline: NewsPipeline,
}

#[derive(Debug, Deserialize)]
pub struct NewsRequest {
    pub generation: Cohort,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl From<&PipelineError> for ErrorBody {
    fn from(e: &PipelineError) -> Self {
        Self {
            error: e.summary().to_string(),
            details: Some(e.to_string()),
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        .route("/", post(get_news).options(preflight))
        .route("/api/news", post(get_news).options(preflight))
        .route("/health", get(health))
        .layer(cors)
        .with_state(Arc::new(state))
}

pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, create_app(state)).await
}

async fn get_news(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewsRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            let body = ErrorBody {
                error: "Invalid request".to_string(),
                details: Some(rejection.body_text()),
            };
            return (StatusCode::BAD_REQUEST, Json(body)).into_response();
        }
    };

    match state.pipeline.run(request.generation).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome.articles)).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorBody::from(&e))).into_response(),
    }
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
