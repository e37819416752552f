//! HTTP request handlers

use super::types::{ErrorResponse, ModelsResponse};
use super::AppState;
use crate::relay::{RelayError, RelayRequest};
use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures::StreamExt;
use std::convert::Infallible;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Streaming chat relay
        .route("/api/chat", post(chat))
        // Model info for the pickers
        .route("/api/models", get(list_models))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Chat relay
// ============================================================

async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<RelayRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = payload.map_err(|e| {
        tracing::warn!(error = %e.body_text(), "Unreadable chat request");
        AppError::Internal("Internal Server Error".to_string())
    })?;

    let stream = state.relay.open(&request).await?;
    let body = Body::from_stream(stream.map(Ok::<_, Infallible>));

    Ok((
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
        ],
        body,
    )
        .into_response())
}

// ============================================================
// Models
// ============================================================

async fn list_models(State(state): State<AppState>) -> Json<ModelsResponse> {
    Json(ModelsResponse {
        models: state.llm_registry.available_model_info(),
        default: state.llm_registry.default_model_id().to_string(),
    })
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> &'static str {
    concat!("leemer-chat ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    Internal(String),
}

impl From<RelayError> for AppError {
    fn from(err: RelayError) -> Self {
        match err {
            RelayError::Upstream { status, message } => {
                tracing::error!(status, error = %message, "Upstream provider rejected request");
                AppError::Internal(format!("Upstream provider returned {status}"))
            }
            RelayError::Provider(e) => {
                tracing::error!(error = %e, kind = e.kind.as_str(), "Relay failed");
                AppError::Internal("Internal Server Error".to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let AppError::Internal(message) = self;
        let body = Json(ErrorResponse::new(message));
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}
