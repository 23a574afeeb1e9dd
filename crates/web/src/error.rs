use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    #[error(transparent)]
    Core(#[from] chess_coach_core::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Template(e) => {
                tracing::error!("Template error: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            AppError::Core(chess_coach_core::Error::NotFound(msg)) => {
                (StatusCode::NOT_FOUND, format!("Not found: {msg}"))
            }
            AppError::Core(chess_coach_core::Error::ColorLocked) => {
                (StatusCode::CONFLICT, self.to_string())
            }
            AppError::Core(chess_coach_core::Error::Fen(msg)) => {
                tracing::warn!("Cannot draw position: {msg}");
                (StatusCode::BAD_GATEWAY, self.to_string())
            }
            AppError::Core(e) => {
                tracing::error!("Unexpected error: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        };

        (status, Json(json!({ "detail": message }))).into_response()
    }
}
