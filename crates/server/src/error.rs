use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use services::services::{path_integrity::PathIntegrityError, progression::ProgressionError};
use thiserror::Error;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Progression(#[from] ProgressionError),
    #[error(transparent)]
    PathIntegrity(#[from] PathIntegrityError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Progression(e) => match e {
                ProgressionError::UserNotFound
                | ProgressionError::NodeNotFound
                | ProgressionError::PathNotInitialized => StatusCode::NOT_FOUND,
                ProgressionError::NodeAlreadyCompleted | ProgressionError::NoHeartsRemaining => {
                    StatusCode::CONFLICT
                }
                ProgressionError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::PathIntegrity(_) | ApiError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ApiResponse::<()>::error(&self.to_string());
        (status, Json(body)).into_response()
    }
}
