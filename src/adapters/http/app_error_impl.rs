use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::app_error::AppError;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log before the error collapses into a status response.
        tracing::error!(error = ?self, "Request failed");

        let status = match &self {
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::OwnershipViolation => StatusCode::FORBIDDEN,
            AppError::InvalidReference(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::InviteInvalid(_) => StatusCode::CONFLICT,
        };
        // Internal detail stays in the log.
        let message = match &self {
            AppError::Database(_) => "Database error".to_string(),
            AppError::Internal(_) => "Internal error".to_string(),
            other => other.to_string(),
        };
        (
            status,
            Json(serde_json::json!({
                "code": self.code().as_str(),
                "message": message,
            })),
        )
            .into_response()
    }
}
