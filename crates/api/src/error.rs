use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use talio_core::error::CoreError;
use talio_core::types::DbId;

/// Errors a handler can answer with.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The password sent for a protected board did not match.
    #[error("Wrong password for board {0}")]
    PasswordDenied(DbId),

    #[error("Wrong admin password")]
    AdminDenied,

    #[error("No board with join code {0}")]
    UnknownJoinCode(String),

    /// A tag rename whose old and new copies name different boards.
    #[error("Tags belong to boards {0} and {1}")]
    MixedBoards(DbId, DbId),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Status and machine-readable code sent to the client.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Core(CoreError::NotFound { .. }) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::Core(CoreError::Validation(_)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
            }
            AppError::Core(CoreError::Internal(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
            AppError::PasswordDenied(_) => (StatusCode::FORBIDDEN, "PASSWORD_DENIED"),
            AppError::AdminDenied => (StatusCode::FORBIDDEN, "ADMIN_DENIED"),
            AppError::UnknownJoinCode(_) => (StatusCode::BAD_REQUEST, "UNKNOWN_JOIN_CODE"),
            AppError::MixedBoards(..) => (StatusCode::BAD_REQUEST, "MIXED_BOARDS"),
        }
    }

    fn message(&self) -> String {
        match self {
            AppError::Core(CoreError::NotFound { entity, id }) => {
                format!("{entity} with id {id} not found")
            }
            AppError::Core(CoreError::Validation(msg)) => msg.clone(),
            AppError::Core(CoreError::Internal(msg)) => {
                tracing::error!(error = %msg, "Internal error");
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status == StatusCode::FORBIDDEN {
            tracing::warn!(code, "Password rejected");
        }
        let body = json!({
            "error": self.message(),
            "code": code,
        });
        (status, axum::Json(body)).into_response()
    }
}
