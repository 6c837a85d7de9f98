use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use crate::errors::AppError;

// Converts AppError into a JSON error response with a matching status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            // Authentication failures are all 401 except the role check,
            // which the client has to tell apart
            AppError::Auth(_) | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::WrongRole { .. } => StatusCode::FORBIDDEN,

            // Validation errors are bad requests
            AppError::MissingField(_) => StatusCode::BAD_REQUEST,
            AppError::DuplicateEmail(_) | AppError::SlotUnavailable(_) => StatusCode::CONFLICT,
            AppError::SlotNotFound(_) => StatusCode::NOT_FOUND,

            // Everything else is an internal error
            AppError::Redis(_)
            | AppError::Serialization(_)
            | AppError::Hashing(_)
            | AppError::Storage(_) => {
                tracing::error!("Internal error: {}", self);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
