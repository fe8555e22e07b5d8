use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use booking_core::StoreError;
use serde_json::json;

/// API error type that maps to JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request body could not be decoded into the expected shape.
    #[error("rejected request body: {0}")]
    Rejected(#[from] JsonRejection),

    #[error("validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// A server-side failure with a message meant for the caller.
    #[error("server error: {0}")]
    Server(&'static str),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            ApiError::Rejected(rejection) => {
                let status = rejection.status();
                let error_type = if status == StatusCode::UNPROCESSABLE_ENTITY {
                    "validationError"
                } else {
                    "badRequest"
                };
                (status, error_type, rejection.body_text())
            }
            ApiError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validationError",
                errors.to_string(),
            ),
            ApiError::Unavailable(msg) => {
                tracing::error!("Service unavailable: {msg}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "serviceUnavailable",
                    "The database is not reachable".to_string(),
                )
            }
            ApiError::Server(msg) => {
                tracing::error!("Server error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internalError",
                    msg.to_string(),
                )
            }
            ApiError::Store(err) => {
                tracing::error!("Store error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internalError",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "error": {
                "type": error_type,
                "message": message,
                "statusCode": status.as_u16(),
            }
        });

        (status, Json(body)).into_response()
    }
}

/// Convenience type alias for route handlers.
pub type ApiResult<T> = Result<T, ApiError>;
