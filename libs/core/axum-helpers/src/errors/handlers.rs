use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::{ErrorCode, error_response};

/// Router fallback for unknown routes.
pub async fn not_found() -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        "The requested resource was not found".to_string(),
        ErrorCode::NotFound,
    )
    .into_response()
}
