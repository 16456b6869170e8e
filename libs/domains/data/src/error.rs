use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use database::DatabaseError;
use mongodb::error::ErrorKind;
use thiserror::Error;

/// Rejection message for queries starting with `*`.
pub const LEADING_WILDCARD: &str = "Wildcard (*) cannot be the first character in search query";

#[derive(Debug, Error)]
pub enum DataError {
    #[error("{0}")]
    InvalidQuery(String),

    #[error("MongoDB is not connected: {0}")]
    StorageUnavailable(String),

    #[error("Database error: {0}")]
    Database(String),
}

pub type DataResult<T> = Result<T, DataError>;

impl DataError {
    pub fn leading_wildcard() -> Self {
        DataError::InvalidQuery(LEADING_WILDCARD.to_string())
    }
}

impl From<DataError> for AppError {
    fn from(err: DataError) -> Self {
        match err {
            DataError::InvalidQuery(msg) => AppError::InvalidQuery(msg),
            DataError::StorageUnavailable(_) => AppError::StorageUnavailable(err.to_string()),
            DataError::Database(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for DataError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl From<mongodb::error::Error> for DataError {
    fn from(err: mongodb::error::Error) -> Self {
        match err.kind.as_ref() {
            ErrorKind::ServerSelection { .. }
            | ErrorKind::Io(_)
            | ErrorKind::DnsResolve { .. }
            | ErrorKind::ConnectionPoolCleared { .. } => {
                DataError::StorageUnavailable(err.to_string())
            }
            _ => DataError::Database(err.to_string()),
        }
    }
}

impl From<DatabaseError> for DataError {
    fn from(err: DatabaseError) -> Self {
        DataError::StorageUnavailable(err.to_string())
    }
}
