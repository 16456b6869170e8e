use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use database::DatabaseError;
use mongodb::error::ErrorKind;
use thiserror::Error;

/// Message every connectivity failure carries.
pub const STORAGE_UNAVAILABLE: &str = "MongoDB is not connected";

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("MongoDB is not connected: {0}")]
    StorageUnavailable(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type JournalResult<T> = Result<T, JournalError>;

/// Chart or document rendering failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("nothing to plot")]
    EmptySeries,

    #[error("Failed to generate line chart: {0}")]
    Chart(String),

    #[error("Failed to render document: {0}")]
    Document(String),
}

impl JournalError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, JournalError::StorageUnavailable(_))
    }
}

impl From<JournalError> for AppError {
    fn from(err: JournalError) -> Self {
        match err {
            JournalError::StorageUnavailable(_) => AppError::StorageUnavailable(err.to_string()),
            JournalError::Validation(msg) => AppError::BadRequest(msg),
            JournalError::Render(e) => AppError::Render(e.to_string()),
            JournalError::Database(msg) => AppError::InternalServerError(msg),
            JournalError::Serialization(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for JournalError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl From<mongodb::error::Error> for JournalError {
    fn from(err: mongodb::error::Error) -> Self {
        match err.kind.as_ref() {
            ErrorKind::ServerSelection { .. }
            | ErrorKind::Io(_)
            | ErrorKind::DnsResolve { .. }
            | ErrorKind::ConnectionPoolCleared { .. } => {
                JournalError::StorageUnavailable(err.to_string())
            }
            _ => JournalError::Database(err.to_string()),
        }
    }
}

impl From<DatabaseError> for JournalError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Mongo(e) => e.into(),
            DatabaseError::ConnectionFailed(msg) | DatabaseError::HealthCheckFailed(msg) => {
                JournalError::StorageUnavailable(msg)
            }
            #[allow(unreachable_patterns)]
            other => JournalError::Database(other.to_string()),
        }
    }
}

impl From<mongodb::bson::ser::Error> for JournalError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        JournalError::Serialization(format!("BSON serialization error: {}", err))
    }
}

impl From<mongodb::bson::de::Error> for JournalError {
    fn from(err: mongodb::bson::de::Error) -> Self {
        JournalError::Serialization(format!("BSON deserialization error: {}", err))
    }
}

impl From<serde_json::Error> for JournalError {
    fn from(err: serde_json::Error) -> Self {
        JournalError::Serialization(err.to_string())
    }
}
