//! Type-safe error codes for API responses.
//!
//! Each code has a string identifier for clients, an integer for logs and
//! dashboards, and a default message.
//!
//! ```rust
//! use axum_helpers::errors::ErrorCode;
//!
//! let code = ErrorCode::InvalidQuery;
//! assert_eq!(code.as_str(), "INVALID_QUERY");
//! assert_eq!(code.code(), 1012);
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Client errors (1000-1999)
    ValidationError,
    BadRequest,
    NotFound,
    InvalidQuery,

    // Server errors
    InternalError,
    ServiceUnavailable,

    // Storage errors (2000-2999)
    StorageUnavailable,

    // Rendering errors (3000s)
    RenderError,

    // I/O errors (4000s)
    IoError,

    // JSON errors (5000s)
    SerdeJsonError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationError => "VALIDATION_ERROR",
            Self::BadRequest => "BAD_REQUEST",
            Self::NotFound => "NOT_FOUND",
            Self::InvalidQuery => "INVALID_QUERY",
            Self::InternalError => "INTERNAL_ERROR",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            Self::StorageUnavailable => "STORAGE_UNAVAILABLE",
            Self::RenderError => "RENDER_ERROR",
            Self::IoError => "IO_ERROR",
            Self::SerdeJsonError => "SERDE_JSON_ERROR",
        }
    }

    /// Integer code used in structured logs.
    ///
    /// Ranges: 1000s client, 2000s storage, 3000s rendering, 4000s I/O,
    /// 5000s serialization.
    pub fn code(&self) -> i32 {
        match self {
            Self::ValidationError => 1001,
            Self::NotFound => 1004,
            Self::InternalError => 1005,
            Self::ServiceUnavailable => 1011,
            Self::InvalidQuery => 1012,
            Self::BadRequest => 1013,

            Self::StorageUnavailable => 2001,

            Self::RenderError => 3001,

            Self::IoError => 4001,

            Self::SerdeJsonError => 5001,
        }
    }

    pub fn default_message(&self) -> &'static str {
        match self {
            Self::ValidationError => "Request validation failed",
            Self::BadRequest => "Bad request",
            Self::NotFound => "Resource not found",
            Self::InvalidQuery => "Invalid search query",
            Self::InternalError => "An internal error occurred",
            Self::ServiceUnavailable => "Service temporarily unavailable",
            Self::StorageUnavailable => "Storage is not available",
            Self::RenderError => "Failed to render document",
            Self::IoError => "An I/O error occurred",
            Self::SerdeJsonError => "Failed to process JSON data",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_unique() {
        let all = [
            ErrorCode::ValidationError,
            ErrorCode::BadRequest,
            ErrorCode::NotFound,
            ErrorCode::InvalidQuery,
            ErrorCode::InternalError,
            ErrorCode::ServiceUnavailable,
            ErrorCode::StorageUnavailable,
            ErrorCode::RenderError,
            ErrorCode::IoError,
            ErrorCode::SerdeJsonError,
        ];
        let mut codes: Vec<i32> = all.iter().map(|c| c.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), all.len());
    }

    #[test]
    fn test_serde_matches_as_str() {
        let json = serde_json::to_string(&ErrorCode::StorageUnavailable).unwrap();
        assert_eq!(json, "\"STORAGE_UNAVAILABLE\"");
        assert_eq!(ErrorCode::StorageUnavailable.to_string(), "STORAGE_UNAVAILABLE");
    }
}
