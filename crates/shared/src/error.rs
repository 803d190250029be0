//! Application-wide error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types surfaced at the HTTP boundary.
#[derive(Debug, Error)]
pub enum AppError {
    /// Caller does not own the target resource, or presented no valid token.
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed input, rejected before any write.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The storage layer failed; nothing was committed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// The entity write committed but the balance update did not.
    #[error("Partially committed: {0}")]
    PartialCommit(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Validation(_) | Self::Storage(_) | Self::PartialCommit(_) => 400,
            Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::PartialCommit(_) => "PARTIAL_COMMIT",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
