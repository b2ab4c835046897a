//! Result and error types for the core library

use thiserror::Error;

/// Core library error type
///
/// Each failure condition the services can report is a distinct variant,
/// so callers dispatch on meaning rather than matching message text.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid or unknown reset token")]
    InvalidToken,

    #[error("Reset token expired")]
    TokenExpired,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a database error
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a conflict error
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Short machine-readable kind, used for privacy-safe logging
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Database(_) => "database",
            Self::NotFound(_) => "not_found",
            Self::Unauthorized => "unauthorized",
            Self::Conflict(_) => "conflict",
            Self::Validation(_) => "validation",
            Self::InvalidToken => "invalid_token",
            Self::TokenExpired => "token_expired",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
            Self::Json(_) => "json",
        }
    }
}

// Storage failures surface as an opaque internal error
impl From<duckdb::Error> for Error {
    fn from(e: duckdb::Error) -> Self {
        Self::Database(e.to_string())
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(Error::Unauthorized.kind(), "unauthorized");
        assert_eq!(Error::not_found("budget").kind(), "not_found");
        assert_eq!(Error::InvalidToken.kind(), "invalid_token");
        assert_eq!(Error::TokenExpired.kind(), "token_expired");
    }

    #[test]
    fn test_error_display() {
        let e = Error::conflict("Email already registered");
        assert_eq!(e.to_string(), "Conflict: Email already registered");

        // Unauthorized carries no detail that could leak account existence
        assert_eq!(Error::Unauthorized.to_string(), "Unauthorized");
    }
}
