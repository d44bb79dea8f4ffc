//! # AppError
//!
//! Centralized error handling for the portfolio workspace.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;

/// The primary error type for all pf-core operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Resource not found (e.g., Project, Writing, Track)
    #[error("{0} not found: {1}")]
    NotFound(String, String),

    /// Validation failure (e.g., missing title, empty content)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Security/Auth failure (e.g., missing session, bad credentials)
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Resource already exists (e.g., duplicate slug) or was modified concurrently
    #[error("conflict: {0}")]
    Conflict(String),

    /// The document store cannot be reached
    #[error("connection error: {0}")]
    Connection(String),

    /// Infrastructure failure that is not the caller's fault
    #[error("internal service error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::ValidationError(msg.into())
    }

    pub fn not_found(kind: impl Into<String>, key: impl Into<String>) -> Self {
        AppError::NotFound(kind.into(), key.into())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(format!("document (de)serialization failed: {err}"))
    }
}

/// A specialized Result type for portfolio logic.
pub type Result<T> = std::result::Result<T, AppError>;
