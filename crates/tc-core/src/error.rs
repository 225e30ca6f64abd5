//! # AppError
//!
//! Centralized error handling for the Town Chronicle service.
//! The derivation functions never fail; everything here comes from
//! input validation, permissions, or the persistence adapters.

use thiserror::Error;

/// The primary error type for all tc-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., Town, Story)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Validation failure (e.g., empty author, content too long, unknown location)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// No identity where one is required
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Identity present but not allowed (e.g., not the town owner, private town)
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Infrastructure failure (e.g., DB down, store file unwritable)
    #[error("internal service error: {0}")]
    Internal(String),

    /// Resource already exists (e.g., duplicate share id)
    #[error("conflict: {0}")]
    Conflict(String),
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(format!("{err:#}"))
    }
}

/// A specialized Result type for Town Chronicle logic.
pub type Result<T> = std::result::Result<T, AppError>;
