/// Unified error types for the LemonPie state engine
use thiserror::Error;

/// Main error type for store operations
///
/// The auth simulator has its own closed failure taxonomy
/// ([`crate::auth::LoginError`]) and never surfaces this type across its
/// public boundary; everything else in the crate propagates `AppError`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Authorization errors
    #[error("Not authorized: {0}")]
    Authorization(String),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Conflict errors (e.g., duplicate email)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Durable client storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Backend API errors - any non-2xx status or error envelope.
    /// A single variant so callers treat every remote failure uniformly
    /// as recoverable and fall back to local data.
    #[error("API error: {0}")]
    Api(String),

    /// Network-level errors from the HTTP client
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for store operations
pub type AppResult<T> = Result<T, AppError>;
