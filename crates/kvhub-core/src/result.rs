//! Convenience result type alias for KvHub.

use crate::error::AppError;

/// A specialized `Result` type for KvHub operations.
pub type AppResult<T> = Result<T, AppError>;
