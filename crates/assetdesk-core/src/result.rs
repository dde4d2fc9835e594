//! Convenience result type alias for AssetDesk.

use crate::error::AppError;

/// A specialized `Result` type for AssetDesk operations.
pub type AppResult<T> = Result<T, AppError>;
