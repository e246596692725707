//! Result type alias
//!
//! Convenience alias that uses [`AppExportError`] as the error type.

use super::errors::AppExportError;

/// Result type alias for export operations
///
/// # Examples
///
/// ```
/// use appexport::domain::result::Result;
/// use appexport::domain::errors::AppExportError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(AppExportError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, AppExportError>;
