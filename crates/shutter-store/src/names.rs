//! Blob name validation.
//!
//! Valid blob names:
//! - Must be non-empty
//! - Must not contain `/`, `\` or NUL
//! - Must not be `.` or `..`
//! - Must not start with `.` (reserved for in-flight temporary files)

use crate::error::{StoreError, StoreResult};

/// Characters that are forbidden anywhere in a blob name.
const FORBIDDEN_CHARS: &[char] = &['/', '\\', '\0'];

/// Validate a blob name, returning `Ok(())` if it is a safe bare filename.
///
/// # Examples
///
/// ```
/// use shutter_store::names::validate_blob_name;
///
/// assert!(validate_blob_name("1700000000000.jpeg").is_ok());
/// assert!(validate_blob_name("").is_err());
/// assert!(validate_blob_name("../escape.jpeg").is_err());
/// ```
pub fn validate_blob_name(name: &str) -> StoreResult<()> {
    let invalid = |reason: String| StoreError::InvalidName {
        name: name.to_string(),
        reason,
    };

    if name.is_empty() {
        return Err(invalid("blob name must not be empty".into()));
    }

    for ch in FORBIDDEN_CHARS {
        if name.contains(*ch) {
            return Err(invalid(format!("contains forbidden character: {ch:?}")));
        }
    }

    if name.starts_with('.') {
        return Err(invalid("must not start with '.'".into()));
    }

    Ok(())
}
