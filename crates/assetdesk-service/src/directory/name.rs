//! Directory name rules.

use assetdesk_core::error::AppError;
use assetdesk_core::result::AppResult;

const FORBIDDEN: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];
const MAX_NAME_BYTES: usize = 255;

/// Validate a directory name and return it trimmed.
pub fn validate_directory_name(name: &str) -> AppResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("Directory name must not be empty"));
    }
    if trimmed == "." || trimmed == ".." {
        return Err(AppError::validation(format!(
            "Directory name '{trimmed}' is reserved"
        )));
    }
    if trimmed.len() > MAX_NAME_BYTES {
        return Err(AppError::validation(format!(
            "Directory name exceeds {MAX_NAME_BYTES} bytes"
        )));
    }
    if let Some(c) = trimmed
        .chars()
        .find(|c| FORBIDDEN.contains(c) || c.is_control())
    {
        return Err(AppError::validation(format!(
            "Directory name '{trimmed}' contains the illegal character {c:?}"
        )));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assetdesk_core::ErrorKind;

    #[test]
    fn test_valid_names_are_trimmed() {
        assert_eq!(validate_directory_name("  Photos ").unwrap(), "Photos");
        assert_eq!(validate_directory_name("2024 (raw)").unwrap(), "2024 (raw)");
    }

    #[test]
    fn test_invalid_names() {
        for bad in ["", "   ", ".", "..", "a/b", "a\\b", "what?", "x|y", "tab\there"] {
            let err = validate_directory_name(bad).unwrap_err();
            assert_eq!(err.kind, ErrorKind::Validation, "{bad:?}");
        }
        assert!(validate_directory_name(&"x".repeat(256)).is_err());
    }
}
