//! Upload admission rules.

use assetdesk_core::config::upload::UploadConfig;
use assetdesk_core::error::AppError;
use assetdesk_core::mime::{mime_from_name, type_pattern_matches, OCTET_STREAM};
use assetdesk_core::result::AppResult;

/// Size and type limits checked before an upload takes a slot.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    max_file_size: u64,
    allowed_file_types: Vec<String>,
}

impl UploadPolicy {
    /// Build a policy from the upload configuration.
    pub fn from_config(config: &UploadConfig) -> Self {
        Self {
            max_file_size: config.max_file_size,
            allowed_file_types: config
                .allowed_file_types
                .iter()
                .map(|t| t.trim().to_ascii_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    /// Maximum accepted size in bytes.
    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Whether a file with this name passes the type allowlist.
    pub fn is_allowed_type(&self, name: &str) -> bool {
        let mime = mime_from_name(name).unwrap_or_else(|| OCTET_STREAM.to_string());
        self.type_matches(name, &mime)
    }

    fn type_matches(&self, name: &str, mime: &str) -> bool {
        self.allowed_file_types.is_empty()
            || self
                .allowed_file_types
                .iter()
                .any(|pattern| type_pattern_matches(pattern, mime, name))
    }

    /// Check a candidate's declared name and size.
    pub fn check(&self, name: &str, size: u64) -> AppResult<()> {
        if name.trim().is_empty() {
            return Err(AppError::validation("upload: file name must not be empty"));
        }
        if size == 0 {
            return Err(AppError::validation(format!("upload '{name}': file is empty")));
        }
        if size > self.max_file_size {
            return Err(AppError::size_exceeded(format!(
                "upload '{name}': {size} bytes exceeds the {} byte limit",
                self.max_file_size
            )));
        }
        if !self.is_allowed_type(name) {
            return Err(AppError::invalid_type(format!(
                "upload '{name}': file type is not allowed"
            )));
        }
        Ok(())
    }
}
