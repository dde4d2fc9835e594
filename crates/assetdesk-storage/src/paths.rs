//! Content path generation and validation.
//!
//! A content path is `<bucket>/<uuid>[.<ext>]`, relative to the store root.

use assetdesk_core::error::AppError;
use assetdesk_core::mime::{extension_of, ContentBucket};
use assetdesk_core::result::AppResult;
use uuid::Uuid;

/// Directory under the root holding partial writes.
pub const TEMP_DIR: &str = ".tmp";

/// Suffix of partial write files.
pub const TEMP_SUFFIX: &str = ".part";

const MAX_EXTENSION_LEN: usize = 16;

/// Generate a fresh blob name keeping only a sane extension of the original.
pub fn generate_blob_name(original_name: &str) -> String {
    let id = Uuid::new_v4();
    match extension_of(original_name)
        .filter(|ext| ext.len() <= MAX_EXTENSION_LEN && ext.chars().all(|c| c.is_ascii_alphanumeric()))
    {
        Some(ext) => format!("{id}.{ext}"),
        None => id.to_string(),
    }
}

/// Build the content path of a blob in a bucket.
pub fn content_path(bucket: ContentBucket, blob_name: &str) -> String {
    format!("{}/{blob_name}", bucket.dir_name())
}

/// Split and validate a content path into its bucket and blob name.
pub fn parse_content_path(path: &str) -> AppResult<(ContentBucket, &str)> {
    let invalid = || AppError::validation(format!("Invalid content path: '{path}'"));

    let (bucket, name) = path.split_once('/').ok_or_else(invalid)?;
    let bucket = ContentBucket::ALL
        .into_iter()
        .find(|b| b.dir_name() == bucket)
        .ok_or_else(invalid)?;
    if name.is_empty()
        || name.starts_with('.')
        || name.contains(['/', '\\'])
        || name.contains("..")
    {
        return Err(invalid());
    }
    Ok((bucket, name))
}
