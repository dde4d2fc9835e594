//! Text matching shared by store searches and in-memory filters.

/// Case-insensitive substring match. A blank needle matches everything.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    let needle = needle.trim();
    if needle.is_empty() {
        return true;
    }
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Case-insensitive ordering key.
pub fn fold_case(value: &str) -> String {
    value.to_lowercase()
}
