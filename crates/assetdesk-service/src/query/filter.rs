//! Conjunctive listing filters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use assetdesk_core::mime::type_pattern_matches;
use assetdesk_core::types::text::contains_ignore_case;

use super::entry::Listable;

/// Inclusive byte range. A missing bound is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeRange {
    /// Smallest accepted size.
    pub min: Option<u64>,
    /// Largest accepted size.
    pub max: Option<u64>,
}

impl SizeRange {
    /// Whether `size` lies inside the range.
    pub fn contains(&self, size: u64) -> bool {
        self.min.is_none_or(|min| size >= min) && self.max.is_none_or(|max| size <= max)
    }
}

/// Inclusive time range over creation time. A missing bound is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// Earliest accepted time.
    pub from: Option<DateTime<Utc>>,
    /// Latest accepted time.
    pub to: Option<DateTime<Utc>>,
}

impl DateRange {
    /// Whether `at` lies inside the range.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from.is_none_or(|from| at >= from) && self.to.is_none_or(|to| at <= to)
    }
}

/// Every set field must match for an entry to pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    /// Type patterns (`image/png`, `image/*`, `png`); an entry matching any passes.
    #[serde(default)]
    pub types: Vec<String>,
    /// Size bounds.
    #[serde(default)]
    pub size_range: Option<SizeRange>,
    /// Creation time bounds.
    #[serde(default)]
    pub date_range: Option<DateRange>,
    /// Case-insensitive substring of the name.
    #[serde(default)]
    pub search_text: Option<String>,
}

impl FilterCriteria {
    /// Whether `item` passes every predicate.
    pub fn matches<T: Listable>(&self, item: &T) -> bool {
        let type_ok = self.types.is_empty()
            || self
                .types
                .iter()
                .any(|pattern| type_pattern_matches(pattern, item.type_key(), item.name()));
        let size_ok = self.size_range.is_none_or(|range| range.contains(item.size()));
        let date_ok = self
            .date_range
            .is_none_or(|range| range.contains(item.created_at()));
        let text_ok = self
            .search_text
            .as_deref()
            .is_none_or(|text| contains_ignore_case(item.name(), text));

        type_ok && size_ok && date_ok && text_ok
    }
}

/// Entries passing `criteria`, in their original order.
pub fn filter<T: Listable + Clone>(items: &[T], criteria: &FilterCriteria) -> Vec<T> {
    items
        .iter()
        .filter(|item| criteria.matches(*item))
        .cloned()
        .collect()
}

/// Entries whose name contains `text`, ignoring case.
pub fn search<T: Listable + Clone>(items: &[T], text: &str) -> Vec<T> {
    items
        .iter()
        .filter(|item| contains_ignore_case(item.name(), text))
        .cloned()
        .collect()
}
