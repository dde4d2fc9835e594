//! Deterministic listing order.

use std::cmp::Ordering;

use assetdesk_core::types::text::fold_case;
use assetdesk_core::types::{SortDirection, SortField};

use super::entry::Listable;

/// Compare two entries on `field` alone.
fn compare_field<T: Listable>(a: &T, b: &T, field: SortField) -> Ordering {
    match field {
        SortField::Name => fold_case(a.name()).cmp(&fold_case(b.name())),
        SortField::Size => a.size().cmp(&b.size()),
        SortField::Type => fold_case(a.type_key()).cmp(&fold_case(b.type_key())),
        SortField::CreatedAt => a.created_at().cmp(&b.created_at()),
        SortField::ModifiedAt => a.modified_at().cmp(&b.modified_at()),
    }
}

/// Full ordering: `field` in `direction`, then id ascending regardless of direction.
pub fn compare<T: Listable>(a: &T, b: &T, field: SortField, direction: SortDirection) -> Ordering {
    let primary = compare_field(a, b, field);
    let primary = match direction {
        SortDirection::Asc => primary,
        SortDirection::Desc => primary.reverse(),
    };
    primary.then_with(|| a.entry_id().cmp(&b.entry_id()))
}

/// Return `items` sorted by `field` in `direction`.
pub fn sort<T: Listable + Clone>(items: &[T], field: SortField, direction: SortDirection) -> Vec<T> {
    let mut sorted = items.to_vec();
    sorted.sort_by(|a, b| compare(a, b, field, direction));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::entry::{EntryId, ListEntry};
    use assetdesk_core::types::{DirectoryId, FileId};
    use assetdesk_entity::file::FileRecord;
    use chrono::{Duration, Utc};

    fn file(name: &str, size: i64, age_minutes: i64) -> FileRecord {
        let at = Utc::now() - Duration::minutes(age_minutes);
        FileRecord {
            id: FileId::new(),
            name: name.to_string(),
            directory_id: DirectoryId::new(),
            content_path: format!("others/{name}"),
            size,
            mime_type: "application/octet-stream".to_string(),
            created_at: at,
            modified_at: at,
        }
    }

    fn names(items: &[FileRecord]) -> Vec<&str> {
        items.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn test_name_is_case_insensitive() {
        let items = vec![file("beta", 1, 0), file("Alpha", 1, 0), file("gamma", 1, 0)];
        let sorted = sort(&items, SortField::Name, SortDirection::Asc);
        assert_eq!(names(&sorted), vec!["Alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_reverse_keeps_ties_id_ascending() {
        let mut items = vec![file("same", 1, 0), file("same", 1, 0), file("zed", 1, 0)];
        items.sort_by_key(|f| std::cmp::Reverse(f.id));

        let asc = sort(&items, SortField::Name, SortDirection::Asc);
        let desc = sort(&items, SortField::Name, SortDirection::Desc);

        assert_eq!(desc[0].name, "zed");
        assert_eq!(asc[2].name, "zed");
        // The tied pair is id-ascending in both directions.
        assert!(asc[0].id < asc[1].id);
        assert!(desc[1].id < desc[2].id);
        assert_eq!((asc[0].id, asc[1].id), (desc[1].id, desc[2].id));
    }

    #[test]
    fn test_size_and_dates() {
        let items = vec![file("a", 30, 1), file("b", 10, 3), file("c", 20, 2)];
        let by_size = sort(&items, SortField::Size, SortDirection::Desc);
        assert_eq!(names(&by_size), vec!["a", "c", "b"]);
        let by_created = sort(&items, SortField::CreatedAt, SortDirection::Asc);
        assert_eq!(names(&by_created), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_mixed_entries_directories_report_zero_size() {
        let now = Utc::now();
        let dir = assetdesk_entity::directory::DirectoryRecord {
            id: DirectoryId::new(),
            name: "docs".to_string(),
            parent_id: None,
            full_path: "/docs".to_string(),
            created_at: now,
            updated_at: now,
        };
        let entries: Vec<ListEntry> = vec![file("a", 5, 0).into(), dir.clone().into()];
        let sorted = sort(&entries, SortField::Size, SortDirection::Asc);
        assert_eq!(sorted[0].entry_id(), EntryId::Directory(dir.id));
    }
}
