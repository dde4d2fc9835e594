//! Repository implementations for AssetDesk entities.
//!
//! Read methods run against the pool. Methods suffixed `_in` take a
//! connection so the [`MetadataStore`](crate::MetadataStore) can compose
//! them inside one transaction.

pub mod directory;
pub mod file;

pub use directory::DirectoryRepository;
pub use file::FileRepository;

/// Whether an sqlx error is a UNIQUE constraint violation.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

/// Whether an sqlx error is a FOREIGN KEY constraint violation.
pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation())
}
