//! # assetdesk-database
//!
//! SQLite connection management, embedded migrations, and the
//! transactional [`MetadataStore`] holding every directory and file record.

pub mod connection;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use migration::run_migrations;
pub use store::MetadataStore;
