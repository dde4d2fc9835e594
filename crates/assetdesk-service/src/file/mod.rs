//! File ingestion and file-level operations.

pub mod ingest;
pub mod service;

pub use ingest::ContentIngest;
pub use service::{FileService, SweepReport};
