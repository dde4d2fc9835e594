//! Core traits defined in `assetdesk-core` and implemented by other crates.

pub mod content;

pub use content::{ByteStream, ContentStore, ProgressFn, SavedContent, WriteOptions};
