//! # assetdesk-storage
//!
//! Local filesystem implementation of the
//! [`ContentStore`](assetdesk_core::traits::ContentStore) trait. Blobs are
//! written to a temporary file first and renamed into their bucket once
//! complete.

pub mod local;
pub mod paths;
mod temp;

pub use local::LocalContentStore;
