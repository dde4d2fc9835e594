//! Core type definitions used across the AssetDesk workspace.

pub mod id;
pub mod sorting;
pub mod text;

pub use id::*;
pub use sorting::{SortDirection, SortField};
