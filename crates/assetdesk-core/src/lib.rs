//! # assetdesk-core
//!
//! Core crate for AssetDesk. Contains the content storage trait,
//! configuration schemas, typed identifiers, sorting types, MIME
//! classification helpers, and the unified error system.
//!
//! This crate has **no** internal dependencies on other AssetDesk crates.

pub mod config;
pub mod error;
pub mod mime;
pub mod result;
pub mod traits;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
