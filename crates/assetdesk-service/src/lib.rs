//! # assetdesk-service
//!
//! The file manager subsystem. [`DirectoryIndex`] keeps the in-memory
//! directory forest in sync with the metadata store, [`ContentIngest`]
//! moves bytes into the content store and records them, the
//! [`UploadCoordinator`] runs many ingests under a concurrency cap, and the
//! [`query`] module sorts, filters, and selects listing entries.
//!
//! Services follow constructor injection: all dependencies are provided
//! at construction time. [`FileManager`] wires everything together and
//! exposes the command API.

pub mod directory;
pub mod file;
pub mod manager;
pub mod query;
pub mod upload;

pub use directory::DirectoryIndex;
pub use file::{ContentIngest, FileService};
pub use manager::FileManager;
pub use upload::{UploadCoordinator, UploadPolicy, UploadSource};
