//! Directory hierarchy: validation, cached tree, and expansion state.

pub mod expand;
pub mod index;
pub mod name;
pub mod tree;

pub use expand::ExpandState;
pub use index::DirectoryIndex;
pub use name::validate_directory_name;
pub use tree::TreeCache;
