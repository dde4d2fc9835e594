//! Directory domain entities.

pub mod model;
pub mod tree;

pub use model::{CreateDirectory, DirectoryRecord};
pub use tree::DirectoryTreeNode;
