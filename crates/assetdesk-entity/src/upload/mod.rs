//! Upload queue entities.

pub mod item;
pub mod status;

pub use item::UploadItem;
pub use status::UploadStatus;
