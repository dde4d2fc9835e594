//! Upload queue: admission policy, byte sources, and the coordinator.

pub mod coordinator;
pub mod policy;
pub mod source;

pub use coordinator::UploadCoordinator;
pub use policy::UploadPolicy;
pub use source::UploadSource;
