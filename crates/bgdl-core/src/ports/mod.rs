//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces the bridge expects from the platform.
//! They contain no implementation details and use only domain types.

pub mod native;

pub use native::{NativeDownloadInfo, NativeDownloaderPort};
