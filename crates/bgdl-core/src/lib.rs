//! Core domain types and port definitions for bgdl.
//!
//! This crate holds pure data types and the native port trait for the
//! background download bridge. No runtime state lives here; the registry,
//! tasks and event routing are in `bgdl-bridge`.
//!
//! - `status` - Task status enum and native state codes
//! - `options` - Start-download options and the native start request
//! - `events` - Native event payloads and channel decoding
//! - `metadata` - Metadata codec for the native boundary
//! - `config` - Downloader configuration and validation
//! - `errors` - Error types
//! - `ports` - The `NativeDownloaderPort` trait

pub mod config;
pub mod errors;
pub mod events;
pub mod metadata;
pub mod options;
pub mod ports;
pub mod status;

// Re-export commonly used types for convenience
pub use config::{
    ConfigError, ConfigUpdate, DEFAULT_PROGRESS_INTERVAL_MS, DEFAULT_PROGRESS_MIN_BYTES,
    DownloaderConfig, MIN_PROGRESS_INTERVAL_MS,
};
pub use errors::{BridgeError, BridgeResult, HandlerKind, NativeError, ValidationError};
pub use events::{
    BeginEvent, CompleteEvent, EventDecodeError, FailedEvent, NativeEvent, ProgressEvent,
};
pub use metadata::DecodedMetadata;
pub use options::{DownloadOptions, NativeStartRequest};
pub use ports::{NativeDownloadInfo, NativeDownloaderPort};
pub use status::{NativeStatus, TaskStatus};
