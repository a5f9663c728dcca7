//! Runtime side of the bgdl background download bridge.
//!
//! Native download managers keep transferring files while the app is
//! suspended; this crate tracks those transfers and routes the native
//! events back to caller callbacks.
//!
//! - `downloader` - `BackgroundDownloader` facade: start, reconcile, configure
//! - `task` - Per-download state machine and callbacks
//! - `registry` - Live id to task mapping
//! - `router` - Native event channel and dispatch to tasks
//! - `progress` - Progress coalescing for native adapters
//! - `config` - Shared, runtime-updatable configuration
//!
//! ```ignore
//! let (events_tx, events_rx) = bgdl_bridge::event_channel();
//! let downloader = BackgroundDownloader::new(Arc::new(MyNative::new(events_tx)));
//! downloader.spawn_event_loop(events_rx);
//!
//! let task = downloader.start_download(DownloadOptions::new("id", url, dest))?;
//! task.done(|event| {
//!     println!("saved to {}", event.location);
//!     Ok(())
//! });
//! ```

// Re-export core types for convenience
pub use bgdl_core;
pub use bgdl_core::{
    BeginEvent, BridgeError, BridgeResult, CompleteEvent, ConfigUpdate, DownloadOptions,
    DownloaderConfig, FailedEvent, HandlerKind, NativeDownloadInfo, NativeDownloaderPort,
    NativeError, NativeEvent, NativeStartRequest, NativeStatus, ProgressEvent, TaskStatus,
};

mod config;
mod downloader;
mod progress;
mod registry;
mod router;
mod task;

#[cfg(test)]
mod test_support;

pub use config::SharedConfig;
pub use downloader::BackgroundDownloader;
pub use progress::ProgressCoalescer;
pub use registry::TaskRegistry;
pub use router::{
    DispatchOutcome, EventRouter, NativeEventReceiver, NativeEventSender, event_channel,
};
pub use task::{DownloadTask, Handler, TaskSnapshot};

