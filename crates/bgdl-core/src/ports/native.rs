//! Native downloader port definition.
//!
//! This port is the whole boundary to the platform download engine (iOS
//! `URLSession` background sessions, Android `DownloadManager`). The bridge
//! never performs transport or disk I/O itself; it only forwards commands
//! through this trait and consumes the events the adapter pushes back.
//!
//! # Design
//!
//! - Commands (`start_download`, `pause`, `resume`, `stop`) are fire-and-forget:
//!   `Ok` means native accepted the call, not that the transfer succeeded
//! - Queries (`list_existing_downloads`) and the completion acknowledgement
//!   are async because native answers them asynchronously
//! - Only core domain types in signatures

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::NativeError;
use crate::events::byte_count;
use crate::options::NativeStartRequest;
use crate::status::NativeStatus;

/// A download native knows about, as returned by
/// [`NativeDownloaderPort::list_existing_downloads`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeDownloadInfo {
    pub id: String,
    /// Metadata JSON string stored at start time.
    #[serde(default)]
    pub metadata: String,
    /// Native state code (see [`NativeStatus`]).
    pub state: i64,
    #[serde(default, deserialize_with = "byte_count")]
    pub bytes_downloaded: u64,
    /// 0 when the total is unknown.
    #[serde(default, deserialize_with = "byte_count")]
    pub bytes_total: u64,
}

impl NativeDownloadInfo {
    pub fn new(id: impl Into<String>, status: NativeStatus) -> Self {
        Self {
            id: id.into(),
            metadata: "{}".to_string(),
            state: status.code(),
            bytes_downloaded: 0,
            bytes_total: 0,
        }
    }

    #[must_use]
    pub fn with_bytes(mut self, downloaded: u64, total: u64) -> Self {
        self.bytes_downloaded = downloaded;
        self.bytes_total = total;
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: impl Into<String>) -> Self {
        self.metadata = metadata.into();
        self
    }

    /// Decoded native state.
    #[must_use]
    pub const fn status(&self) -> NativeStatus {
        NativeStatus::from_code(self.state)
    }

    /// Whether a completed entry actually holds the whole file.
    ///
    /// An unknown total counts as complete.
    #[must_use]
    pub const fn is_fully_downloaded(&self) -> bool {
        self.bytes_total == 0 || self.bytes_downloaded == self.bytes_total
    }
}

/// Port for the platform download engine.
///
/// # Usage
///
/// ```ignore
/// let native: Arc<dyn NativeDownloaderPort> = /* platform adapter */;
/// native.start_download(request)?;
/// native.pause("episode-4")?;
/// let existing = native.list_existing_downloads().await?;
/// ```
#[async_trait]
pub trait NativeDownloaderPort: Send + Sync {
    /// Hand a download to the OS.
    fn start_download(&self, request: NativeStartRequest) -> Result<(), NativeError>;

    /// Pause a running download.
    fn pause(&self, id: &str) -> Result<(), NativeError>;

    /// Resume a paused download.
    fn resume(&self, id: &str) -> Result<(), NativeError>;

    /// Cancel a download.
    fn stop(&self, id: &str) -> Result<(), NativeError>;

    /// List every download the OS currently tracks, including ones started
    /// by a previous process.
    async fn list_existing_downloads(&self) -> Result<Vec<NativeDownloadInfo>, NativeError>;

    /// Tell the OS that background-event handling for `id` is finished
    /// (iOS background session completion handler).
    async fn acknowledge_completion(&self, id: &str) -> Result<(), NativeError>;
}
