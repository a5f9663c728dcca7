//! Task status and native state codes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Status of a tracked download.
///
/// ```text
/// Pending → Downloading ⇄ Paused
///              ↓             ↓
///       Done | Failed | Stopped   (terminal)
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Handed to native, no begin event seen yet.
    #[default]
    Pending,
    /// Native reported (or the caller resumed) an active transfer.
    Downloading,
    /// Paused by the caller.
    Paused,
    /// Native reported successful completion.
    Done,
    /// Native reported failure, or the start call was rejected.
    Failed,
    /// Stopped by the caller.
    Stopped,
}

impl TaskStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Downloading => "downloading",
            Self::Paused => "paused",
            Self::Done => "done",
            Self::Failed => "failed",
            Self::Stopped => "stopped",
        }
    }

    /// Done, Failed and Stopped are terminal.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed | Self::Stopped)
    }

    /// Whether a task in this status may move to `next`.
    ///
    /// Terminal statuses have no outgoing transitions and nothing re-enters
    /// `Pending`.
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        !self.is_terminal() && !matches!(next, Self::Pending)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Download state as reported by the native layer when listing downloads.
///
/// The numeric codes follow `NSURLSessionTaskState`; the Android adapter maps
/// `DownloadManager` statuses onto the same codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NativeStatus {
    Running,
    Suspended,
    Canceling,
    Completed,
    /// A code this crate does not know about.
    Unknown(i64),
}

/// Android `DownloadManager.STATUS_*` constants.
pub mod android {
    pub const STATUS_PENDING: i64 = 1;
    pub const STATUS_RUNNING: i64 = 2;
    pub const STATUS_PAUSED: i64 = 4;
    pub const STATUS_SUCCESSFUL: i64 = 8;
    pub const STATUS_FAILED: i64 = 16;
}

impl NativeStatus {
    pub const RUNNING: i64 = 0;
    pub const SUSPENDED: i64 = 1;
    pub const CANCELING: i64 = 2;
    pub const COMPLETED: i64 = 3;

    /// Decode a native state code.
    #[must_use]
    pub const fn from_code(code: i64) -> Self {
        match code {
            Self::RUNNING => Self::Running,
            Self::SUSPENDED => Self::Suspended,
            Self::CANCELING => Self::Canceling,
            Self::COMPLETED => Self::Completed,
            other => Self::Unknown(other),
        }
    }

    /// Numeric code as sent over the native boundary.
    #[must_use]
    pub const fn code(&self) -> i64 {
        match self {
            Self::Running => Self::RUNNING,
            Self::Suspended => Self::SUSPENDED,
            Self::Canceling => Self::CANCELING,
            Self::Completed => Self::COMPLETED,
            Self::Unknown(code) => *code,
        }
    }

    /// Map an Android `DownloadManager` status onto a native state.
    ///
    /// A failed Android download is reported as canceling so that
    /// reconciliation drops it. Unrecognised statuses count as running.
    #[must_use]
    pub const fn from_android_status(status: i64) -> Self {
        match status {
            android::STATUS_PAUSED => Self::Suspended,
            android::STATUS_FAILED => Self::Canceling,
            android::STATUS_SUCCESSFUL => Self::Completed,
            _ => Self::Running,
        }
    }
}
