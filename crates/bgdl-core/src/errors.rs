//! Error types for the download bridge.
//!
//! `NativeError` is designed to be serializable and not depend on platform
//! error types: native adapters capture whatever their OS reported as a
//! message string (plus an optional numeric code).

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::status::TaskStatus;

/// Required start-download field that was missing or empty.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is absent or the empty string.
    #[error("{field} is required (id, url and destination must all be non-empty)")]
    MissingField {
        /// Name of the offending field.
        field: &'static str,
    },
}

impl ValidationError {
    /// Create a missing field error.
    #[must_use]
    pub const fn missing(field: &'static str) -> Self {
        Self::MissingField { field }
    }
}

/// Error raised synchronously (or by a rejected future) at the native boundary.
#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
#[error("{message}")]
pub struct NativeError {
    /// Human-readable message reported by the platform.
    pub message: String,
    /// Platform error code if one was reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
}

impl NativeError {
    /// Create a native error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }

    /// Create a native error carrying a platform code.
    pub fn with_code(message: impl Into<String>, code: i64) -> Self {
        Self {
            message: message.into(),
            code: Some(code),
        }
    }
}

/// Which user callback slot a handler belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerKind {
    Begin,
    Progress,
    Done,
    Error,
}

impl HandlerKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Begin => "begin",
            Self::Progress => "progress",
            Self::Done => "done",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level error for bridge operations.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Start-download input was rejected before anything happened.
    #[error("invalid download options: {0}")]
    Validation(#[from] ValidationError),

    /// The native layer rejected a command synchronously.
    #[error("native call failed: {0}")]
    Native(#[from] NativeError),

    /// A user handler returned an error that is not isolated.
    #[error("{kind} handler for download '{id}' failed: {source}")]
    Handler {
        /// Task the handler was registered on.
        id: String,
        /// Which handler failed.
        kind: HandlerKind,
        /// Error the handler returned.
        #[source]
        source: anyhow::Error,
    },

    /// A command was issued to a task that already reached a terminal status.
    #[error("download '{id}' is already {status}")]
    TaskFinished {
        /// Task identifier.
        id: String,
        /// Terminal status the task is in.
        status: TaskStatus,
    },
}

impl BridgeError {
    /// Wrap a handler failure.
    pub fn handler(id: impl Into<String>, kind: HandlerKind, source: anyhow::Error) -> Self {
        Self::Handler {
            id: id.into(),
            kind,
            source,
        }
    }

    /// Check if this is a validation failure.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Convenience result type for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;
