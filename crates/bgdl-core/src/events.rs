//! Native download events - the four push channels from the native layer.
//!
//! Payloads arrive from platform bridges as JSON maps whose numbers are often
//! doubles (`1024.0`) and may be negative when a size is unknown, so byte
//! counts are decoded leniently and clamped to zero.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Channel carrying [`BeginEvent`]s.
pub const BEGIN_CHANNEL: &str = "downloadBegin";
/// Channel carrying one [`ProgressEvent`] or a batch of them.
pub const PROGRESS_CHANNEL: &str = "downloadProgress";
/// Channel carrying [`CompleteEvent`]s.
pub const COMPLETE_CHANNEL: &str = "downloadComplete";
/// Channel carrying [`FailedEvent`]s.
pub const FAILED_CHANNEL: &str = "downloadFailed";

/// Native accepted the download and received response headers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeginEvent {
    pub id: String,
    /// Resolved response headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Expected size from `Content-Length`, 0 when unknown.
    #[serde(default, deserialize_with = "byte_count")]
    pub expected_bytes: u64,
}

/// Transfer progress for one download.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub id: String,
    #[serde(default, deserialize_with = "byte_count")]
    pub bytes_downloaded: u64,
    /// 0 when the total is unknown.
    #[serde(default, deserialize_with = "byte_count")]
    pub bytes_total: u64,
}

impl ProgressEvent {
    pub fn new(id: impl Into<String>, bytes_downloaded: u64, bytes_total: u64) -> Self {
        Self {
            id: id.into(),
            bytes_downloaded,
            bytes_total,
        }
    }
}

/// Native finished the download and moved the file into place.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteEvent {
    pub id: String,
    /// Final on-disk location.
    #[serde(default)]
    pub location: String,
    #[serde(default, deserialize_with = "byte_count")]
    pub bytes_downloaded: u64,
    #[serde(default, deserialize_with = "byte_count")]
    pub bytes_total: u64,
}

/// Native reported a failed download.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedEvent {
    pub id: String,
    /// Human-readable description.
    #[serde(default)]
    pub error: String,
    /// Platform error code if one was reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<i64>,
}

impl FailedEvent {
    pub fn new(id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            error: error.into(),
            error_code: None,
        }
    }
}

/// One event from any of the native channels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NativeEvent {
    Begin(BeginEvent),
    /// Coalesced progress ticks, possibly for several downloads, in order.
    Progress(Vec<ProgressEvent>),
    Complete(CompleteEvent),
    Failed(FailedEvent),
}

/// Failure to decode a raw channel payload.
#[derive(Debug, Error)]
pub enum EventDecodeError {
    #[error("unknown event channel '{0}'")]
    UnknownChannel(String),

    #[error("invalid payload on '{channel}': {source}")]
    InvalidPayload {
        channel: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<ProgressEvent>),
    One(ProgressEvent),
}

impl NativeEvent {
    /// Name of the channel this event travels on.
    #[must_use]
    pub const fn channel(&self) -> &'static str {
        match self {
            Self::Begin(_) => BEGIN_CHANNEL,
            Self::Progress(_) => PROGRESS_CHANNEL,
            Self::Complete(_) => COMPLETE_CHANNEL,
            Self::Failed(_) => FAILED_CHANNEL,
        }
    }

    /// Decode a raw JSON payload received on `channel`.
    ///
    /// The progress channel accepts either a single object or an array.
    pub fn from_channel(channel: &str, payload: Value) -> Result<Self, EventDecodeError> {
        fn parse<T: serde::de::DeserializeOwned>(
            channel: &'static str,
            payload: Value,
        ) -> Result<T, EventDecodeError> {
            serde_json::from_value(payload)
                .map_err(|source| EventDecodeError::InvalidPayload { channel, source })
        }

        match channel {
            BEGIN_CHANNEL => parse(BEGIN_CHANNEL, payload).map(Self::Begin),
            PROGRESS_CHANNEL => {
                let events = match parse::<OneOrMany>(PROGRESS_CHANNEL, payload)? {
                    OneOrMany::Many(events) => events,
                    OneOrMany::One(event) => vec![event],
                };
                Ok(Self::Progress(events))
            }
            COMPLETE_CHANNEL => parse(COMPLETE_CHANNEL, payload).map(Self::Complete),
            FAILED_CHANNEL => parse(FAILED_CHANNEL, payload).map(Self::Failed),
            other => Err(EventDecodeError::UnknownChannel(other.to_string())),
        }
    }
}

/// Deserialize a byte count from an integer or a float, clamping negatives to 0.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn byte_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Unsigned(u64),
        Signed(i64),
        Float(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Unsigned(v) => v,
        Raw::Signed(v) => u64::try_from(v).unwrap_or(0),
        Raw::Float(v) if v.is_finite() && v > 0.0 => v as u64,
        Raw::Float(_) => 0,
    })
}
