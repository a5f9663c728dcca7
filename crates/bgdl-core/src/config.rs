//! Downloader configuration and validation.
//!
//! Configuration is process-wide for a downloader instance and is read by
//! every subsequent start-download call. It is never retroactive.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Smallest progress interval native is allowed to use (milliseconds).
pub const MIN_PROGRESS_INTERVAL_MS: u64 = 250;

/// Default progress interval (milliseconds).
pub const DEFAULT_PROGRESS_INTERVAL_MS: u64 = 1000;

/// Default minimum byte delta between progress reports (1 MiB).
pub const DEFAULT_PROGRESS_MIN_BYTES: u64 = 1024 * 1024;

/// Effective downloader configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloaderConfig {
    /// Headers merged into every download (per-call headers win).
    pub headers: BTreeMap<String, String>,
    /// Minimum time between progress batches, in milliseconds.
    pub progress_interval_ms: u64,
    /// Minimum byte delta before a progress report is recorded.
    pub progress_min_bytes: u64,
    /// Emit lifecycle debug logs.
    pub logging_enabled: bool,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            headers: BTreeMap::new(),
            progress_interval_ms: DEFAULT_PROGRESS_INTERVAL_MS,
            progress_min_bytes: DEFAULT_PROGRESS_MIN_BYTES,
            logging_enabled: false,
        }
    }
}

/// Partial configuration update.
///
/// `None` leaves a field unchanged. Numeric fields are signed so that
/// out-of-range input from loosely typed callers reaches validation instead
/// of failing to parse.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfigUpdate {
    /// Replaces the default header set.
    pub headers: Option<BTreeMap<String, String>>,
    pub progress_interval_ms: Option<i64>,
    pub progress_min_bytes: Option<i64>,
    pub logging_enabled: Option<bool>,
}

impl ConfigUpdate {
    #[must_use]
    pub fn with_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers = Some(headers);
        self
    }

    #[must_use]
    pub const fn with_progress_interval_ms(mut self, interval: i64) -> Self {
        self.progress_interval_ms = Some(interval);
        self
    }

    #[must_use]
    pub const fn with_progress_min_bytes(mut self, bytes: i64) -> Self {
        self.progress_min_bytes = Some(bytes);
        self
    }

    #[must_use]
    pub const fn with_logging(mut self, enabled: bool) -> Self {
        self.logging_enabled = Some(enabled);
        self
    }
}

/// Configuration validation error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("progressInterval must be a number >= 250, got {0}")]
    ProgressIntervalTooSmall(i64),

    #[error("progressMinBytes must be a number >= 0, got {0}")]
    NegativeProgressMinBytes(i64),
}

/// Validate a progress interval.
pub fn validate_progress_interval(value: i64) -> Result<u64, ConfigError> {
    u64::try_from(value)
        .ok()
        .filter(|v| *v >= MIN_PROGRESS_INTERVAL_MS)
        .ok_or(ConfigError::ProgressIntervalTooSmall(value))
}

/// Validate a progress minimum byte delta.
pub fn validate_progress_min_bytes(value: i64) -> Result<u64, ConfigError> {
    u64::try_from(value).map_err(|_| ConfigError::NegativeProgressMinBytes(value))
}

impl DownloaderConfig {
    /// Apply an update field by field.
    ///
    /// Invalid values are skipped (the previous value is retained) and
    /// reported in the returned list; valid fields in the same update still
    /// apply.
    pub fn apply(&mut self, update: ConfigUpdate) -> Vec<ConfigError> {
        let mut rejected = Vec::new();

        if let Some(headers) = update.headers {
            self.headers = headers;
        }

        if let Some(interval) = update.progress_interval_ms {
            match validate_progress_interval(interval) {
                Ok(v) => self.progress_interval_ms = v,
                Err(e) => rejected.push(e),
            }
        }

        if let Some(bytes) = update.progress_min_bytes {
            match validate_progress_min_bytes(bytes) {
                Ok(v) => self.progress_min_bytes = v,
                Err(e) => rejected.push(e),
            }
        }

        if let Some(enabled) = update.logging_enabled {
            self.logging_enabled = enabled;
        }

        rejected
    }
}
