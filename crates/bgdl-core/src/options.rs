//! Start-download options and the request forwarded to native.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::DownloaderConfig;
use crate::errors::ValidationError;
use crate::metadata;

/// Scheme prefix stripped from destinations before they reach native.
const FILE_URI_PREFIX: &str = "file://";

/// Caller-facing options for a new download.
///
/// Required fields default to the empty string when deserialized so that a
/// missing field surfaces as a validation error rather than a parse error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DownloadOptions {
    /// Caller-chosen unique identifier.
    pub id: String,
    /// Remote URL.
    pub url: String,
    /// Local destination path (a `file://` prefix is accepted).
    pub destination: String,
    /// Per-download headers; a `None` value removes a default header.
    pub headers: BTreeMap<String, Option<String>>,
    /// Structured metadata echoed back on reconciliation.
    pub metadata: Option<Value>,
    pub is_allowed_over_roaming: Option<bool>,
    pub is_allowed_over_metered: Option<bool>,
    pub is_notification_visible: Option<bool>,
    pub notification_title: Option<String>,
}

impl DownloadOptions {
    /// Create options with the required fields.
    pub fn new(
        id: impl Into<String>,
        url: impl Into<String>,
        destination: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            destination: destination.into(),
            ..Default::default()
        }
    }

    /// Add or override a header for this download.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), Some(value.into()));
        self
    }

    /// Suppress a default header for this download.
    #[must_use]
    pub fn without_header(mut self, name: impl Into<String>) -> Self {
        self.headers.insert(name.into(), None);
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    #[must_use]
    pub const fn allowed_over_roaming(mut self, allowed: bool) -> Self {
        self.is_allowed_over_roaming = Some(allowed);
        self
    }

    #[must_use]
    pub const fn allowed_over_metered(mut self, allowed: bool) -> Self {
        self.is_allowed_over_metered = Some(allowed);
        self
    }

    /// Show a system notification with the given title.
    #[must_use]
    pub fn with_notification(mut self, title: impl Into<String>) -> Self {
        self.is_notification_visible = Some(true);
        self.notification_title = Some(title.into());
        self
    }

    /// Check that `id`, `url` and `destination` are non-empty.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_empty() {
            return Err(ValidationError::missing("id"));
        }
        if self.url.is_empty() {
            return Err(ValidationError::missing("url"));
        }
        if self.destination.is_empty() {
            return Err(ValidationError::missing("destination"));
        }
        Ok(())
    }
}

/// Everything native needs to begin a download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeStartRequest {
    pub url: String,
    pub destination: String,
    pub id: String,
    pub headers: BTreeMap<String, String>,
    /// Metadata serialized to a JSON string.
    pub metadata: String,
    pub progress_interval_ms: u64,
    pub progress_min_bytes: u64,
    pub is_allowed_over_roaming: bool,
    pub is_allowed_over_metered: bool,
    pub is_notification_visible: bool,
    pub notification_title: String,
}

/// Merge default headers with per-call headers.
///
/// Per-call values win on key collision; a per-call `None` drops the key.
#[must_use]
pub fn merge_headers(
    defaults: &BTreeMap<String, String>,
    overrides: &BTreeMap<String, Option<String>>,
) -> BTreeMap<String, String> {
    let mut merged = defaults.clone();
    for (name, value) in overrides {
        match value {
            Some(value) => {
                merged.insert(name.clone(), value.clone());
            }
            None => {
                merged.remove(name);
            }
        }
    }
    merged
}

/// Strip a leading `file://` from a destination path.
#[must_use]
pub fn normalize_destination(destination: &str) -> &str {
    destination
        .strip_prefix(FILE_URI_PREFIX)
        .unwrap_or(destination)
}

impl NativeStartRequest {
    /// Build the native request from validated options and the current config.
    ///
    /// `metadata` is the already-normalized metadata object.
    #[must_use]
    pub fn from_options(
        options: &DownloadOptions,
        config: &DownloaderConfig,
        metadata: &Value,
    ) -> Self {
        Self {
            url: options.url.clone(),
            destination: normalize_destination(&options.destination).to_string(),
            id: options.id.clone(),
            headers: merge_headers(&config.headers, &options.headers),
            metadata: metadata::encode(metadata),
            progress_interval_ms: config.progress_interval_ms,
            progress_min_bytes: config.progress_min_bytes,
            is_allowed_over_roaming: options.is_allowed_over_roaming.unwrap_or(true),
            is_allowed_over_metered: options.is_allowed_over_metered.unwrap_or(true),
            is_notification_visible: options.is_notification_visible.unwrap_or(false),
            notification_title: options.notification_title.clone().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validate_required_fields() {
        assert!(DownloadOptions::new("a", "https://x", "/tmp/a").validate().is_ok());
        assert_eq!(
            DownloadOptions::new("", "https://x", "/tmp/a").validate(),
            Err(ValidationError::missing("id"))
        );
        assert_eq!(
            DownloadOptions::new("a", "", "/tmp/a").validate(),
            Err(ValidationError::missing("url"))
        );
        assert_eq!(
            DownloadOptions::new("a", "https://x", "").validate(),
            Err(ValidationError::missing("destination"))
        );
    }

    #[test]
    fn test_missing_url_in_json_is_validation_error() {
        let options: DownloadOptions =
            serde_json::from_str(r#"{"id": "a", "destination": "/tmp/a"}"#).unwrap();
        assert_eq!(options.validate(), Err(ValidationError::missing("url")));
    }

    #[test]
    fn test_merge_headers_per_call_wins() {
        let defaults = BTreeMap::from([
            ("Authorization".to_string(), "Bearer default".to_string()),
            ("X-App".to_string(), "bgdl".to_string()),
        ]);
        let overrides = BTreeMap::from([
            ("Authorization".to_string(), Some("Bearer call".to_string())),
            ("X-App".to_string(), None),
            ("Range".to_string(), Some("bytes=0-".to_string())),
        ]);

        let merged = merge_headers(&defaults, &overrides);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged["Authorization"], "Bearer call");
        assert_eq!(merged["Range"], "bytes=0-");
        assert!(!merged.contains_key("X-App"));
    }

    #[test]
    fn test_normalize_destination() {
        assert_eq!(normalize_destination("file:///data/a.bin"), "/data/a.bin");
        assert_eq!(normalize_destination("/data/a.bin"), "/data/a.bin");
    }

    #[test]
    fn test_request_defaults() {
        let options = DownloadOptions::new("a", "https://x", "file:///tmp/a");
        let config = DownloaderConfig::default();
        let request = NativeStartRequest::from_options(&options, &config, &json!({"k": 1}));

        assert_eq!(request.destination, "/tmp/a");
        assert!(request.is_allowed_over_roaming);
        assert!(request.is_allowed_over_metered);
        assert!(!request.is_notification_visible);
        assert_eq!(request.notification_title, "");
        assert_eq!(request.metadata, r#"{"k":1}"#);
        assert_eq!(request.progress_interval_ms, config.progress_interval_ms);
    }

    #[test]
    fn test_request_explicit_flags() {
        let options = DownloadOptions::new("a", "https://x", "/tmp/a")
            .allowed_over_roaming(false)
            .allowed_over_metered(false)
            .with_notification("Downloading episode");
        let request =
            NativeStartRequest::from_options(&options, &DownloaderConfig::default(), &json!({}));

        assert!(!request.is_allowed_over_roaming);
        assert!(!request.is_allowed_over_metered);
        assert!(request.is_notification_visible);
        assert_eq!(request.notification_title, "Downloading episode");
    }
}
