//! Shared, mutable downloader configuration.

use std::sync::{Arc, PoisonError, RwLock};

use bgdl_core::{ConfigUpdate, DownloaderConfig};

/// Configuration handle shared by a downloader and its event router.
///
/// Reads take a snapshot; nothing holds the lock across a native call or a
/// user handler.
#[derive(Clone, Debug, Default)]
pub struct SharedConfig {
    inner: Arc<RwLock<DownloaderConfig>>,
}

impl SharedConfig {
    pub fn new(config: DownloaderConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// Copy of the current configuration.
    pub fn snapshot(&self) -> DownloaderConfig {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn logging_enabled(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .logging_enabled
    }

    /// Apply an update. Rejected fields are logged and keep their value.
    pub fn apply(&self, update: ConfigUpdate) {
        let rejected = self
            .inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .apply(update);

        for error in rejected {
            tracing::warn!(target: "bgdl", %error, "Ignoring invalid configuration value");
        }
    }
}
