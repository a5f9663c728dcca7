//! Background downloader facade.
//!
//! This is the public entry point. It owns the task registry and the
//! configuration, and talks to the platform only through the injected
//! [`NativeDownloaderPort`].
//!
//! # Removal policy
//!
//! A task leaves the registry as soon as it reaches a terminal status:
//! on a complete or failed event, on `stop`, and when native rejects the
//! start call synchronously. In that last case a live task the rejected
//! start had replaced under the same id is registered again.

use std::sync::Arc;

use bgdl_core::metadata;
use bgdl_core::{
    BridgeResult, ConfigUpdate, DownloadOptions, DownloaderConfig, FailedEvent,
    NativeDownloaderPort, NativeStartRequest, NativeStatus, TaskStatus,
};
use tokio::task::JoinHandle;

use crate::config::SharedConfig;
use crate::registry::TaskRegistry;
use crate::router::{EventRouter, NativeEventReceiver, debug_if_enabled};
use crate::task::DownloadTask;

/// Message used when native rejects a start without saying why.
const START_FAILED_MESSAGE: &str = "Download failed to start";

/// Tracks background downloads and forwards commands to native.
#[derive(Clone)]
pub struct BackgroundDownloader {
    native: Arc<dyn NativeDownloaderPort>,
    registry: TaskRegistry,
    config: SharedConfig,
}

impl std::fmt::Debug for BackgroundDownloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundDownloader")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl BackgroundDownloader {
    /// Create a downloader with default configuration and an empty registry.
    pub fn new(native: Arc<dyn NativeDownloaderPort>) -> Self {
        Self::with_config(native, DownloaderConfig::default())
    }

    pub fn with_config(native: Arc<dyn NativeDownloaderPort>, config: DownloaderConfig) -> Self {
        Self {
            native,
            registry: TaskRegistry::new(),
            config: SharedConfig::new(config),
        }
    }

    /// Update configuration. Invalid values are logged and ignored; this
    /// never fails.
    pub fn configure(&self, update: ConfigUpdate) {
        self.config.apply(update);
    }

    /// Current configuration.
    pub fn config(&self) -> DownloaderConfig {
        self.config.snapshot()
    }

    pub const fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    /// Live task registered under `id`.
    pub fn task(&self, id: &str) -> Option<DownloadTask> {
        self.registry.get(id)
    }

    /// Router over this downloader's registry.
    pub fn router(&self) -> EventRouter {
        EventRouter::new(self.registry.clone(), self.config.clone())
    }

    /// Spawn the event loop on the current tokio runtime.
    pub fn spawn_event_loop(&self, events: NativeEventReceiver) -> JoinHandle<()> {
        tokio::spawn(self.router().run(events))
    }

    /// Start a download and return its task.
    ///
    /// Validation errors are returned before native is called or the
    /// registry is touched. A synchronous native rejection is not returned:
    /// the task is marked failed (with the native message) and dropped from
    /// the registry instead.
    pub fn start_download(&self, options: DownloadOptions) -> BridgeResult<DownloadTask> {
        debug_if_enabled!(self.config, id = %options.id, "download called");
        options.validate()?;

        let config = self.config.snapshot();
        let metadata = metadata::normalize(options.metadata.clone());
        let request = NativeStartRequest::from_options(&options, &config, &metadata);

        let task = DownloadTask::new(
            options.id.clone(),
            metadata,
            self.native.clone(),
            self.registry.downgrade(),
        );

        let replaced = self
            .registry
            .insert(task.clone())
            .filter(|previous| !previous.status().is_terminal());
        if let Some(previous) = &replaced {
            tracing::warn!(
                target: "bgdl",
                id = %options.id,
                status = %previous.status(),
                "Replacing a live download with the same id"
            );
        }

        if let Err(error) = self.native.start_download(request) {
            tracing::error!(target: "bgdl", id = %options.id, %error, "Native rejected download");
            let message = if error.message.is_empty() {
                START_FAILED_MESSAGE.to_string()
            } else {
                error.message.clone()
            };
            let failure = FailedEvent {
                id: options.id.clone(),
                error: message,
                error_code: error.code,
            };
            // A brand new task has no handlers yet, so this cannot fail.
            let _ = task.apply_error(&failure);
            if self.registry.remove_task(&task) {
                if let Some(previous) = replaced.filter(|p| !p.status().is_terminal()) {
                    tracing::warn!(target: "bgdl", id = %options.id, "Restoring the replaced download");
                    self.registry.insert(previous);
                }
            }
        }

        Ok(task)
    }

    /// Rebuild the registry from the downloads native currently knows about.
    ///
    /// Callbacks registered on an existing task with the same id are carried
    /// over to the rebuilt task. Canceling entries and completed entries whose
    /// byte counts disagree are dropped. A native error yields an empty list.
    pub async fn reconcile_with_native(&self) -> Vec<DownloadTask> {
        debug_if_enabled!(self.config, "checkForExistingDownloads");

        let found = match self.native.list_existing_downloads().await {
            Ok(found) => found,
            Err(error) => {
                tracing::error!(target: "bgdl", %error, "Failed to list existing downloads");
                return Vec::new();
            }
        };
        debug_if_enabled!(self.config, count = found.len(), "checkForExistingDownloads found tasks");

        let mut restored = Vec::with_capacity(found.len());
        for info in &found {
            let status = match info.status() {
                NativeStatus::Running => TaskStatus::Downloading,
                NativeStatus::Suspended => TaskStatus::Paused,
                NativeStatus::Canceling => continue,
                NativeStatus::Completed if info.is_fully_downloaded() => TaskStatus::Done,
                NativeStatus::Completed => {
                    debug_if_enabled!(
                        self.config,
                        id = %info.id,
                        bytes_downloaded = info.bytes_downloaded,
                        bytes_total = info.bytes_total,
                        "Dropping incomplete completed download"
                    );
                    continue;
                }
                NativeStatus::Unknown(code) => {
                    tracing::warn!(target: "bgdl", id = %info.id, code, "Unknown native download state");
                    TaskStatus::Pending
                }
            };

            let previous = self.registry.get(&info.id);
            let task = DownloadTask::restore(
                info,
                status,
                previous.as_ref(),
                self.native.clone(),
                self.registry.downgrade(),
            );
            self.registry.insert(task.clone());
            restored.push(task);
        }

        restored
    }

    /// Reconcile, then pause and immediately resume every downloading task.
    ///
    /// Works around native transfers that stall after the app was
    /// backgrounded. Best effort: failures are logged only.
    pub async fn ensure_running(&self) {
        debug_if_enabled!(self.config, "ensureDownloadsAreRunning");

        for task in self.reconcile_with_native().await {
            if task.status() != TaskStatus::Downloading {
                continue;
            }
            if let Err(error) = task.pause() {
                tracing::warn!(target: "bgdl", id = %task.id(), %error, "Failed to pause download");
            }
            if let Err(error) = task.resume() {
                tracing::warn!(target: "bgdl", id = %task.id(), %error, "Failed to resume download");
            }
        }
    }

    /// Signal native that background-event handling for `id` is finished.
    pub async fn acknowledge_completion(&self, id: &str) -> BridgeResult<()> {
        debug_if_enabled!(self.config, id, "completeHandler");
        self.native.acknowledge_completion(id).await?;
        Ok(())
    }
}
