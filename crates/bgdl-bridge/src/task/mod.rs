//! Download task: per-download state machine plus user callbacks.
//!
//! A `DownloadTask` is a cheap clonable handle. The copy returned to the
//! caller and the copy held by the registry are the same task, so handlers
//! registered after `start_download` returns are seen by the router.
//!
//! # Locking
//!
//! State and handler slots sit behind short `Mutex` sections. A handler is
//! cloned out of its slot and invoked with no lock held, so handlers may
//! freely read the task or register new handlers.

mod handlers;

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bgdl_core::metadata::{self, DecodedMetadata};
use bgdl_core::{
    BeginEvent, BridgeError, BridgeResult, CompleteEvent, FailedEvent, HandlerKind,
    NativeDownloadInfo, NativeDownloaderPort, NativeError, ProgressEvent, TaskStatus,
};
use serde::Serialize;
use serde_json::Value;

use crate::registry::WeakRegistry;

pub use handlers::Handler;
use handlers::Handlers;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mutable per-download state.
#[derive(Debug, Clone)]
struct TaskState {
    status: TaskStatus,
    bytes_downloaded: u64,
    bytes_total: u64,
    metadata: Value,
}

struct TaskInner {
    id: String,
    native: Arc<dyn NativeDownloaderPort>,
    registry: WeakRegistry,
    state: Mutex<TaskState>,
    handlers: Mutex<Handlers>,
}

/// Point-in-time view of a task, for display or serialization.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSnapshot {
    pub id: String,
    pub status: TaskStatus,
    pub bytes_downloaded: u64,
    pub bytes_total: u64,
    pub metadata: Value,
}

/// One tracked download.
#[derive(Clone)]
pub struct DownloadTask {
    inner: Arc<TaskInner>,
}

impl fmt::Debug for DownloadTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = lock(&self.inner.state);
        f.debug_struct("DownloadTask")
            .field("id", &self.inner.id)
            .field("status", &state.status)
            .field("bytes_downloaded", &state.bytes_downloaded)
            .field("bytes_total", &state.bytes_total)
            .finish_non_exhaustive()
    }
}

impl DownloadTask {
    pub(crate) fn new(
        id: impl Into<String>,
        metadata: Value,
        native: Arc<dyn NativeDownloaderPort>,
        registry: WeakRegistry,
    ) -> Self {
        Self {
            inner: Arc::new(TaskInner {
                id: id.into(),
                native,
                registry,
                state: Mutex::new(TaskState {
                    status: TaskStatus::Pending,
                    bytes_downloaded: 0,
                    bytes_total: 0,
                    metadata,
                }),
                handlers: Mutex::new(Handlers::default()),
            }),
        }
    }

    /// Rebuild a task from a native listing entry.
    ///
    /// Handlers registered on `previous` (the task the registry held for the
    /// same id, if any) are carried forward.
    pub(crate) fn restore(
        info: &NativeDownloadInfo,
        status: TaskStatus,
        previous: Option<&Self>,
        native: Arc<dyn NativeDownloaderPort>,
        registry: WeakRegistry,
    ) -> Self {
        let decoded = metadata::decode(&info.metadata);
        if let DecodedMetadata::Malformed { reason, .. } = &decoded {
            tracing::warn!(target: "bgdl", id = %info.id, %reason, "Discarding unreadable task metadata");
        }

        let task = Self::new(info.id.clone(), decoded.into_value(), native, registry);
        {
            let mut state = lock(&task.inner.state);
            state.status = status;
            state.bytes_downloaded = info.bytes_downloaded;
            state.bytes_total = info.bytes_total;
        }
        if let Some(previous) = previous {
            let carried = lock(&previous.inner.handlers).clone();
            *lock(&task.inner.handlers) = carried;
        }
        task
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn status(&self) -> TaskStatus {
        lock(&self.inner.state).status
    }

    pub fn bytes_downloaded(&self) -> u64 {
        lock(&self.inner.state).bytes_downloaded
    }

    /// Total size, 0 while unknown.
    pub fn bytes_total(&self) -> u64 {
        lock(&self.inner.state).bytes_total
    }

    pub fn metadata(&self) -> Value {
        lock(&self.inner.state).metadata.clone()
    }

    pub fn snapshot(&self) -> TaskSnapshot {
        let state = lock(&self.inner.state);
        TaskSnapshot {
            id: self.inner.id.clone(),
            status: state.status,
            bytes_downloaded: state.bytes_downloaded,
            bytes_total: state.bytes_total,
            metadata: state.metadata.clone(),
        }
    }

    /// Whether a handler of `kind` is registered.
    pub fn has_handler(&self, kind: HandlerKind) -> bool {
        lock(&self.inner.handlers).has(kind)
    }

    /// Whether `self` and `other` are handles to the same task.
    pub fn same_task(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Handler registration
    // ─────────────────────────────────────────────────────────────────────────

    /// Register the begin handler, replacing any previous one.
    pub fn begin<F>(&self, handler: F) -> &Self
    where
        F: Fn(&BeginEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        lock(&self.inner.handlers).begin = Some(Arc::new(handler));
        self
    }

    /// Register the progress handler, replacing any previous one.
    pub fn progress<F>(&self, handler: F) -> &Self
    where
        F: Fn(&ProgressEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        lock(&self.inner.handlers).progress = Some(Arc::new(handler));
        self
    }

    /// Register the done handler, replacing any previous one.
    pub fn done<F>(&self, handler: F) -> &Self
    where
        F: Fn(&CompleteEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        lock(&self.inner.handlers).done = Some(Arc::new(handler));
        self
    }

    /// Register the error handler, replacing any previous one.
    pub fn error<F>(&self, handler: F) -> &Self
    where
        F: Fn(&FailedEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        lock(&self.inner.handlers).error = Some(Arc::new(handler));
        self
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Event application (driven by the router)
    // ─────────────────────────────────────────────────────────────────────────

    /// Move to `next` if allowed. Returns the current status on refusal.
    fn transition(&self, next: TaskStatus) -> Result<(), TaskStatus> {
        let mut state = lock(&self.inner.state);
        if state.status.can_transition_to(next) {
            state.status = next;
            Ok(())
        } else {
            Err(state.status)
        }
    }

    fn ignore(&self, event: &'static str, status: TaskStatus) {
        tracing::debug!(target: "bgdl", id = %self.inner.id, %status, event, "Ignoring event for finished task");
    }

    /// Native began the transfer. Begin handler errors propagate.
    pub fn apply_begin(&self, event: &BeginEvent) -> BridgeResult<()> {
        if let Err(status) = self.transition(TaskStatus::Downloading) {
            self.ignore("begin", status);
            return Ok(());
        }

        let handler = lock(&self.inner.handlers).begin.clone();
        if let Some(handler) = handler {
            handler(event).map_err(|e| BridgeError::handler(self.id(), HandlerKind::Begin, e))?;
        }
        Ok(())
    }

    /// Byte counts are taken from native as is; no monotonicity check.
    pub fn apply_progress(&self, event: &ProgressEvent) -> BridgeResult<()> {
        {
            let mut state = lock(&self.inner.state);
            if state.status.is_terminal() {
                let status = state.status;
                drop(state);
                self.ignore("progress", status);
                return Ok(());
            }
            state.bytes_downloaded = event.bytes_downloaded;
            state.bytes_total = event.bytes_total;
        }

        let handler = lock(&self.inner.handlers).progress.clone();
        if let Some(handler) = handler {
            handler(event)
                .map_err(|e| BridgeError::handler(self.id(), HandlerKind::Progress, e))?;
        }
        Ok(())
    }

    /// Native finished the transfer.
    ///
    /// The done handler runs in a guarded scope: an error or a panic from it
    /// is logged and never reaches the caller.
    pub fn apply_done(&self, event: &CompleteEvent) {
        {
            let mut state = lock(&self.inner.state);
            if !state.status.can_transition_to(TaskStatus::Done) {
                let status = state.status;
                drop(state);
                self.ignore("done", status);
                return;
            }
            state.status = TaskStatus::Done;
            state.bytes_downloaded = event.bytes_downloaded;
            state.bytes_total = event.bytes_total;
        }

        let Some(handler) = lock(&self.inner.handlers).done.clone() else {
            return;
        };

        match catch_unwind(AssertUnwindSafe(|| handler(event))) {
            Ok(Ok(())) => {}
            Ok(Err(error)) => {
                tracing::error!(target: "bgdl", id = %self.inner.id, error = %error, "Error in done handler");
            }
            Err(_) => {
                tracing::error!(target: "bgdl", id = %self.inner.id, "Done handler panicked");
            }
        }
    }

    /// Native reported a failure. Error handler errors propagate.
    pub fn apply_error(&self, event: &FailedEvent) -> BridgeResult<()> {
        if let Err(status) = self.transition(TaskStatus::Failed) {
            self.ignore("failed", status);
            return Ok(());
        }

        let handler = lock(&self.inner.handlers).error.clone();
        if let Some(handler) = handler {
            handler(event).map_err(|e| BridgeError::handler(self.id(), HandlerKind::Error, e))?;
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Caller commands
    // ─────────────────────────────────────────────────────────────────────────

    /// Optimistically move to `next`, then forward `command` to native.
    ///
    /// There is no rollback when native rejects the command.
    fn command(
        &self,
        next: TaskStatus,
        command: impl FnOnce(&dyn NativeDownloaderPort, &str) -> Result<(), NativeError>,
    ) -> BridgeResult<()> {
        self.transition(next)
            .map_err(|status| BridgeError::TaskFinished {
                id: self.inner.id.clone(),
                status,
            })?;
        command(self.inner.native.as_ref(), &self.inner.id)?;
        Ok(())
    }

    /// Pause the download.
    pub fn pause(&self) -> BridgeResult<()> {
        self.command(TaskStatus::Paused, |native, id| native.pause(id))
    }

    /// Resume the download.
    pub fn resume(&self) -> BridgeResult<()> {
        self.command(TaskStatus::Downloading, |native, id| native.resume(id))
    }

    /// Stop the download.
    ///
    /// `Stopped` is terminal, so the task also leaves the registry; any late
    /// native event for it is dropped.
    pub fn stop(&self) -> BridgeResult<()> {
        self.command(TaskStatus::Stopped, |native, id| {
            self.inner.registry.detach(self);
            native.stop(id)
        })
    }

    /// Remove this task from its registry if it is still the registered one.
    pub(crate) fn detach(&self) {
        self.inner.registry.detach(self);
    }
}
