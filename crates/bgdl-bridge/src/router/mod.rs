//! Event router: forwards native events to the matching task.
//!
//! # Semantics
//!
//! - Events for ids not in the registry are dropped silently (the event
//!   raced ahead of registration, or the task was already removed)
//! - Progress batches are applied element by element, in order. A failing
//!   progress handler does not stop the rest of the batch; the first failure
//!   is returned once every element was applied and later ones are logged
//! - Complete and failed events remove the task from the registry after its
//!   handler ran, whether or not the handler failed
//! - Begin, progress and error handler failures are returned from
//!   [`EventRouter::dispatch`]; done handler failures never leave the task

mod channel;

use bgdl_core::{BridgeResult, NativeEvent};

use crate::config::SharedConfig;
use crate::registry::TaskRegistry;

pub use channel::{NativeEventReceiver, NativeEventSender, event_channel};

/// Log at debug level, only when the downloader has logging enabled.
macro_rules! debug_if_enabled {
    ($config:expr, $($arg:tt)+) => {
        if $config.logging_enabled() {
            tracing::debug!(target: "bgdl", $($arg)+);
        }
    };
}
pub(crate) use debug_if_enabled;

/// How many event elements reached a task and how many were dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub delivered: usize,
    pub dropped: usize,
}

impl DispatchOutcome {
    const fn delivered() -> Self {
        Self {
            delivered: 1,
            dropped: 0,
        }
    }

    const fn dropped() -> Self {
        Self {
            delivered: 0,
            dropped: 1,
        }
    }

    /// Whether nothing was delivered.
    pub const fn is_dropped(&self) -> bool {
        self.delivered == 0
    }
}

/// Routes native events to tasks in a registry.
#[derive(Clone, Debug)]
pub struct EventRouter {
    registry: TaskRegistry,
    config: SharedConfig,
}

impl EventRouter {
    pub const fn new(registry: TaskRegistry, config: SharedConfig) -> Self {
        Self { registry, config }
    }

    /// Apply one event.
    pub fn dispatch(&self, event: NativeEvent) -> BridgeResult<DispatchOutcome> {
        match event {
            NativeEvent::Begin(begin) => {
                debug_if_enabled!(self.config, id = %begin.id, "downloadBegin event received");
                let Some(task) = self.registry.get(&begin.id) else {
                    return Ok(self.drop_event("begin", &begin.id));
                };
                task.apply_begin(&begin)?;
                Ok(DispatchOutcome::delivered())
            }
            NativeEvent::Progress(batch) => {
                debug_if_enabled!(self.config, count = batch.len(), "downloadProgress event received");
                let mut outcome = DispatchOutcome::default();
                let mut first_error = None;
                for progress in &batch {
                    let Some(task) = self.registry.get(&progress.id) else {
                        self.drop_event("progress", &progress.id);
                        outcome.dropped += 1;
                        continue;
                    };
                    outcome.delivered += 1;
                    if let Err(error) = task.apply_progress(progress) {
                        if first_error.is_none() {
                            first_error = Some(error);
                        } else {
                            tracing::error!(target: "bgdl", %error, "Event handler failed");
                        }
                    }
                }
                first_error.map_or(Ok(outcome), Err)
            }
            NativeEvent::Complete(complete) => {
                debug_if_enabled!(self.config, id = %complete.id, "downloadComplete event received");
                let Some(task) = self.registry.get(&complete.id) else {
                    return Ok(self.drop_event("complete", &complete.id));
                };
                task.apply_done(&complete);
                self.registry.remove(&complete.id);
                Ok(DispatchOutcome::delivered())
            }
            NativeEvent::Failed(failed) => {
                debug_if_enabled!(self.config, id = %failed.id, error = %failed.error, "downloadFailed event received");
                let Some(task) = self.registry.get(&failed.id) else {
                    return Ok(self.drop_event("failed", &failed.id));
                };
                let result = task.apply_error(&failed);
                self.registry.remove(&failed.id);
                result.map(|()| DispatchOutcome::delivered())
            }
        }
    }

    fn drop_event(&self, event: &'static str, id: &str) -> DispatchOutcome {
        debug_if_enabled!(self.config, id, event, "Dropping event for unknown task");
        DispatchOutcome::dropped()
    }

    /// Consume events until every sender is dropped.
    ///
    /// Events are applied one at a time in arrival order. Handler failures
    /// that `dispatch` would return are logged here and processing continues.
    pub async fn run(self, mut events: NativeEventReceiver) {
        while let Some(event) = events.recv().await {
            let channel = event.channel();
            if let Err(error) = self.dispatch(event) {
                tracing::error!(target: "bgdl", channel, %error, "Event handler failed");
            }
        }
        debug_if_enabled!(self.config, "Native event channel closed");
    }
}
