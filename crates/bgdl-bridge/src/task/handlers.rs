//! User callback slots.

use std::sync::Arc;

use bgdl_core::{BeginEvent, CompleteEvent, FailedEvent, HandlerKind, ProgressEvent};

/// A user callback for events of type `E`.
///
/// Returning an error from a begin, progress or error handler propagates to
/// the event dispatcher; done handler errors are logged and swallowed.
pub type Handler<E> = Arc<dyn Fn(&E) -> anyhow::Result<()> + Send + Sync>;

/// At most one handler per kind. Registration replaces.
#[derive(Clone, Default)]
pub(crate) struct Handlers {
    pub begin: Option<Handler<BeginEvent>>,
    pub progress: Option<Handler<ProgressEvent>>,
    pub done: Option<Handler<CompleteEvent>>,
    pub error: Option<Handler<FailedEvent>>,
}

impl Handlers {
    pub const fn has(&self, kind: HandlerKind) -> bool {
        match kind {
            HandlerKind::Begin => self.begin.is_some(),
            HandlerKind::Progress => self.progress.is_some(),
            HandlerKind::Done => self.done.is_some(),
            HandlerKind::Error => self.error.is_some(),
        }
    }
}
