//! Event channel between native adapters and the router.
//!
//! Adapters usually call back from platform threads, so sending is
//! synchronous and never blocks.

use bgdl_core::{
    BeginEvent, CompleteEvent, EventDecodeError, FailedEvent, NativeEvent, ProgressEvent,
};
use serde_json::Value;
use tokio::sync::mpsc;

/// Create a connected sender/receiver pair.
pub fn event_channel() -> (NativeEventSender, NativeEventReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (NativeEventSender { tx }, NativeEventReceiver { rx })
}

/// Handle native adapters push events through. Clone freely.
#[derive(Clone, Debug)]
pub struct NativeEventSender {
    tx: mpsc::UnboundedSender<NativeEvent>,
}

impl NativeEventSender {
    /// Queue an event. Returns `false` if the receiving router is gone.
    pub fn send(&self, event: NativeEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    pub fn begin(&self, event: BeginEvent) -> bool {
        self.send(NativeEvent::Begin(event))
    }

    /// Send a batch of progress reports, processed in order.
    pub fn progress(&self, events: Vec<ProgressEvent>) -> bool {
        self.send(NativeEvent::Progress(events))
    }

    pub fn complete(&self, event: CompleteEvent) -> bool {
        self.send(NativeEvent::Complete(event))
    }

    pub fn failed(&self, event: FailedEvent) -> bool {
        self.send(NativeEvent::Failed(event))
    }

    /// Decode a raw channel payload and queue it.
    ///
    /// Undecodable payloads are returned as errors and not queued.
    pub fn emit_raw(&self, channel: &str, payload: Value) -> Result<bool, EventDecodeError> {
        NativeEvent::from_channel(channel, payload).map(|event| self.send(event))
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receiving end, consumed by [`EventRouter::run`](super::EventRouter::run).
#[derive(Debug)]
pub struct NativeEventReceiver {
    rx: mpsc::UnboundedReceiver<NativeEvent>,
}

impl NativeEventReceiver {
    /// Wait for the next event; `None` once every sender is dropped.
    pub async fn recv(&mut self) -> Option<NativeEvent> {
        self.rx.recv().await
    }

    /// Take the next event if one is already queued.
    pub fn try_recv(&mut self) -> Option<NativeEvent> {
        self.rx.try_recv().ok()
    }
}
