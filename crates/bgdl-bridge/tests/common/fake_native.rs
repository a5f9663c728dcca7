//! In-memory stand-in for a platform download manager.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use bgdl_bridge::{NativeDownloadInfo, NativeDownloaderPort, NativeError, NativeStartRequest};

/// Every call the bridge made, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeCall {
    Start(String),
    Pause(String),
    Resume(String),
    Stop(String),
    List,
    Acknowledge(String),
}

#[derive(Default)]
struct State {
    calls: Vec<NativeCall>,
    requests: Vec<NativeStartRequest>,
    existing: Vec<NativeDownloadInfo>,
    start_failure: Option<NativeError>,
}

/// Records calls and answers from scripted data.
#[derive(Default)]
pub struct FakeNative {
    state: Mutex<State>,
}

impl FakeNative {
    pub fn new() -> Self {
        Self::default()
    }

    /// Downloads returned by the next listings.
    #[allow(dead_code)]
    pub fn with_existing(self, existing: Vec<NativeDownloadInfo>) -> Self {
        self.lock().existing = existing;
        self
    }

    /// Make every start call fail with `error`.
    #[allow(dead_code)]
    pub fn failing_start(self, error: NativeError) -> Self {
        self.lock().start_failure = Some(error);
        self
    }

    pub fn calls(&self) -> Vec<NativeCall> {
        self.lock().calls.clone()
    }

    #[allow(dead_code)]
    pub fn requests(&self) -> Vec<NativeStartRequest> {
        self.lock().requests.clone()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    fn record(&self, call: NativeCall) {
        self.lock().calls.push(call);
    }
}

#[async_trait]
impl NativeDownloaderPort for FakeNative {
    fn start_download(&self, request: NativeStartRequest) -> Result<(), NativeError> {
        let mut state = self.lock();
        state.calls.push(NativeCall::Start(request.id.clone()));
        state.requests.push(request);
        state.start_failure.clone().map_or(Ok(()), Err)
    }

    fn pause(&self, id: &str) -> Result<(), NativeError> {
        self.record(NativeCall::Pause(id.to_string()));
        Ok(())
    }

    fn resume(&self, id: &str) -> Result<(), NativeError> {
        self.record(NativeCall::Resume(id.to_string()));
        Ok(())
    }

    fn stop(&self, id: &str) -> Result<(), NativeError> {
        self.record(NativeCall::Stop(id.to_string()));
        Ok(())
    }

    async fn list_existing_downloads(&self) -> Result<Vec<NativeDownloadInfo>, NativeError> {
        let mut state = self.lock();
        state.calls.push(NativeCall::List);
        Ok(state.existing.clone())
    }

    async fn acknowledge_completion(&self, id: &str) -> Result<(), NativeError> {
        self.record(NativeCall::Acknowledge(id.to_string()));
        Ok(())
    }
}
