//! Progress coalescing.
//!
//! Records an update for a download only when it moved enough, and releases
//! the recorded updates as one batch at most once per interval.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use bgdl_core::{DownloaderConfig, ProgressEvent};
use indexmap::IndexMap;

/// Fraction of the total a download must advance before it is recorded.
const MIN_FRACTION_STEP: f64 = 0.01;

/// Batches progress reports for the `downloadProgress` channel.
///
/// An update is recorded when the downloaded fraction advanced by more than
/// 1 %, when the byte count advanced by at least `min_bytes`, or when the
/// total is unknown. Recorded updates are released once `interval` has
/// passed since the previous batch; the first batch is released
/// immediately. A batch lists ids in the order they were first recorded.
#[derive(Debug, Clone)]
pub struct ProgressCoalescer {
    interval: Duration,
    min_bytes: u64,
    last_recorded: HashMap<String, u64>,
    pending: IndexMap<String, ProgressEvent>,
    last_flush: Option<Instant>,
}

impl ProgressCoalescer {
    pub fn new(interval: Duration, min_bytes: u64) -> Self {
        Self {
            interval,
            min_bytes,
            last_recorded: HashMap::new(),
            pending: IndexMap::new(),
            last_flush: None,
        }
    }

    /// Coalescer using the interval and byte threshold from `config`.
    pub fn from_config(config: &DownloaderConfig) -> Self {
        Self::new(
            Duration::from_millis(config.progress_interval_ms),
            config.progress_min_bytes,
        )
    }

    /// Record an update observed now. Returns a batch when one is due.
    pub fn record(
        &mut self,
        id: &str,
        bytes_downloaded: u64,
        bytes_total: u64,
    ) -> Option<Vec<ProgressEvent>> {
        self.record_at(Instant::now(), id, bytes_downloaded, bytes_total)
    }

    /// Record an update observed at `now`. Returns a batch when one is due.
    pub fn record_at(
        &mut self,
        now: Instant,
        id: &str,
        bytes_downloaded: u64,
        bytes_total: u64,
    ) -> Option<Vec<ProgressEvent>> {
        let previous = self.last_recorded.get(id).copied().unwrap_or(0);
        if self.moved_enough(previous, bytes_downloaded, bytes_total) {
            self.last_recorded.insert(id.to_string(), bytes_downloaded);
            self.pending.insert(
                id.to_string(),
                ProgressEvent::new(id, bytes_downloaded, bytes_total),
            );
        }

        let due = self
            .last_flush
            .is_none_or(|last| now.duration_since(last) > self.interval);
        if !due || self.pending.is_empty() {
            return None;
        }
        self.last_flush = Some(now);
        Some(self.take_pending())
    }

    #[allow(clippy::cast_precision_loss)]
    fn moved_enough(&self, previous: u64, downloaded: u64, total: u64) -> bool {
        if total == 0 {
            return true;
        }
        let step = downloaded as f64 / total as f64 - previous as f64 / total as f64;
        step > MIN_FRACTION_STEP || downloaded.saturating_sub(previous) >= self.min_bytes
    }

    /// Release every pending update regardless of the interval.
    pub fn flush(&mut self) -> Vec<ProgressEvent> {
        self.take_pending()
    }

    /// Drop all state for `id`, typically once it completed or failed.
    pub fn forget(&mut self, id: &str) {
        self.last_recorded.remove(id);
        self.pending.shift_remove(id);
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn take_pending(&mut self) -> Vec<ProgressEvent> {
        self.pending.drain(..).map(|(_, event)| event).collect()
    }
}
