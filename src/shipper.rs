use crate::entry::BatchEntry;
use crate::transport::LokiTransport;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Batching thresholds. A flush is triggered by whichever fires first:
/// the batch reaching `batch_size` entries, or more than `flush_interval`
/// having passed since the previous flush.
#[derive(Clone, Debug)]
pub struct BatchConfig {
    pub batch_size: usize,
    pub flush_interval: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        BatchConfig {
            batch_size: 10,
            flush_interval: Duration::from_secs(5),
        }
    }
}

struct ShipperState {
    pending: Vec<BatchEntry>,
    last_flush: Instant,
    closed: bool,
}

/// Accumulates [`BatchEntry`]s and pushes them through a [`LokiTransport`]
/// when a threshold is crossed.
///
/// One mutex guards append, threshold check and dispatch together, so
/// entries are flushed in strict append order and batches are dispatched
/// in the order their triggering append occurred. Delivery is best-effort:
/// a failed push is reported to stderr and the batch is dropped. Nothing
/// here ever returns an error to the emitting call site.
pub struct Shipper {
    transport: Arc<dyn LokiTransport>,
    config: BatchConfig,
    state: Mutex<ShipperState>,
    total_entries: AtomicU64,
    shipped_batches: AtomicU64,
    failed_batches: AtomicU64,
    dropped_entries: AtomicU64,
}

/// Point-in-time snapshot of the shipper counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShipperStats {
    /// Entries accepted by `append`.
    pub total_entries: u64,
    /// Batches the backend acknowledged.
    pub shipped_batches: u64,
    /// Batches dropped after a failed push.
    pub failed_batches: u64,
    /// Entries appended after `close` and discarded.
    pub dropped_entries: u64,
}

impl Shipper {
    pub fn new(transport: Arc<dyn LokiTransport>, config: BatchConfig) -> Self {
        // Enforce minimal thresholds to avoid degenerate configs.
        let config = BatchConfig {
            batch_size: config.batch_size.max(1),
            flush_interval: config.flush_interval.max(Duration::from_millis(10)),
        };

        Shipper {
            transport,
            config,
            state: Mutex::new(ShipperState {
                pending: Vec::new(),
                last_flush: Instant::now(),
                closed: false,
            }),
            total_entries: AtomicU64::new(0),
            shipped_batches: AtomicU64::new(0),
            failed_batches: AtomicU64::new(0),
            dropped_entries: AtomicU64::new(0),
        }
    }

    /// Append one entry, flushing inline if a threshold is crossed.
    ///
    /// After `close` this is a harmless no-op. Never panics, never
    /// returns an error.
    pub fn append(&self, entry: BatchEntry) {
        let mut state = self.state.lock();
        if state.closed {
            self.dropped_entries.fetch_add(1, Ordering::Relaxed);
            return;
        }

        state.pending.push(entry);
        self.total_entries.fetch_add(1, Ordering::Relaxed);

        if state.pending.len() >= self.config.batch_size
            || state.last_flush.elapsed() > self.config.flush_interval
        {
            self.flush_locked(&mut state);
        }
    }

    /// Unconditionally flush whatever is pending.
    pub fn flush(&self) {
        let mut state = self.state.lock();
        self.flush_locked(&mut state);
    }

    /// Final flush, then refuse further entries. Idempotent.
    pub fn close(&self) {
        let mut state = self.state.lock();
        if state.closed {
            return;
        }
        self.flush_locked(&mut state);
        state.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Entries currently buffered and not yet dispatched.
    pub fn pending_len(&self) -> usize {
        self.state.lock().pending.len()
    }

    pub fn stats(&self) -> ShipperStats {
        ShipperStats {
            total_entries: self.total_entries.load(Ordering::Relaxed),
            shipped_batches: self.shipped_batches.load(Ordering::Relaxed),
            failed_batches: self.failed_batches.load(Ordering::Relaxed),
            dropped_entries: self.dropped_entries.load(Ordering::Relaxed),
        }
    }

    fn flush_locked(&self, state: &mut ShipperState) {
        if state.pending.is_empty() {
            return;
        }

        // Taking the batch up front clears it no matter how the push ends.
        let batch = std::mem::take(&mut state.pending);
        state.last_flush = Instant::now();

        match self.transport.push(&batch) {
            Ok(()) => {
                self.shipped_batches.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                self.failed_batches.fetch_add(1, Ordering::Relaxed);
                eprintln!("error shipping log batch to loki: {}", e);
            }
        }
    }
}
