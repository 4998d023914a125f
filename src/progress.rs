//! Progress reporting for transfer batches

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Receiver of batch progress and per-item failures.
pub trait ProgressSink: Send + Sync {
    /// `completed` never decreases within one batch.
    fn update(&self, completed: u64, total: u64);

    fn item_failed(&self, _item: &str, _error: &str) {}

    fn message(&self, _text: &str) {}
}

/// Sink that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn update(&self, _completed: u64, _total: u64) {}
}

/// Sink that records every call, for assertions in tests
#[derive(Debug, Default)]
pub struct RecordingProgress {
    updates: Mutex<Vec<(u64, u64)>>,
    failures: Mutex<Vec<(String, String)>>,
    messages: Mutex<Vec<String>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn updates(&self) -> Vec<(u64, u64)> {
        self.updates.lock().map(|u| u.clone()).unwrap_or_default()
    }

    pub fn failures(&self) -> Vec<(String, String)> {
        self.failures.lock().map(|f| f.clone()).unwrap_or_default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().map(|m| m.clone()).unwrap_or_default()
    }

    pub fn last_completed(&self) -> Option<u64> {
        self.updates().last().map(|(completed, _)| *completed)
    }
}

impl ProgressSink for RecordingProgress {
    fn update(&self, completed: u64, total: u64) {
        if let Ok(mut updates) = self.updates.lock() {
            updates.push((completed, total));
        }
    }

    fn item_failed(&self, item: &str, error: &str) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.push((item.to_string(), error.to_string()));
        }
    }

    fn message(&self, text: &str) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(text.to_string());
        }
    }
}

/// Completed-out-of-total counter for one batch.
///
/// The total is fixed at construction. Only the pool's collector advances the
/// counter, so the sink sees a non-decreasing sequence.
pub struct TransferProgress {
    total: u64,
    completed: AtomicU64,
    sink: Arc<dyn ProgressSink>,
}

impl TransferProgress {
    pub fn new(total: u64, sink: Arc<dyn ProgressSink>) -> Self {
        sink.update(0, total);
        Self {
            total,
            completed: AtomicU64::new(0),
            sink,
        }
    }

    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::SeqCst)
    }

    /// Credit `amount` units and notify the sink with the new total.
    pub fn advance(&self, amount: u64) -> u64 {
        let completed = self.completed.fetch_add(amount, Ordering::SeqCst) + amount;
        self.sink.update(completed, self.total);
        completed
    }

    pub fn report_failure(&self, item: &str, error: &str) {
        self.sink.item_failed(item, error);
    }
}

/// Human-readable size, e.g. `1.50 MB`
pub fn format_size(size_bytes: u64) -> String {
    let mut size = size_bytes as f64;
    for unit in ["B", "KB", "MB", "GB", "TB"] {
        if size < 1024.0 {
            return format!("{:.2} {}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.2} PB", size)
}
