//! Upload counters.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free counters updated by the orchestrator
#[derive(Debug, Default)]
pub struct UploadMetrics {
    batches_started: AtomicU64,
    batches_succeeded: AtomicU64,
    batches_failed: AtomicU64,
    batches_cancelled: AtomicU64,
    files_uploaded: AtomicU64,
    files_failed: AtomicU64,
    upload_attempts: AtomicU64,
    retry_waits: AtomicU64,
    bytes_staged: AtomicU64,
}

/// Point-in-time copy of [`UploadMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// Batches started, including retry passes
    pub batches_started: u64,
    /// Batches that ended in success
    pub batches_succeeded: u64,
    /// Batches that ended in error
    pub batches_failed: u64,
    /// Batches cancelled while running
    pub batches_cancelled: u64,
    /// Files uploaded
    pub files_uploaded: u64,
    /// Files that failed
    pub files_failed: u64,
    /// `sendDocument` attempts
    pub upload_attempts: u64,
    /// Backoff waits between attempts
    pub retry_waits: u64,
    /// Bytes copied into staging
    pub bytes_staged: u64,
}

impl UploadMetrics {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a batch start
    pub fn record_batch_started(&self) {
        self.batches_started.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a batch outcome
    pub fn record_batch_finished(&self, success: bool) {
        if success {
            self.batches_succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.batches_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a cancellation
    pub fn record_batch_cancelled(&self) {
        self.batches_cancelled.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a file outcome
    pub fn record_file(&self, success: bool) {
        if success {
            self.files_uploaded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.files_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record one upload attempt; every attempt after the first follows a wait
    pub fn record_attempt(&self, attempt: u32) {
        self.upload_attempts.fetch_add(1, Ordering::Relaxed);
        if attempt > 1 {
            self.retry_waits.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record staged bytes
    pub fn record_bytes_staged(&self, bytes: u64) {
        self.bytes_staged.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Take a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            batches_started: self.batches_started.load(Ordering::Relaxed),
            batches_succeeded: self.batches_succeeded.load(Ordering::Relaxed),
            batches_failed: self.batches_failed.load(Ordering::Relaxed),
            batches_cancelled: self.batches_cancelled.load(Ordering::Relaxed),
            files_uploaded: self.files_uploaded.load(Ordering::Relaxed),
            files_failed: self.files_failed.load(Ordering::Relaxed),
            upload_attempts: self.upload_attempts.load(Ordering::Relaxed),
            retry_waits: self.retry_waits.load(Ordering::Relaxed),
            bytes_staged: self.bytes_staged.load(Ordering::Relaxed),
        }
    }
}
