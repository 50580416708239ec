use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub checks_started: u64,
    pub checks_passed: u64,
    pub checks_failed: u64,
    pub checks_cancelled: u64,
    pub error_details: u64,
}

pub trait Metrics: Send + Sync {
    fn inc_check_started(&self);
    fn record_check_passed(&self);
    fn record_check_failed(&self);
    fn inc_check_cancelled(&self);
    fn add_error_details(&self, count: u64);
    fn snapshot(&self) -> MetricsSnapshot;
}

pub struct InMemoryMetrics {
    checks_started: AtomicU64,
    checks_passed: AtomicU64,
    checks_failed: AtomicU64,
    checks_cancelled: AtomicU64,
    error_details: AtomicU64,
}

impl InMemoryMetrics {
    pub fn new() -> Self {
        Self {
            checks_started: AtomicU64::new(0),
            checks_passed: AtomicU64::new(0),
            checks_failed: AtomicU64::new(0),
            checks_cancelled: AtomicU64::new(0),
            error_details: AtomicU64::new(0),
        }
    }
}

impl Default for InMemoryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics for InMemoryMetrics {
    fn inc_check_started(&self) {
        self.checks_started.fetch_add(1, Ordering::Relaxed);
    }
    fn record_check_passed(&self) {
        self.checks_passed.fetch_add(1, Ordering::Relaxed);
    }
    fn record_check_failed(&self) {
        self.checks_failed.fetch_add(1, Ordering::Relaxed);
    }
    fn inc_check_cancelled(&self) {
        self.checks_cancelled.fetch_add(1, Ordering::Relaxed);
    }
    fn add_error_details(&self, count: u64) {
        self.error_details.fetch_add(count, Ordering::Relaxed);
    }
    fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            checks_started: self.checks_started.load(Ordering::Relaxed),
            checks_passed: self.checks_passed.load(Ordering::Relaxed),
            checks_failed: self.checks_failed.load(Ordering::Relaxed),
            checks_cancelled: self.checks_cancelled.load(Ordering::Relaxed),
            error_details: self.error_details.load(Ordering::Relaxed),
        }
    }
}
