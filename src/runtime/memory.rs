//! Memory usage ledger
//!
//! Byte accounting shared by a context and every block it allocated. The
//! counters are atomics so a block can refund its bytes from `Drop` without
//! re-entering the context lock; every charge still happens under the lock.

use log::debug;
use serde::Serialize;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// Snapshot of a context's memory accounting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MemoryUsage {
    /// Bytes held by live blocks
    pub current: i64,
    /// Highest value `current` has reached
    pub peak: i64,
    /// Blocks allocated so far
    pub allocations: u64,
    /// Blocks freed so far
    pub frees: u64,
}

/// Live counters behind `MemoryUsage`.
#[derive(Debug)]
pub struct MemoryLedger {
    current: AtomicI64,
    peak: AtomicI64,
    allocations: AtomicU64,
    frees: AtomicU64,
    /// Emit per-block traces
    detail: bool,
}

impl MemoryLedger {
    pub(crate) fn new(detail: bool) -> Self {
        Self {
            current: AtomicI64::new(0),
            peak: AtomicI64::new(0),
            allocations: AtomicU64::new(0),
            frees: AtomicU64::new(0),
            detail,
        }
    }

    /// Record a new block of `size` bytes.
    pub(crate) fn charge(&self, size: usize, tag: &str) {
        let size = size as i64;
        let now = self.current.fetch_add(size, Ordering::AcqRel) + size;
        let peak = self.peak.fetch_max(now, Ordering::AcqRel).max(now);
        self.allocations.fetch_add(1, Ordering::Relaxed);

        if self.detail {
            debug!(
                target: "statrt::memory",
                "Allocated {} bytes for {} (now allocated: {} bytes, peak: {} bytes)",
                size, tag, now, peak
            );
        }
    }

    /// Record that a block of `size` bytes was freed.
    pub(crate) fn refund(&self, size: usize, tag: &str) {
        let size = size as i64;
        let now = self.current.fetch_sub(size, Ordering::AcqRel) - size;
        self.frees.fetch_add(1, Ordering::Relaxed);

        if self.detail {
            debug!(
                target: "statrt::memory",
                "{} bytes freed for {} (now allocated: {} bytes)",
                size, tag, now
            );
        }
    }

    pub fn detail(&self) -> bool {
        self.detail
    }

    pub fn current(&self) -> i64 {
        self.current.load(Ordering::Acquire)
    }

    pub fn peak(&self) -> i64 {
        self.peak.load(Ordering::Acquire)
    }

    pub fn snapshot(&self) -> MemoryUsage {
        MemoryUsage {
            current: self.current(),
            peak: self.peak(),
            allocations: self.allocations.load(Ordering::Relaxed),
            frees: self.frees.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_log;

    #[test]
    fn test_charge_and_refund() {
        let ledger = MemoryLedger::new(false);
        ledger.charge(64, "a");
        ledger.charge(32, "b");
        assert_eq!(ledger.current(), 96);
        assert_eq!(ledger.peak(), 96);

        ledger.refund(64, "a");
        assert_eq!(ledger.current(), 32);
        assert_eq!(ledger.peak(), 96);

        ledger.charge(16, "c");
        assert_eq!(ledger.current(), 48);
        assert_eq!(ledger.peak(), 96);

        let usage = ledger.snapshot();
        assert_eq!(usage.allocations, 3);
        assert_eq!(usage.frees, 1);
    }

    #[test]
    fn test_peak_never_below_current() {
        let ledger = MemoryLedger::new(false);
        let mut last_peak = 0;
        for (i, size) in [8usize, 800, 24, 0, 4096, 16].iter().enumerate() {
            ledger.charge(*size, "x");
            if i % 2 == 1 {
                ledger.refund(*size, "x");
            }
            assert!(ledger.peak() >= ledger.current());
            assert!(ledger.peak() >= last_peak);
            last_peak = ledger.peak();
        }
    }

    #[test]
    fn test_traces_follow_detail_flag() {
        test_log::install();

        let traced = MemoryLedger::new(true);
        traced.charge(40, "ledger-detail-on");
        traced.refund(40, "ledger-detail-on");
        let records = test_log::records("statrt::memory", "for ledger-detail-on");
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.level == log::Level::Debug));
        assert!(records[0].message.starts_with("Allocated 40 bytes"));
        assert!(records[1].message.starts_with("40 bytes freed"));

        let quiet = MemoryLedger::new(false);
        quiet.charge(40, "ledger-detail-off");
        quiet.refund(40, "ledger-detail-off");
        assert!(test_log::records("statrt::memory", "for ledger-detail-off").is_empty());
    }
}
