//! Runtime Context
//!
//! Per-instance state: memory accounting, configuration flags, the pending
//! error slot and entry-point timings, all behind one lock. Buffers are owned
//! by array handles, but every allocation and release goes through here.

use crate::config::ContextConfig;
use crate::entry::Statistic;
use crate::error::{Result, RuntimeError};
use crate::runtime::buffer::{Buffer, Release};
use crate::runtime::memory::{MemoryLedger, MemoryUsage};
use log::debug;
use parking_lot::{Mutex, MutexGuard};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

/// Accumulated wall-clock time for one entry point
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryTiming {
    pub runs: u64,
    pub total: Duration,
}

/// State guarded by the context lock.
#[derive(Debug, Default)]
pub(crate) struct ContextState {
    /// Last failure message, overwritten by each new failure
    pub(crate) last_error: Option<String>,
    /// Timings per entry point, recorded while debugging
    pub(crate) timings: BTreeMap<Statistic, EntryTiming>,
}

/// A runtime instance.
///
/// `Context` is `Sync`; share it between threads by reference or `Arc`.
#[derive(Debug)]
pub struct Context {
    config: ContextConfig,
    pub(crate) ledger: Arc<MemoryLedger>,
    state: Mutex<ContextState>,
}

impl Context {
    /// Create a context from a configuration snapshot.
    pub fn new(config: &ContextConfig) -> Self {
        Self {
            config: *config,
            ledger: Arc::new(MemoryLedger::new(config.debugging)),
            state: Mutex::new(ContextState::default()),
        }
    }

    /// Destroy the context.
    ///
    /// Buffers still held by array handles stay valid; their bytes are simply
    /// no longer reported anywhere.
    pub fn free(self) {}

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, ContextState> {
        self.state.lock()
    }

    /// Record `err` in the error slot and return it.
    pub(crate) fn fail<T>(&self, state: &mut ContextState, err: RuntimeError) -> Result<T> {
        state.last_error = Some(err.to_string());
        Err(err)
    }

    /// Wait for outstanding work. There is never any, so this always succeeds.
    pub fn sync(&self) -> Result<()> {
        Ok(())
    }

    /// Take the pending error message, leaving the slot empty.
    pub fn take_error(&self) -> Option<String> {
        self.lock().last_error.take()
    }

    // =========================================================================
    // Buffer lifecycle
    // =========================================================================

    /// Allocate `size` zeroed bytes.
    ///
    /// A negative size is a fatal contract violation; see
    /// `RuntimeError::is_fatal`.
    pub fn allocate(&self, size: i64, tag: &str) -> Result<Buffer> {
        let _state = self.lock();
        Buffer::allocate(&self.ledger, size, tag)
    }

    /// New reference to `buffer`'s storage.
    pub fn share(&self, buffer: &Buffer) -> Buffer {
        let _state = self.lock();
        buffer.share()
    }

    /// Release the reference held in `slot`, leaving it empty.
    ///
    /// An already empty slot is a no-op and returns `None`.
    pub fn release(&self, slot: &mut Option<Buffer>, tag: &str) -> Option<Release> {
        let _state = self.lock();
        self.release_locked(slot, tag)
    }

    /// Release whatever `target` holds, then make it a reference to `source`.
    pub fn rebind(&self, target: &mut Option<Buffer>, source: &Buffer, target_tag: &str) {
        let _state = self.lock();
        self.release_locked(target, target_tag);
        *target = Some(source.share());
    }

    pub(crate) fn release_locked(&self, slot: &mut Option<Buffer>, tag: &str) -> Option<Release> {
        slot.take().map(|buffer| self.unref_locked(buffer, tag))
    }

    /// Drop one reference. Caller holds the lock.
    pub(crate) fn unref_locked(&self, buffer: Buffer, tag: &str) -> Release {
        let trace = self
            .ledger
            .detail()
            .then(|| buffer.tag().to_string());
        let outcome = buffer.release();

        if let Some(allocated_as) = trace {
            match outcome {
                Release::Retained { remaining } => debug!(
                    target: "statrt::memory",
                    "Unreferencing block {} (allocated as {}): {} references remaining",
                    tag, allocated_as, remaining
                ),
                Release::Freed { bytes } => debug!(
                    target: "statrt::memory",
                    "Unreferencing block {} (allocated as {}): last reference, {} bytes released",
                    tag, allocated_as, bytes
                ),
            }
        }
        outcome
    }

    // =========================================================================
    // Accounting and reporting
    // =========================================================================

    pub fn usage(&self) -> MemoryUsage {
        let _state = self.lock();
        self.ledger.snapshot()
    }

    pub fn current_usage(&self) -> i64 {
        self.usage().current
    }

    pub fn peak_usage(&self) -> i64 {
        self.usage().peak
    }

    /// Timings recorded for `stat` so far.
    pub fn entry_timing(&self, stat: Statistic) -> EntryTiming {
        self.lock().timings.get(&stat).copied().unwrap_or_default()
    }

    /// Debugging report text; empty unless debugging is enabled.
    pub fn report(&self) -> String {
        if !self.config.debugging {
            return String::new();
        }
        let state = self.lock();
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Peak memory usage for default space: {} bytes.",
            self.ledger.peak()
        );
        for (stat, timing) in &state.timings {
            let _ = writeln!(
                out,
                "Entry point '{}': {} runs, {} us total.",
                stat,
                timing.runs,
                timing.total.as_micros()
            );
        }
        out
    }

    /// Write the debugging report to `out`.
    pub fn report_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        out.write_all(self.report().as_bytes())
    }

    /// Write the debugging report to stderr.
    pub fn debugging_report(&self) {
        let _ = self.report_to(&mut io::stderr());
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new(&ContextConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn debug_context() -> Context {
        let mut config = ContextConfig::new();
        config.set_debugging(true);
        Context::new(&config)
    }

    #[test]
    fn test_new_context_is_empty() {
        let ctx = Context::default();
        assert_eq!(ctx.usage(), MemoryUsage::default());
        assert!(ctx.take_error().is_none());
        assert!(ctx.sync().is_ok());
    }

    #[test]
    fn test_config_is_a_snapshot() {
        let mut config = ContextConfig::new();
        let ctx = Context::new(&config);
        config.set_debugging(true);
        assert!(!ctx.config().debugging);
    }

    #[test]
    fn test_allocate_and_release() {
        let ctx = Context::default();
        let mut slot = Some(ctx.allocate(256, "block").unwrap());
        assert_eq!(ctx.current_usage(), 256);

        assert_eq!(
            ctx.release(&mut slot, "block"),
            Some(Release::Freed { bytes: 256 })
        );
        assert!(slot.is_none());
        assert_eq!(ctx.current_usage(), 0);
        assert_eq!(ctx.peak_usage(), 256);

        // Releasing an empty slot does nothing.
        assert_eq!(ctx.release(&mut slot, "block"), None);
        assert_eq!(ctx.usage().frees, 1);
    }

    #[test]
    fn test_negative_allocation_is_fatal() {
        let ctx = Context::default();
        let err = ctx.allocate(-16, "bad").unwrap_err();
        assert!(err.is_fatal());
        // Allocation failures never land in the error slot.
        assert!(ctx.take_error().is_none());
    }

    #[test]
    fn test_shares_free_exactly_once() {
        let ctx = Context::default();
        let first = ctx.allocate(40, "shared").unwrap();
        let mut slots: Vec<Option<Buffer>> = (0..5).map(|_| Some(ctx.share(&first))).collect();
        slots.push(Some(first));
        assert_eq!(ctx.current_usage(), 40);

        let mut freed = 0;
        for slot in slots.iter_mut() {
            if let Some(Release::Freed { bytes }) = ctx.release(slot, "shared") {
                assert_eq!(bytes, 40);
                freed += 1;
            }
        }
        assert_eq!(freed, 1);
        assert_eq!(ctx.current_usage(), 0);
        assert_eq!(ctx.usage().frees, 1);
    }

    #[test]
    fn test_rebind() {
        let ctx = Context::default();
        let source = ctx.allocate(24, "source").unwrap();
        let mut target = Some(ctx.allocate(8, "target").unwrap());
        assert_eq!(ctx.current_usage(), 32);

        ctx.rebind(&mut target, &source, "target");
        let target = target.unwrap();
        assert!(target.same_storage(&source));
        assert_eq!(source.ref_count(), 2);
        assert_eq!(ctx.current_usage(), 24);

        // Rebinding an empty slot only shares.
        let mut empty = None;
        ctx.rebind(&mut empty, &source, "empty");
        assert_eq!(source.ref_count(), 3);
    }

    #[test]
    fn test_error_slot_last_writer_wins() {
        let ctx = Context::default();
        {
            let mut state = ctx.lock();
            let _ = ctx.fail::<()>(&mut state, RuntimeError::ForeignArray);
            let _ = ctx.fail::<()>(
                &mut state,
                RuntimeError::OutputTooShort {
                    expected: 3,
                    got: 1,
                },
            );
        }
        assert_eq!(
            ctx.take_error().as_deref(),
            Some("Output buffer holds 1 values but the array has 3")
        );
        assert!(ctx.take_error().is_none());
    }

    #[test]
    fn test_report_silent_without_debugging() {
        let ctx = Context::default();
        let _buf = ctx.allocate(64, "x").unwrap();
        assert!(ctx.report().is_empty());

        let mut out = Vec::new();
        ctx.report_to(&mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_report_peak_usage() {
        let ctx = debug_context();
        let mut slot = Some(ctx.allocate(128, "x").unwrap());
        ctx.release(&mut slot, "x");
        let report = ctx.report();
        assert!(report.contains("Peak memory usage for default space: 128 bytes."));
    }
}
