//! statrt - Reference-Counted Array Runtime with Statistic Entry Points
//!
//! Execution backend for compiled numeric pipelines. Callers build a
//! one-dimensional `f64` array handle through a [`Context`], run one of six
//! statistic entry points over it, and free the handle.
//!
//! # Features
//!
//! - **Shared buffers**: array storage is reference counted; the last release
//!   frees it and refunds the context's usage counters exactly once
//! - **Usage accounting**: current and peak bytes per context, with optional
//!   per-block traces and a peak-usage debugging report
//! - **Fixed statistics**: sum, mean, variance, skew, kurtosis, stddev, each a
//!   one- or two-pass kernel from `statrt-kernels`
//! - **Thread-safe contexts**: one lock serialises allocation, release and
//!   entry points across threads
//! - **C ABI**: `statrt_*` functions for host processes (see [`capi`])
//!
//! # Example
//!
//! ```rust
//! use statrt::{Context, ContextConfig};
//!
//! let ctx = Context::new(&ContextConfig::new());
//! let xs = ctx.new_array(&[1.0, 2.0, 3.0, 4.0]).unwrap();
//!
//! assert_eq!(ctx.sum(&xs).unwrap(), 10.0);
//! assert_eq!(ctx.mean(&xs).unwrap(), 2.5);
//! assert_eq!(ctx.variance(&xs).unwrap(), 5.0 / 3.0);
//!
//! ctx.free_array(xs).unwrap();
//! assert_eq!(ctx.current_usage(), 0);
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  Caller / C ABI │
//! └────────┬────────┘
//!          │ ArrayF64
//!          ▼
//! ┌─────────────────┐   lock    ┌──────────────────┐
//! │  Entry points   │──────────▶│     Context      │
//! └────────┬────────┘           │ ledger, errors   │
//!          │ &[f64]             └──────────────────┘
//!          ▼
//! ┌─────────────────┐
//! │ statrt-kernels  │  sum / mean / moments
//! └─────────────────┘
//! ```

#![warn(clippy::all)]

pub mod capi;
pub mod config;
pub mod entry;
pub mod error;
pub mod runtime;

#[cfg(test)]
mod test_log;

pub use config::{ConfigError, ConfigResult, ContextConfig, ReportConfig, StatrtConfig};
pub use entry::Statistic;
pub use error::{Result, RuntimeError};
pub use runtime::{
    ArrayF64, Buffer, Context, EntryTiming, MemoryLedger, MemoryUsage, Release, ELEMENT_SIZE,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
