//! Runtime module
//!
//! Owns the memory-managed side of statrt: reference-counted buffers, the
//! usage ledger they are charged to, the context that guards both, and the
//! array handles callers pass to entry points.
//!
//! # Ownership
//!
//! ```text
//! Context ──owns──▶ MemoryLedger ◀──charged to── Block
//!                                                  ▲
//! ArrayF64 ──holds──▶ Buffer ──Arc──────────────────┘
//! ```
//!
//! A block is freed, and its bytes refunded, when its last `Buffer` goes.

pub mod array;
pub mod buffer;
pub mod context;
pub mod memory;

pub use array::ArrayF64;
pub use buffer::{Buffer, Release, ELEMENT_SIZE};
pub use context::{Context, EntryTiming};
pub use memory::{MemoryLedger, MemoryUsage};
