//! Runtime error types

use thiserror::Error;

/// Errors produced by the array runtime.
///
/// `NegativeAllocation` is the only fatal variant: it means the caller (or
/// the code generator driving it) broke the allocation contract. The C
/// boundary aborts on it; Rust callers get it back and must not retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error("Negative allocation of {size} bytes attempted for {tag}")]
    NegativeAllocation { size: i64, tag: String },

    #[error("Failed to allocate {size} bytes for {tag}")]
    OutOfMemory { size: usize, tag: String },

    #[error("Raw block of {len} bytes cannot hold {count} values at byte offset {offset}")]
    RawOutOfBounds {
        len: usize,
        offset: usize,
        count: usize,
    },

    #[error("Output buffer holds {got} values but the array has {expected}")]
    OutputTooShort { expected: usize, got: usize },

    #[error("Array was allocated by a different context")]
    ForeignArray,

    #[error("Unknown statistic: {0}")]
    UnknownStatistic(String),
}

impl RuntimeError {
    /// Whether this error denotes a broken caller contract.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RuntimeError::NegativeAllocation { .. })
    }
}

/// Result type for runtime operations.
pub type Result<T> = std::result::Result<T, RuntimeError>;
