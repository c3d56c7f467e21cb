//! Reference-counted storage blocks
//!
//! A `Buffer` is one reference to a `Block`. The block's storage and its
//! ledger refund go away together in `Drop`, which `Arc` runs exactly once,
//! when the last reference is released.

use crate::error::{Result, RuntimeError};
use crate::runtime::memory::MemoryLedger;
use std::sync::Arc;

/// Size in bytes of one array element.
pub const ELEMENT_SIZE: usize = std::mem::size_of::<f64>();

/// Owned storage plus the ledger it was charged to.
#[derive(Debug)]
struct Block {
    /// Backing words; u64 keeps the storage aligned for f64 views
    words: Box<[u64]>,
    /// Size in bytes as requested (may be less than `words.len() * 8`)
    size: usize,
    /// Diagnostic label given at allocation
    tag: String,
    ledger: Arc<MemoryLedger>,
}

impl Drop for Block {
    fn drop(&mut self) {
        self.ledger.refund(self.size, &self.tag);
    }
}

/// Outcome of releasing one reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    /// That was the last reference; the storage is gone
    Freed { bytes: usize },
    /// Other owners remain
    Retained { remaining: usize },
}

/// Shared reference to a storage block.
///
/// Not `Clone`: new references are made through `Context::share` so every
/// reference-count change goes through the context.
#[derive(Debug)]
pub struct Buffer {
    block: Arc<Block>,
}

impl Buffer {
    /// Allocate `size` zeroed bytes and charge them to `ledger`.
    pub(crate) fn allocate(ledger: &Arc<MemoryLedger>, size: i64, tag: &str) -> Result<Buffer> {
        if size < 0 {
            return Err(RuntimeError::NegativeAllocation {
                size,
                tag: tag.to_string(),
            });
        }
        let size = size as usize;
        let words = alloc_words(size, tag)?;
        Ok(Self::from_words(ledger, words, size, tag))
    }

    /// Allocate a block holding a copy of `values`.
    pub(crate) fn from_f64s(
        ledger: &Arc<MemoryLedger>,
        values: &[f64],
        tag: &str,
    ) -> Result<Buffer> {
        let size = values.len() * ELEMENT_SIZE;
        let mut words = alloc_words(size, tag)?;
        for (word, value) in words.iter_mut().zip(values) {
            *word = value.to_bits();
        }
        Ok(Self::from_words(ledger, words, size, tag))
    }

    /// Allocate a block holding `count` native-endian f64s read from `bytes`.
    ///
    /// The caller has already checked that `bytes` holds `count` elements.
    pub(crate) fn from_ne_bytes(
        ledger: &Arc<MemoryLedger>,
        bytes: &[u8],
        count: usize,
        tag: &str,
    ) -> Result<Buffer> {
        let size = count * ELEMENT_SIZE;
        let mut words = alloc_words(size, tag)?;
        for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(ELEMENT_SIZE)) {
            let mut raw = [0u8; ELEMENT_SIZE];
            raw.copy_from_slice(chunk);
            *word = u64::from_ne_bytes(raw);
        }
        Ok(Self::from_words(ledger, words, size, tag))
    }

    fn from_words(ledger: &Arc<MemoryLedger>, words: Vec<u64>, size: usize, tag: &str) -> Buffer {
        ledger.charge(size, tag);
        Buffer {
            block: Arc::new(Block {
                words: words.into_boxed_slice(),
                size,
                tag: tag.to_string(),
                ledger: Arc::clone(ledger),
            }),
        }
    }

    /// New reference to the same storage.
    pub(crate) fn share(&self) -> Buffer {
        Buffer {
            block: Arc::clone(&self.block),
        }
    }

    /// Drop this reference, reporting whether it was the last one.
    pub(crate) fn release(self) -> Release {
        match Arc::try_unwrap(self.block) {
            Ok(block) => {
                let bytes = block.size;
                drop(block);
                Release::Freed { bytes }
            }
            Err(block) => Release::Retained {
                remaining: Arc::strong_count(&block) - 1,
            },
        }
    }

    pub(crate) fn ledger(&self) -> &Arc<MemoryLedger> {
        &self.block.ledger
    }

    /// Size in bytes.
    pub fn size(&self) -> usize {
        self.block.size
    }

    /// Label given at allocation.
    pub fn tag(&self) -> &str {
        &self.block.tag
    }

    /// Number of live references, this one included.
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.block)
    }

    /// Whether both references point at the same storage.
    pub fn same_storage(&self, other: &Buffer) -> bool {
        Arc::ptr_eq(&self.block, &other.block)
    }

    /// Storage as bytes.
    pub fn as_bytes(&self) -> &[u8] {
        // Safety: `words` spans at least `size` bytes and u8 has no alignment
        // requirement.
        unsafe {
            std::slice::from_raw_parts(self.block.words.as_ptr() as *const u8, self.block.size)
        }
    }

    /// Storage as whole f64 elements.
    pub fn as_f64s(&self) -> &[f64] {
        // Safety: u64 and f64 share size and alignment, every bit pattern is
        // a valid f64, and `size / 8 <= words.len()`.
        unsafe {
            std::slice::from_raw_parts(
                self.block.words.as_ptr() as *const f64,
                self.block.size / ELEMENT_SIZE,
            )
        }
    }

    /// Address of the storage.
    pub fn as_ptr(&self) -> *const u8 {
        self.block.words.as_ptr() as *const u8
    }
}

fn alloc_words(size: usize, tag: &str) -> Result<Vec<u64>> {
    let count = size.div_ceil(ELEMENT_SIZE);
    let mut words = Vec::new();
    words
        .try_reserve_exact(count)
        .map_err(|_| RuntimeError::OutOfMemory {
            size,
            tag: tag.to_string(),
        })?;
    words.resize(count, 0);
    Ok(words)
}
