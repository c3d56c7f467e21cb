//! One-dimensional f64 array handles
//!
//! An `ArrayF64` binds one buffer reference to a shape `[count]`. Handles are
//! created, read and destroyed through their `Context`.

use crate::error::{Result, RuntimeError};
use crate::runtime::buffer::{Buffer, ELEMENT_SIZE};
use crate::runtime::context::Context;
use crate::runtime::memory::MemoryLedger;
use std::sync::Arc;

/// Handle to a one-dimensional array of f64.
#[derive(Debug)]
pub struct ArrayF64 {
    buffer: Buffer,
    shape: [i64; 1],
}

impl ArrayF64 {
    /// Shape vector `[count]`.
    pub fn shape(&self) -> [i64; 1] {
        self.shape
    }

    /// Shape vector by reference; stays valid as long as the handle.
    pub fn shape_ref(&self) -> &[i64; 1] {
        &self.shape
    }

    pub fn len(&self) -> usize {
        self.shape[0] as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The backing buffer.
    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    /// Address of the first element, without copying or locking.
    ///
    /// The pointer is valid until this handle is freed or rebound. Readers on
    /// other threads must synchronise with those operations themselves.
    pub fn raw_view(&self) -> *const f64 {
        self.buffer.as_ptr() as *const f64
    }

    /// Elements, without the lock.
    pub(crate) fn values(&self) -> &[f64] {
        &self.buffer.as_f64s()[..self.len()]
    }

    pub(crate) fn belongs_to(&self, ledger: &Arc<MemoryLedger>) -> bool {
        Arc::ptr_eq(self.buffer.ledger(), ledger)
    }
}

impl Context {
    /// Create an array holding a copy of `data`.
    pub fn new_array(&self, data: &[f64]) -> Result<ArrayF64> {
        let _state = self.lock();
        let buffer = Buffer::from_f64s(&self.ledger, data, "new_array")?;
        Ok(ArrayF64 {
            buffer,
            shape: [data.len() as i64],
        })
    }

    /// Create an array of `count` native-endian f64s read from `bytes`
    /// starting at byte `offset`.
    pub fn new_array_from_raw(
        &self,
        bytes: &[u8],
        offset: usize,
        count: usize,
    ) -> Result<ArrayF64> {
        let mut state = self.lock();
        let end = count
            .checked_mul(ELEMENT_SIZE)
            .and_then(|len| len.checked_add(offset));
        let source = match end {
            Some(end) if end <= bytes.len() => &bytes[offset..end],
            _ => {
                return self.fail(
                    &mut state,
                    RuntimeError::RawOutOfBounds {
                        len: bytes.len(),
                        offset,
                        count,
                    },
                )
            }
        };
        let buffer = Buffer::from_ne_bytes(&self.ledger, source, count, "new_array_from_raw")?;
        Ok(ArrayF64 {
            buffer,
            shape: [count as i64],
        })
    }

    /// Destroy `array`, releasing its buffer reference.
    ///
    /// A handle from another context is rejected with `ForeignArray`, but it
    /// has been taken by value and is dropped on return: its reference is
    /// released without this context's bookkeeping and without the owning
    /// context's lock. The bytes are refunded to the owning context's ledger,
    /// whose counters are atomic, so its usage stays exact.
    pub fn free_array(&self, array: ArrayF64) -> Result<()> {
        let mut state = self.lock();
        if !array.belongs_to(&self.ledger) {
            return self.fail(&mut state, RuntimeError::ForeignArray);
        }
        self.unref_locked(array.buffer, "array");
        Ok(())
    }

    /// Copy the array's elements into `out`.
    pub fn array_values(&self, array: &ArrayF64, out: &mut [f64]) -> Result<()> {
        let mut state = self.lock();
        if !array.belongs_to(&self.ledger) {
            return self.fail(&mut state, RuntimeError::ForeignArray);
        }
        let values = array.values();
        if out.len() < values.len() {
            return self.fail(
                &mut state,
                RuntimeError::OutputTooShort {
                    expected: values.len(),
                    got: out.len(),
                },
            );
        }
        out[..values.len()].copy_from_slice(values);
        Ok(())
    }

    /// Zero-copy view of the array's storage. Takes no lock.
    pub fn array_values_raw(&self, array: &ArrayF64) -> *const f64 {
        array.raw_view()
    }

    pub fn array_shape(&self, array: &ArrayF64) -> [i64; 1] {
        array.shape()
    }

    /// Replace `target`'s storage with a reference to `source`'s.
    pub fn rebind_array(&self, target: &mut ArrayF64, source: &ArrayF64) -> Result<()> {
        let mut state = self.lock();
        if !target.belongs_to(&self.ledger) || !source.belongs_to(&self.ledger) {
            return self.fail(&mut state, RuntimeError::ForeignArray);
        }
        let old = std::mem::replace(&mut target.buffer, source.buffer.share());
        target.shape = source.shape;
        self.unref_locked(old, "array");
        Ok(())
    }
}
