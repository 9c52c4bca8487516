//! Append-only reassembly buffer owned by one stream.
//!
//! A [`FragmentAccumulator`] collects the payload bytes of the packets that make up
//! one access unit. Bytes are only ever appended in delivery order. The buffer is
//! opened on the first fragment of a unit, closed when the unit completes (handing
//! its bytes to the caller) and discarded when the stream loses continuity.

use bytes::Bytes;

use crate::constants::{ACCUMULATOR_INITIAL_CAPACITY, DEFAULT_MAX_UNIT_SIZE};
use crate::error::DepacketizeError;

/// Growable byte buffer with an explicit open/closed lifecycle.
#[derive(Debug)]
pub struct FragmentAccumulator {
    buffer: Vec<u8>,
    open: bool,
    max_size: usize,
}

impl Default for FragmentAccumulator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_UNIT_SIZE)
    }
}

impl FragmentAccumulator {
    /// Creates a closed accumulator whose content may never exceed `max_size` bytes.
    pub fn new(max_size: usize) -> Self {
        Self {
            buffer: Vec::new(),
            open: false,
            max_size,
        }
    }

    /// Returns `true` while a unit is being accumulated.
    #[inline]
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Number of bytes accumulated for the current unit.
    #[inline]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns `true` if no bytes are held.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Upper bound on the size of one accumulated unit.
    #[inline]
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Currently reserved capacity, exposed for memory-bound checks.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Starts a new unit.
    ///
    /// # Errors
    /// - [`DepacketizeError::AccumulatorState`] - The accumulator is already open
    pub fn open(&mut self) -> Result<(), DepacketizeError> {
        if self.open {
            return Err(DepacketizeError::AccumulatorState(
                "open() called on an accumulator that is already open".to_string(),
            ));
        }
        debug_assert!(self.buffer.is_empty());
        self.open = true;
        Ok(())
    }

    /// Appends `bytes` to the current unit.
    ///
    /// Capacity grows geometrically but never beyond `max_size`. On error the
    /// accumulated content is left exactly as it was.
    ///
    /// # Errors
    /// - [`DepacketizeError::AccumulatorState`] - The accumulator is not open
    /// - [`DepacketizeError::UnitTooLarge`] - The unit would exceed `max_size`
    /// - [`DepacketizeError::OutOfMemory`] - The allocator refused to grow the buffer
    pub fn append(&mut self, bytes: &[u8]) -> Result<(), DepacketizeError> {
        if !self.open {
            return Err(DepacketizeError::AccumulatorState(
                "append() called on a closed accumulator".to_string(),
            ));
        }
        let target = self.buffer.len() + bytes.len();
        if target > self.max_size {
            return Err(DepacketizeError::UnitTooLarge {
                size: target,
                limit: self.max_size,
            });
        }
        if target > self.buffer.capacity() {
            let grown = (self.buffer.capacity() * 2)
                .max(ACCUMULATOR_INITIAL_CAPACITY)
                .max(target)
                .min(self.max_size);
            let additional = grown - self.buffer.len();
            self.buffer
                .try_reserve_exact(additional)
                .map_err(|_| DepacketizeError::OutOfMemory {
                    requested: additional,
                })?;
        }
        self.buffer.extend_from_slice(bytes);
        Ok(())
    }

    /// Completes the current unit and transfers its bytes to the caller.
    ///
    /// # Errors
    /// - [`DepacketizeError::AccumulatorState`] - The accumulator is not open
    pub fn close(&mut self) -> Result<Bytes, DepacketizeError> {
        if !self.open {
            return Err(DepacketizeError::AccumulatorState(
                "close() called on a closed accumulator".to_string(),
            ));
        }
        self.open = false;
        Ok(Bytes::from(std::mem::take(&mut self.buffer)))
    }

    /// Drops the current unit, if any. Always succeeds and is idempotent.
    pub fn discard(&mut self) {
        self.buffer.clear();
        self.open = false;
    }
}
