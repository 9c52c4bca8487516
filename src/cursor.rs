//! Bounds-checked big-endian reader over a packet payload.
//!
//! Every read either succeeds or returns [`ParsingError::NotEnoughData`] naming
//! the structure being parsed; a cursor never panics on short input.

use crate::error::ParsingError;

/// Forward-only reader over a borrowed byte slice.
#[derive(Debug, Clone, Copy)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    position: usize,
    context: &'static str,
}

impl<'a> ByteCursor<'a> {
    /// Creates a cursor at the start of `data`.
    ///
    /// `context` names the structure being parsed and is reported in errors.
    pub fn new(data: &'a [u8], context: &'static str) -> Self {
        Self {
            data,
            position: 0,
            context,
        }
    }

    /// Number of bytes consumed so far.
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Number of bytes left to read.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    /// Returns `true` if every byte has been consumed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn ensure(&self, needed: usize) -> Result<(), ParsingError> {
        if self.remaining() < needed {
            return Err(ParsingError::NotEnoughData {
                needed: self.position + needed,
                got: self.data.len(),
                context: self.context,
            });
        }
        Ok(())
    }

    /// Returns the next byte without consuming it.
    pub fn peek_u8(&self) -> Result<u8, ParsingError> {
        self.ensure(1)?;
        Ok(self.data[self.position])
    }

    /// Reads one byte.
    pub fn read_u8(&mut self) -> Result<u8, ParsingError> {
        let value = self.peek_u8()?;
        self.position += 1;
        Ok(value)
    }

    /// Reads a big-endian `u16`.
    pub fn read_u16_be(&mut self) -> Result<u16, ParsingError> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// Reads a little-endian `u16`.
    pub fn read_u16_le(&mut self) -> Result<u16, ParsingError> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    /// Reads a big-endian `u32`.
    pub fn read_u32_be(&mut self) -> Result<u32, ParsingError> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Consumes `len` bytes and returns them as a sub-slice.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], ParsingError> {
        self.ensure(len)?;
        let start = self.position;
        self.position += len;
        Ok(&self.data[start..start + len])
    }

    /// Skips `len` bytes.
    pub fn skip(&mut self, len: usize) -> Result<(), ParsingError> {
        self.ensure(len)?;
        self.position += len;
        Ok(())
    }

    /// Returns everything not yet consumed and moves the cursor to the end.
    pub fn take_rest(&mut self) -> &'a [u8] {
        let rest = &self.data[self.position..];
        self.position = self.data.len();
        rest
    }

    /// Returns everything not yet consumed without moving the cursor.
    #[inline]
    pub fn rest(&self) -> &'a [u8] {
        &self.data[self.position..]
    }
}
