//! Cursor over a memory-resident byte buffer.
//!
//! Record payloads are reassembled into a single buffer before decoding, so
//! the record layer reads from here rather than from the file. All multi-byte
//! integers in the file format are big-endian; widths that have no native
//! Rust type (24 and 48 bits) are sign-extended by hand.

use crate::error::{Error, Result};
use crate::sqlite::core::varint;

pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.pos + len > self.data.len() {
            return Err(Error::malformed(format!(
                "read of {} bytes at offset {} overruns buffer of {} bytes",
                len,
                self.pos,
                self.data.len()
            )));
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let bytes = self.take(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Reads a big-endian signed integer of 1, 2, 3, 4, 6 or 8 bytes,
    /// sign-extended to an `i64`.
    pub fn read_int(&mut self, width: usize) -> Result<i64> {
        let bytes = self.take(width)?;
        let mut value: i64 = 0;
        for &b in bytes {
            value = (value << 8) | b as i64;
        }
        let shift = 64 - 8 * width as u32;
        Ok(value.wrapping_shl(shift).wrapping_shr(shift))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        let bytes = self.take(8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(bytes);
        Ok(f64::from_be_bytes(buf))
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        self.take(len)
    }

    pub fn read_varint(&mut self) -> Result<i64> {
        let (value, len) = varint::read_varint(&self.data[self.pos..])?;
        self.pos += len;
        Ok(value)
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }
}
