//! Positional reads over the database file.
//!
//! The file handle is owned exclusively by the reader and its cursor is
//! mutated by every read, so callers that interleave traversals must
//! serialise them. The file is opened read-only and never written.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use tracing::debug;

use crate::error::Result;
use crate::sqlite::core::header::DatabaseHeader;

pub struct FileReader {
    file: File,
    size: u64,
}

impl FileReader {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let size = file.metadata()?.len();
        debug!("opened {} ({} bytes)", path.display(), size);
        Ok(Self { file, size })
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn position(&mut self) -> Result<u64> {
        Ok(self.file.stream_position()?)
    }

    pub fn seek(&mut self, pos: u64) -> Result<()> {
        self.file.seek(SeekFrom::Start(pos))?;
        Ok(())
    }

    /// Positions the cursor at the start of a page's B-tree area. Page 1
    /// carries the 100-byte file header, so its B-tree area begins at
    /// offset 100; every other page begins at `(n - 1) * page_size`.
    pub fn seek_to_page(&mut self, page_number: u32, page_size: u16) -> Result<()> {
        let mut offset = (page_number as u64 - 1) * page_size as u64;
        if page_number == 1 {
            offset += DatabaseHeader::SIZE as u64;
        }
        self.seek(offset)
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.file.read_exact(&mut buf)?;
        Ok(buf)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.file.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.file.read_exact(&mut buf)?;
        Ok(u16::from_be_bytes(buf))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.file.read_exact(&mut buf)?;
        Ok(u32::from_be_bytes(buf))
    }

    /// Reads a varint byte-by-byte from the current position. The ninth
    /// byte, when reached, contributes all eight bits.
    pub fn read_varint(&mut self) -> Result<i64> {
        let mut value: i64 = 0;
        for _ in 0..8 {
            let byte = self.read_u8()?;
            value = (value << 7) | (byte & 0x7f) as i64;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        let byte = self.read_u8()?;
        Ok((value << 8) | byte as i64)
    }
}
