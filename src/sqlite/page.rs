//! B-tree pages.
//!
//! Every page is one of four kinds, identified by the first byte of its
//! B-tree area:
//!
//! - 2: interior index
//! - 5: interior table
//! - 10: leaf index
//! - 13: leaf table
//!
//! The B-tree area starts at the page boundary, except on page 1 where the
//! 100-byte file header comes first. A page holds:
//!
//! - Page header (8 bytes; interior pages add a 4-byte right-most child)
//! - Cell pointer array: `cell_count` big-endian 2-byte offsets
//! - Unallocated space
//! - Cell content area
//!
//! Cell pointer offsets are relative to the start of the page proper, even
//! on page 1.

use tracing::debug;

use crate::error::{Error, Result};
use crate::sqlite::core::header::DatabaseHeader;
use crate::sqlite::core::reader::FileReader;
use crate::sqlite::overflow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    InteriorIndex,
    InteriorTable,
    LeafIndex,
    LeafTable,
}

impl PageKind {
    pub fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            2 => Ok(Self::InteriorIndex),
            5 => Ok(Self::InteriorTable),
            10 => Ok(Self::LeafIndex),
            13 => Ok(Self::LeafTable),
            other => Err(Error::malformed(format!("invalid page kind byte {other}"))),
        }
    }

    pub fn is_leaf(self) -> bool {
        matches!(self, Self::LeafIndex | Self::LeafTable)
    }

    pub fn is_interior(self) -> bool {
        !self.is_leaf()
    }

    pub fn is_table(self) -> bool {
        matches!(self, Self::InteriorTable | Self::LeafTable)
    }

    /// Header length: 8 bytes for leaves, 12 for interior pages.
    fn header_size(self) -> usize {
        if self.is_leaf() {
            8
        } else {
            12
        }
    }
}

/// Common page header, plus the right-most child for interior kinds.
#[derive(Debug)]
pub struct PageHeader {
    pub kind: PageKind,
    pub first_freeblock: u16,
    pub cell_count: u16,
    pub cell_content_start: u16,
    pub fragmented_free_bytes: u8,
    pub right_most_pointer: Option<u32>,
}

/// One cell, shaped by its page kind. Payloads are fully reassembled,
/// overflow included.
#[derive(Debug)]
pub enum Cell {
    TableLeaf { rowid: i64, payload: Vec<u8> },
    TableInterior { left_child: u32, rowid: i64 },
    IndexLeaf { payload: Vec<u8> },
    IndexInterior { left_child: u32, payload: Vec<u8> },
}

/// An immutable parse of one page: header, then every cell in pointer-array
/// order.
#[derive(Debug)]
pub struct BTreePage {
    pub header: PageHeader,
    cells: Vec<Cell>,
}

impl BTreePage {
    /// Peeks at a page's kind byte without parsing the page.
    pub fn kind_of(
        reader: &mut FileReader,
        db_header: &DatabaseHeader,
        page_number: u32,
    ) -> Result<PageKind> {
        reader.seek_to_page(page_number, db_header.page_size)?;
        PageKind::from_byte(reader.read_u8()?)
    }

    /// Parses a page, requiring it to be of the expected kind.
    pub fn read(
        reader: &mut FileReader,
        db_header: &DatabaseHeader,
        page_number: u32,
        expected: PageKind,
    ) -> Result<Self> {
        reader.seek_to_page(page_number, db_header.page_size)?;

        let kind = PageKind::from_byte(reader.read_u8()?)?;
        if kind != expected {
            return Err(Error::malformed(format!(
                "page {page_number}: expected {expected:?}, found {kind:?}"
            )));
        }

        let first_freeblock = reader.read_u16()?;
        let cell_count = reader.read_u16()?;
        let cell_content_start = reader.read_u16()?;
        let fragmented_free_bytes = reader.read_u8()?;
        let right_most_pointer = if kind.is_interior() {
            Some(reader.read_u32()?)
        } else {
            None
        };

        let header = PageHeader {
            kind,
            first_freeblock,
            cell_count,
            cell_content_start,
            fragmented_free_bytes,
            right_most_pointer,
        };
        debug!(
            "page {}: {:?}, {} cells, content from {}",
            page_number, kind, cell_count, cell_content_start
        );

        let mut cell_pointers = Vec::with_capacity(cell_count as usize);
        for _ in 0..cell_count {
            cell_pointers.push(reader.read_u16()?);
        }

        // Cells may not sit inside the header or pointer array. On page 1
        // the B-tree area itself starts past the file header.
        let area_start = if page_number == 1 {
            DatabaseHeader::SIZE
        } else {
            0
        };
        let cells_floor = area_start + kind.header_size() + 2 * cell_count as usize;

        let page_start = (page_number as u64 - 1) * db_header.page_size as u64;
        let mut cells = Vec::with_capacity(cell_count as usize);
        for pointer in cell_pointers {
            let offset = pointer as usize;
            if offset < cells_floor || offset >= db_header.page_size as usize {
                return Err(Error::malformed(format!(
                    "page {page_number}: cell offset {offset} out of bounds"
                )));
            }
            reader.seek(page_start + offset as u64)?;
            cells.push(Self::read_cell(reader, db_header, kind)?);
        }

        Ok(Self { header, cells })
    }

    fn read_cell(
        reader: &mut FileReader,
        db_header: &DatabaseHeader,
        kind: PageKind,
    ) -> Result<Cell> {
        let cell = match kind {
            PageKind::LeafTable => {
                let payload_size = Self::payload_size(reader)?;
                let rowid = reader.read_varint()?;
                let payload = overflow::read_payload(reader, db_header, payload_size, true)?;
                Cell::TableLeaf { rowid, payload }
            }
            PageKind::InteriorTable => {
                let left_child = reader.read_u32()?;
                let rowid = reader.read_varint()?;
                Cell::TableInterior { left_child, rowid }
            }
            PageKind::LeafIndex => {
                let payload_size = Self::payload_size(reader)?;
                let payload = overflow::read_payload(reader, db_header, payload_size, false)?;
                Cell::IndexLeaf { payload }
            }
            PageKind::InteriorIndex => {
                let left_child = reader.read_u32()?;
                let payload_size = Self::payload_size(reader)?;
                let payload = overflow::read_payload(reader, db_header, payload_size, false)?;
                Cell::IndexInterior { left_child, payload }
            }
        };
        Ok(cell)
    }

    fn payload_size(reader: &mut FileReader) -> Result<u64> {
        let size = reader.read_varint()?;
        u64::try_from(size).map_err(|_| Error::malformed(format!("negative payload size {size}")))
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }
}
