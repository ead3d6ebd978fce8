//! SQLite database header.
//!
//! The first 100 bytes of the file are a fixed-layout header:
//!
//! - Bytes 0-15: Header string "SQLite format 3\0"
//! - Bytes 16-17: Page size in bytes (big-endian)
//! - Byte 18: File format write version
//! - Byte 19: File format read version
//! - Byte 20: Reserved space at end of each page
//! - Bytes 21-23: Maximum embedded payload fraction, minimum embedded payload fraction, leaf payload fraction
//! - Bytes 24-27: File change counter
//! - Bytes 28-31: Size of database file in pages
//! - Bytes 32-35: First freelist trunk page
//! - Bytes 36-39: Total number of freelist pages
//! - Bytes 40-43: Schema cookie
//! - Bytes 44-47: Schema format number
//! - Bytes 48-51: Default page cache size
//! - Bytes 52-55: Largest root b-tree page number
//! - Bytes 56-59: Database text encoding (1:UTF-8, 2:UTF-16le, 3:UTF-16be)
//! - Bytes 60-63: User version
//! - Bytes 64-67: Incremental vacuum mode
//! - Bytes 68-71: Application ID
//! - Bytes 72-91: Reserved for expansion
//! - Bytes 92-95: Version-valid-for number
//! - Bytes 96-99: SQLite version number
//!
//! Only the page size drives the engine; the rest is surfaced for `.dbinfo`
//! and the reserved-space byte feeds the usable-page-size computation.

use tracing::debug;

use crate::error::{Error, Result};

/// Parsed form of the 100-byte file header.
#[derive(Debug, Clone)]
pub struct DatabaseHeader {
    /// Page size in bytes (bytes 16-17)
    pub page_size: u16,
    /// File format write version (byte 18)
    pub write_version: u8,
    /// File format read version (byte 19)
    pub read_version: u8,
    /// Reserved space at end of each page (byte 20)
    pub reserved_space: u8,
    /// Maximum embedded payload fraction (byte 21)
    pub max_payload_fraction: u8,
    /// Minimum embedded payload fraction (byte 22)
    pub min_payload_fraction: u8,
    /// Leaf payload fraction (byte 23)
    pub leaf_payload_fraction: u8,
    /// File change counter (bytes 24-27)
    pub file_change_counter: u32,
    /// Size of database file in pages (bytes 28-31)
    pub database_size: u32,
    /// First freelist trunk page (bytes 32-35)
    pub first_freelist_trunk: u32,
    /// Total number of freelist pages (bytes 36-39)
    pub total_freelist_pages: u32,
    /// Schema cookie (bytes 40-43)
    pub schema_cookie: u32,
    /// Schema format number (bytes 44-47)
    pub schema_format: u32,
    /// Default page cache size (bytes 48-51)
    pub page_cache_size: u32,
    /// Largest root b-tree page number (bytes 52-55)
    pub largest_root_page: u32,
    /// Database text encoding (1:UTF-8, 2:UTF-16le, 3:UTF-16be) (bytes 56-59)
    pub text_encoding: u32,
    /// User version (bytes 60-63)
    pub user_version: u32,
    /// Incremental vacuum mode (bytes 64-67)
    pub incremental_vacuum: u32,
    /// Application ID (bytes 68-71)
    pub application_id: u32,
    /// Version valid for number (bytes 92-95)
    pub version_valid_for: u32,
    /// SQLite version number (bytes 96-99)
    pub sqlite_version_number: u32,
}

impl DatabaseHeader {
    /// Size of the header in bytes.
    pub const SIZE: usize = 100;

    /// Magic string that starts every database file.
    const MAGIC_STRING: &'static [u8] = b"SQLite format 3\0";

    /// Parses the header from the first 100 bytes of the file.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::SIZE {
            return Err(Error::malformed("header buffer shorter than 100 bytes"));
        }

        if &bytes[0..16] != Self::MAGIC_STRING {
            return Err(Error::malformed("invalid SQLite magic string"));
        }

        let page_size = u16::from_be_bytes([bytes[16], bytes[17]]);
        if page_size < 512 || !page_size.is_power_of_two() {
            return Err(Error::malformed(format!("invalid page size {page_size}")));
        }

        let u32_at =
            |off: usize| u32::from_be_bytes([bytes[off], bytes[off + 1], bytes[off + 2], bytes[off + 3]]);

        let header = DatabaseHeader {
            page_size,
            write_version: bytes[18],
            read_version: bytes[19],
            reserved_space: bytes[20],
            max_payload_fraction: bytes[21],
            min_payload_fraction: bytes[22],
            leaf_payload_fraction: bytes[23],
            file_change_counter: u32_at(24),
            database_size: u32_at(28),
            first_freelist_trunk: u32_at(32),
            total_freelist_pages: u32_at(36),
            schema_cookie: u32_at(40),
            schema_format: u32_at(44),
            page_cache_size: u32_at(48),
            largest_root_page: u32_at(52),
            text_encoding: u32_at(56),
            user_version: u32_at(60),
            incremental_vacuum: u32_at(64),
            application_id: u32_at(68),
            version_valid_for: u32_at(92),
            sqlite_version_number: u32_at(96),
        };

        debug!(
            "parsed header: page_size={}, reserved={}, pages={}",
            header.page_size, header.reserved_space, header.database_size
        );
        Ok(header)
    }

    /// Page size minus the per-page reserved region; the payload overflow
    /// thresholds are defined over this quantity.
    pub fn usable_page_size(&self) -> u32 {
        self.page_size as u32 - self.reserved_space as u32
    }

    /// Returns true if the database uses UTF-8 encoding.
    pub fn is_utf8(&self) -> bool {
        self.text_encoding == 1
    }
}
