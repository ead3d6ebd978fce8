//! Payload overflow.
//!
//! A cell stores at most a "local" prefix of its payload; the rest lives on
//! a linked chain of overflow pages. Each overflow page starts with a 4-byte
//! next-page number (0 terminates the chain) followed by payload content.
//!
//! The split point is fixed by the file format. With usable page size
//! `U = page_size - reserved`:
//!
//! - table-leaf cells: `X = U - 35`
//! - index cells (leaf and interior): `X = (U - 12) * 64 / 255 - 23`
//! - `M = (U - 12) * 32 / 255 - 23`
//!
//! A payload of `P` bytes is entirely local when `P <= X`. Otherwise the
//! local portion is `K = M + (P - M) % (U - 4)` when `K <= X`, else `M`.

use std::collections::HashSet;

use tracing::debug;

use crate::error::{Error, Result};
use crate::sqlite::core::header::DatabaseHeader;
use crate::sqlite::core::reader::FileReader;

/// Number of payload bytes stored inside the cell itself.
pub fn local_payload_size(usable_size: u32, is_table_leaf: bool, payload_size: u64) -> usize {
    let usable = usable_size as u64;
    let x = if is_table_leaf {
        usable - 35
    } else {
        (usable - 12) * 64 / 255 - 23
    };
    let m = (usable - 12) * 32 / 255 - 23;

    if payload_size <= x {
        return payload_size as usize;
    }

    let k = m + (payload_size - m) % (usable - 4);
    if k <= x {
        k as usize
    } else {
        m as usize
    }
}

/// Reads a full cell payload from the reader's current position: the local
/// bytes, then, if the payload overflowed, the 4-byte first-overflow-page
/// number and the chain it heads.
pub fn read_payload(
    reader: &mut FileReader,
    header: &DatabaseHeader,
    payload_size: u64,
    is_table_leaf: bool,
) -> Result<Vec<u8>> {
    let local = local_payload_size(header.usable_page_size(), is_table_leaf, payload_size);
    let mut payload = reader.read_bytes(local)?;

    if (local as u64) < payload_size {
        let first_page = reader.read_u32()?;
        let remaining = payload_size - local as u64;
        debug!(
            "payload of {} bytes overflows; {} remaining from page {}",
            payload_size, remaining, first_page
        );
        payload.extend(read_chain(reader, header, first_page, remaining)?);
    }

    Ok(payload)
}

/// Walks the overflow chain, concatenating content until `remaining` bytes
/// are gathered. The tail of the last page is trimmed.
fn read_chain(
    reader: &mut FileReader,
    header: &DatabaseHeader,
    first_page: u32,
    remaining: u64,
) -> Result<Vec<u8>> {
    let page_size = header.page_size as u64;
    let content_per_page = page_size - 4;

    // Growth is bounded by the file itself: the chain errors out on a cycle
    // or out-of-range page before content can exceed the file size.
    let mut content = Vec::new();
    let mut visited = HashSet::new();
    let mut current = first_page;

    while (content.len() as u64) < remaining {
        if current == 0 {
            return Err(Error::malformed(format!(
                "overflow chain ended {} bytes early",
                remaining - content.len() as u64
            )));
        }
        if !visited.insert(current) {
            return Err(Error::malformed(format!(
                "cycle in overflow chain at page {current}"
            )));
        }
        if current as u64 * page_size > reader.size() {
            return Err(Error::malformed(format!(
                "overflow page {current} is out of range"
            )));
        }

        reader.seek_to_page(current, header.page_size)?;
        let next = reader.read_u32()?;

        let needed = remaining - content.len() as u64;
        let take = needed.min(content_per_page) as usize;
        content.extend(reader.read_bytes(take)?);

        current = next;
    }

    Ok(content)
}
