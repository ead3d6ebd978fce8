//! B-tree traversal: full scans, index point lookups, and rowid fetches.
//!
//! Table trees key rows by rowid; index trees key by application value with
//! the referenced rowid as the last record column. Within a page, stored
//! cell order is authoritative; scans emit rows in that order.

use tracing::debug;

use crate::error::Result;
use crate::sqlite::core::header::DatabaseHeader;
use crate::sqlite::core::reader::FileReader;
use crate::sqlite::core::record::{Record, Row, Value};
use crate::sqlite::core::schema::ROWID_COLUMN;
use crate::sqlite::page::{BTreePage, Cell, PageKind};
use crate::sqlite::statement::WhereClause;

/// Traversal over one database file. Holds the reader for the duration of a
/// query; every operation seeks from scratch, so operations may be issued in
/// any order.
pub struct BTree<'a> {
    reader: &'a mut FileReader,
    header: &'a DatabaseHeader,
}

impl<'a> BTree<'a> {
    pub fn new(reader: &'a mut FileReader, header: &'a DatabaseHeader) -> Self {
        Self { reader, header }
    }

    /// Counts the rows of a table tree: the sum of leaf cell counts across
    /// every page reachable from `page_number`.
    pub fn count_rows(&mut self, page_number: u32) -> Result<u64> {
        match BTreePage::kind_of(self.reader, self.header, page_number)? {
            PageKind::LeafTable => {
                let page =
                    BTreePage::read(self.reader, self.header, page_number, PageKind::LeafTable)?;
                Ok(page.header.cell_count as u64)
            }
            _ => {
                let page = BTreePage::read(
                    self.reader,
                    self.header,
                    page_number,
                    PageKind::InteriorTable,
                )?;

                let mut total = 0;
                for cell in page.cells() {
                    if let Cell::TableInterior { left_child, .. } = cell {
                        total += self.count_rows(*left_child)?;
                    }
                }
                if let Some(right) = page.header.right_most_pointer {
                    if right != 0 {
                        total += self.count_rows(right)?;
                    }
                }
                Ok(total)
            }
        }
    }

    /// Full table scan. Emits one row per leaf cell whose record passes the
    /// filter, with fields picked by `projections` (the rowid for
    /// [`ROWID_COLUMN`], the record value at the position otherwise).
    ///
    /// `where_col` of [`ROWID_COLUMN`] means unfiltered.
    pub fn scan(
        &mut self,
        page_number: u32,
        projections: &[i64],
        where_col: i64,
        filter: Option<&WhereClause>,
        results: &mut Vec<Row>,
    ) -> Result<()> {
        match BTreePage::kind_of(self.reader, self.header, page_number)? {
            PageKind::LeafTable => {
                let page =
                    BTreePage::read(self.reader, self.header, page_number, PageKind::LeafTable)?;

                for cell in page.cells() {
                    let Cell::TableLeaf { rowid, payload } = cell else {
                        continue;
                    };
                    let record = Record::parse(payload)?;
                    let values = record.values();

                    if where_col == ROWID_COLUMN || matches_filter(values, where_col, filter) {
                        results.push(project_row(values, *rowid, projections));
                    }
                }
            }
            _ => {
                let page = BTreePage::read(
                    self.reader,
                    self.header,
                    page_number,
                    PageKind::InteriorTable,
                )?;

                for cell in page.cells() {
                    if let Cell::TableInterior { left_child, .. } = cell {
                        self.scan(*left_child, projections, where_col, filter, results)?;
                    }
                }
                if let Some(right) = page.header.right_most_pointer {
                    if right != 0 {
                        self.scan(right, projections, where_col, filter, results)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Point lookup in an index tree: collects the rowids of every entry
    /// whose key equals `needle`.
    ///
    /// Keys equal to an interior separator may live on either side of it, so
    /// interior cells are both checked and descended, and the right-most
    /// child is always visited. Correctness over speed; no pruning.
    pub fn scan_index(
        &mut self,
        page_number: u32,
        needle: &str,
        rowids: &mut Vec<i64>,
    ) -> Result<()> {
        match BTreePage::kind_of(self.reader, self.header, page_number)? {
            PageKind::LeafIndex => {
                let page =
                    BTreePage::read(self.reader, self.header, page_number, PageKind::LeafIndex)?;

                for cell in page.cells() {
                    let Cell::IndexLeaf { payload } = cell else {
                        continue;
                    };
                    push_matching_rowid(&Record::parse(payload)?, needle, rowids);
                }
            }
            _ => {
                let page = BTreePage::read(
                    self.reader,
                    self.header,
                    page_number,
                    PageKind::InteriorIndex,
                )?;

                for cell in page.cells() {
                    let Cell::IndexInterior {
                        left_child,
                        payload,
                    } = cell
                    else {
                        continue;
                    };
                    push_matching_rowid(&Record::parse(payload)?, needle, rowids);
                    let left_child = *left_child;
                    self.scan_index(left_child, needle, rowids)?;
                }
                if let Some(right) = page.header.right_most_pointer {
                    if right != 0 {
                        self.scan_index(right, needle, rowids)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Fetches the row with the given rowid, descending interior pages by
    /// separator. Equality pushes left: the first cell whose separator is
    /// `>=` the target claims it. A missing rowid emits nothing.
    pub fn find_row(
        &mut self,
        page_number: u32,
        rowid: i64,
        projections: &[i64],
        results: &mut Vec<Row>,
    ) -> Result<()> {
        match BTreePage::kind_of(self.reader, self.header, page_number)? {
            PageKind::LeafTable => {
                let page =
                    BTreePage::read(self.reader, self.header, page_number, PageKind::LeafTable)?;

                for cell in page.cells() {
                    let Cell::TableLeaf {
                        rowid: cell_rowid,
                        payload,
                    } = cell
                    else {
                        continue;
                    };
                    if *cell_rowid == rowid {
                        let record = Record::parse(payload)?;
                        results.push(project_row(record.values(), rowid, projections));
                        return Ok(());
                    }
                }
            }
            _ => {
                let page = BTreePage::read(
                    self.reader,
                    self.header,
                    page_number,
                    PageKind::InteriorTable,
                )?;

                if page.cells().is_empty() {
                    debug!("interior page {page_number} has no cells");
                    return Ok(());
                }

                let mut child = page.header.right_most_pointer.unwrap_or(0);
                for cell in page.cells() {
                    if let Cell::TableInterior {
                        left_child,
                        rowid: separator,
                    } = cell
                    {
                        if *separator >= rowid {
                            child = *left_child;
                            break;
                        }
                    }
                }

                if child != 0 {
                    self.find_row(child, rowid, projections, results)?;
                }
            }
        }
        Ok(())
    }
}

/// Builds an output row: the rowid for the pseudo-column position, the
/// record value otherwise. Positions past the record's end are skipped.
fn project_row(values: &[Value], rowid: i64, projections: &[i64]) -> Row {
    let mut row = Vec::with_capacity(projections.len());
    for &pos in projections {
        if pos == ROWID_COLUMN {
            row.push(Value::Integer(rowid));
        } else if let Some(value) = values.get(pos as usize) {
            row.push(value.clone());
        }
    }
    row
}

/// Text-only equality: the record value at `where_col` must be text equal to
/// the clause value, with one pair of surrounding single quotes stripped
/// from the latter.
fn matches_filter(values: &[Value], where_col: i64, filter: Option<&WhereClause>) -> bool {
    let Some(clause) = filter else {
        return false;
    };
    if where_col < 0 {
        return false;
    }
    let Some(Value::Text(text)) = values.get(where_col as usize) else {
        return false;
    };

    let mut needle = clause.value.as_str();
    if needle.len() >= 2 && needle.starts_with('\'') && needle.ends_with('\'') {
        needle = &needle[1..needle.len() - 1];
    }

    clause.operator == '=' && text == needle
}

/// Appends an index entry's rowid when its key matches. Index records carry
/// the key first and the rowid last; entries with fewer than two values are
/// ignored, as are rowids already collected.
fn push_matching_rowid(record: &Record, needle: &str, rowids: &mut Vec<i64>) {
    let values = record.values();
    if values.len() < 2 {
        return;
    }
    let (Some(key), Some(rowid)) = (values[0].as_text(), values[values.len() - 1].as_integer())
    else {
        return;
    };
    if key == needle && !rowids.contains(&rowid) {
        rowids.push(rowid);
    }
}
