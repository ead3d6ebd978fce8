//! Database handle.
//!
//! A [`Database`] is a plain value: a read-only file handle plus the parsed
//! 100-byte header. It lives for one command. Page 1 holds the schema table
//! describing every other object in the file.

use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::sqlite::core::header::DatabaseHeader;
use crate::sqlite::core::reader::FileReader;
use crate::sqlite::core::record::Record;
use crate::sqlite::core::schema::{Schema, SchemaRecord};
use crate::sqlite::page::{BTreePage, Cell, PageKind};

pub struct Database {
    pub reader: FileReader,
    pub header: DatabaseHeader,
}

/// Metadata surfaced by `.dbinfo`.
#[derive(Debug)]
pub struct DatabaseInfo {
    page_size: u16,
    num_tables: usize,
}

impl DatabaseInfo {
    pub fn page_size(&self) -> u16 {
        self.page_size
    }

    pub fn num_tables(&self) -> usize {
        self.num_tables
    }
}

impl Database {
    /// Opens a database file and parses its header.
    pub fn open(path: &Path) -> Result<Self> {
        let mut reader = FileReader::open(path)?;
        reader.seek(0)?;
        let header = DatabaseHeader::parse(&reader.read_bytes(DatabaseHeader::SIZE)?)?;
        info!(
            "opened database: page_size={}, {} pages",
            header.page_size, header.database_size
        );
        Ok(Self { reader, header })
    }

    /// Decodes every schema row on page 1.
    pub fn schema(&mut self) -> Result<Schema> {
        let page = BTreePage::read(&mut self.reader, &self.header, 1, PageKind::LeafTable)?;

        let mut entries = Vec::with_capacity(page.cells().len());
        for cell in page.cells() {
            let Cell::TableLeaf { payload, .. } = cell else {
                continue;
            };
            let record = Record::parse(payload)?;
            entries.push(SchemaRecord::from_record(&record)?);
        }

        Ok(Schema::new(entries))
    }

    /// Page size and table count for `.dbinfo`.
    pub fn info(&mut self) -> Result<DatabaseInfo> {
        let schema = self.schema()?;
        Ok(DatabaseInfo {
            page_size: self.header.page_size,
            num_tables: schema.count_tables(),
        })
    }

    /// User-table names for `.tables`, in schema order.
    pub fn table_names(&mut self) -> Result<Vec<String>> {
        Ok(self.schema()?.user_table_names())
    }
}
