//! Schema discovery.
//!
//! Every row of the schema table on page 1 is a five-column record:
//! `(type, name, tbl_name, rootpage, sql)`. The engine keeps no independent
//! catalogue; column positions are recovered by re-parsing the stored
//! `CREATE TABLE` text through the SQL front-end. A malformed or exotic
//! `CREATE TABLE` string therefore yields an empty column list rather than
//! an error.

use tracing::debug;

use crate::error::{Error, Result};
use crate::sqlite::core::record::Record;
use crate::sqlite::statement::CreateTableStatement;

/// Projection position used for the `id` pseudo-column, materialised from
/// the cell's rowid rather than the record body.
pub const ROWID_COLUMN: i64 = -1;

/// One column recovered from a `CREATE TABLE` statement.
#[derive(Debug, Clone)]
pub struct ColumnInfo {
    pub name: String,
    pub declared_type: String,
    pub position: i64,
}

/// One decoded row of the schema table.
#[derive(Debug, Clone)]
pub struct SchemaRecord {
    pub kind: String,
    pub name: String,
    pub tbl_name: String,
    pub root_page: u32,
    pub sql: String,
    columns: Vec<ColumnInfo>,
}

impl SchemaRecord {
    /// Builds a schema entry from a decoded page-1 record. Rows with fewer
    /// than five columns are not schema rows.
    pub fn from_record(record: &Record) -> Result<Self> {
        let values = record.values();
        if values.len() < 5 {
            return Err(Error::malformed(format!(
                "schema record has {} columns, expected 5",
                values.len()
            )));
        }

        let text = |i: usize| -> String {
            values[i].as_text().unwrap_or_default().to_string()
        };

        let kind = text(0);
        let name = text(1);
        let tbl_name = text(2);
        let root_page = values[3].as_integer().unwrap_or(0) as u32;
        let sql = text(4);

        let columns = Self::parse_columns(&sql);
        debug!(
            "schema entry: kind={}, name={}, root={}, {} columns",
            kind,
            name,
            root_page,
            columns.len()
        );

        Ok(Self {
            kind,
            name,
            tbl_name,
            root_page,
            sql,
            columns,
        })
    }

    fn parse_columns(sql: &str) -> Vec<ColumnInfo> {
        if sql.is_empty() {
            return Vec::new();
        }

        match CreateTableStatement::parse(sql) {
            Ok(stmt) => stmt
                .columns
                .into_iter()
                .enumerate()
                .map(|(i, col)| ColumnInfo {
                    name: col.name,
                    declared_type: col.column_type,
                    position: i as i64,
                })
                .collect(),
            Err(err) => {
                debug!("could not parse schema sql ({err}); treating as columnless");
                Vec::new()
            }
        }
    }

    pub fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    pub fn is_table(&self) -> bool {
        self.kind == "table"
    }

    pub fn is_index(&self) -> bool {
        self.kind == "index"
    }

    /// User tables are tables whose names lack the `sqlite_` prefix used by
    /// the format's internal bookkeeping tables.
    pub fn is_user_table(&self) -> bool {
        self.is_table() && !self.name.starts_with("sqlite_")
    }

    /// Maps projected column names to record positions. `id` maps to the
    /// rowid pseudo-column; names that match no column are dropped.
    pub fn map_column_positions(&self, column_names: &[String]) -> Vec<i64> {
        let mut positions = Vec::with_capacity(column_names.len());

        for name in column_names {
            if name == "id" {
                positions.push(ROWID_COLUMN);
                continue;
            }
            if let Some(col) = self.columns.iter().find(|col| &col.name == name) {
                positions.push(col.position);
            }
        }

        positions
    }

    /// Position of a `WHERE` column, or the rowid sentinel when the name
    /// matches no column (an unfiltered scan).
    pub fn find_column_position(&self, column_name: &str) -> i64 {
        self.columns
            .iter()
            .find(|col| col.name == column_name)
            .map(|col| col.position)
            .unwrap_or(ROWID_COLUMN)
    }
}

/// The decoded contents of page 1.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    entries: Vec<SchemaRecord>,
}

impl Schema {
    pub fn new(entries: Vec<SchemaRecord>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[SchemaRecord] {
        &self.entries
    }

    /// Number of schema rows whose type is `table`, internal tables
    /// included.
    pub fn count_tables(&self) -> usize {
        self.entries.iter().filter(|e| e.is_table()).count()
    }

    /// Names of user tables, in schema order.
    pub fn user_table_names(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.is_user_table())
            .map(|e| e.name.clone())
            .collect()
    }

    /// Looks up a table entry by name.
    pub fn table(&self, table_name: &str) -> Result<&SchemaRecord> {
        self.entries
            .iter()
            .find(|e| e.is_table() && e.name == table_name)
            .ok_or_else(|| Error::schema(format!("table not found: {table_name}")))
    }

    /// Finds the root page of an index on `(table_name, column_name)`. The
    /// match is textual: an index entry for the table whose `sql` mentions
    /// the column.
    pub fn index_root(&self, table_name: &str, column_name: &str) -> Result<u32> {
        self.entries
            .iter()
            .find(|e| e.is_index() && e.tbl_name == table_name && e.sql.contains(column_name))
            .map(|e| e.root_page)
            .ok_or_else(|| {
                Error::schema(format!(
                    "no index on {table_name}({column_name})"
                ))
            })
    }
}
