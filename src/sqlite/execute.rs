//! Query execution.
//!
//! Binds a parsed `SELECT` to a traversal strategy:
//!
//! 1. `COUNT(*)` sums leaf cell counts over the table's tree.
//! 2. Without `WHERE`, a full scan with the projection positions resolved
//!    from the schema.
//! 3. With `WHERE`, an index point lookup when an index on the column
//!    exists, fetching the matching rows by rowid in ascending order;
//!    otherwise a full scan with the predicate applied per record.
//!
//! The index lookup's schema miss is the one recovered error: it demotes the
//! query to the scan path.

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::sqlite::btree::BTree;
use crate::sqlite::core::record::{Row, Value};
use crate::sqlite::core::schema::{SchemaRecord, ROWID_COLUMN};
use crate::sqlite::db::Database;
use crate::sqlite::statement::{SelectStatement, WhereClause};

/// Rows produced by a query, in emission order.
pub type QueryResult = Vec<Row>;

impl Database {
    /// Executes a parsed `SELECT` statement.
    pub fn execute_select(&mut self, stmt: &SelectStatement) -> Result<QueryResult> {
        let schema = self.schema()?;
        let table = schema.table(&stmt.table_name)?.clone();
        info!(
            "executing select on {} (root page {})",
            table.name, table.root_page
        );

        if stmt.is_count_star {
            let mut btree = BTree::new(&mut self.reader, &self.header);
            let count = btree.count_rows(table.root_page)?;
            return Ok(vec![vec![Value::Integer(count as i64)]]);
        }

        let projections = table.map_column_positions(&stmt.column_names);

        let Some(clause) = &stmt.where_clause else {
            let mut results = Vec::new();
            let mut btree = BTree::new(&mut self.reader, &self.header);
            btree.scan(table.root_page, &projections, ROWID_COLUMN, None, &mut results)?;
            return Ok(results);
        };

        // Only text equality is understood; anything else is rejected up
        // front rather than silently matching nothing.
        if clause.operator != '=' {
            return Err(Error::syntax(format!(
                "unsupported operator '{}' in WHERE clause",
                clause.operator
            )));
        }

        match schema.index_root(&table.name, &clause.column) {
            Ok(index_root) => {
                self.select_via_index(&table, index_root, &projections, clause)
            }
            Err(Error::Schema(reason)) => {
                debug!("{reason}; falling back to full scan");
                let where_col = table.find_column_position(&clause.column);
                let mut results = Vec::new();
                let mut btree = BTree::new(&mut self.reader, &self.header);
                btree.scan(
                    table.root_page,
                    &projections,
                    where_col,
                    Some(clause),
                    &mut results,
                )?;
                Ok(results)
            }
            Err(err) => Err(err),
        }
    }

    fn select_via_index(
        &mut self,
        table: &SchemaRecord,
        index_root: u32,
        projections: &[i64],
        clause: &WhereClause,
    ) -> Result<QueryResult> {
        let mut needle = clause.value.as_str();
        if needle.len() >= 2 && needle.starts_with('\'') && needle.ends_with('\'') {
            needle = &needle[1..needle.len() - 1];
        }

        let mut btree = BTree::new(&mut self.reader, &self.header);
        let mut rowids = Vec::new();
        btree.scan_index(index_root, needle, &mut rowids)?;
        info!("index lookup matched {} rowids", rowids.len());

        // Ascending order keeps the table descent monotonic.
        rowids.sort_unstable();

        let mut results = Vec::with_capacity(rowids.len());
        for rowid in rowids {
            btree.find_row(table.root_page, rowid, projections, &mut results)?;
        }
        Ok(results)
    }
}
