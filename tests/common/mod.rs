//! Builds small database files, bit-exact to the on-disk format, for the
//! end-to-end tests.

use std::io::Write;

use tempfile::NamedTempFile;

use rsqlite::sqlite::core::record::Value;
use rsqlite::sqlite::overflow::local_payload_size;

pub const PAGE_SIZE: usize = 4096;

const LEAF_TABLE: u8 = 13;
const INTERIOR_TABLE: u8 = 5;
const LEAF_INDEX: u8 = 10;
const INTERIOR_INDEX: u8 = 2;

pub fn encode_varint(value: i64) -> Vec<u8> {
    let value = value as u64;
    if value >> 56 != 0 {
        let mut out = Vec::with_capacity(9);
        for i in (1..9).rev() {
            out.push(0x80 | ((value >> (8 + 7 * (i - 1))) & 0x7f) as u8);
        }
        out.push((value & 0xff) as u8);
        return out;
    }

    let mut groups = vec![(value & 0x7f) as u8];
    let mut rest = value >> 7;
    while rest != 0 {
        groups.push((rest & 0x7f) as u8);
        rest >>= 7;
    }
    groups
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &g)| if i + 1 < groups.len() { 0x80 | g } else { g })
        .collect()
}

fn serial_code(value: &Value) -> i64 {
    match value {
        Value::Null => 0,
        Value::Integer(n) => match n {
            -128..=127 => 1,
            -32768..=32767 => 2,
            _ => 6,
        },
        Value::Float(_) => 7,
        Value::Text(s) => 13 + 2 * s.len() as i64,
        Value::Blob(b) => 12 + 2 * b.len() as i64,
    }
}

fn body_bytes(value: &Value) -> Vec<u8> {
    match value {
        Value::Null => vec![],
        Value::Integer(n) => match n {
            -128..=127 => vec![*n as u8],
            -32768..=32767 => (*n as i16).to_be_bytes().to_vec(),
            _ => n.to_be_bytes().to_vec(),
        },
        Value::Float(f) => f.to_be_bytes().to_vec(),
        Value::Text(s) => s.as_bytes().to_vec(),
        Value::Blob(b) => b.clone(),
    }
}

/// Encodes a record: header-size varint, serial-type varints, body.
pub fn build_record(values: &[Value]) -> Vec<u8> {
    let serials: Vec<u8> = values
        .iter()
        .flat_map(|v| encode_varint(serial_code(v)))
        .collect();

    // The header size varint counts itself; all test headers stay small
    // enough for a one-byte varint.
    let header_size = serials.len() + 1;
    assert!(header_size < 128);

    let mut record = vec![header_size as u8];
    record.extend_from_slice(&serials);
    for value in values {
        record.extend(body_bytes(value));
    }
    record
}

/// A leaf-table cell with a fully local payload.
pub fn table_leaf_cell(rowid: i64, record: &[u8]) -> Vec<u8> {
    assert!(record.len() <= PAGE_SIZE - 35);
    let mut cell = encode_varint(record.len() as i64);
    cell.extend(encode_varint(rowid));
    cell.extend_from_slice(record);
    cell
}

/// A leaf-table cell whose payload spills onto an overflow chain. Returns
/// the cell plus the overflow pages, which the caller appends to the file
/// starting at `first_overflow_page`.
pub fn table_leaf_cell_with_overflow(
    rowid: i64,
    record: &[u8],
    first_overflow_page: u32,
) -> (Vec<u8>, Vec<Vec<u8>>) {
    let local = local_payload_size(PAGE_SIZE as u32, true, record.len() as u64);
    assert!(local < record.len());

    let mut cell = encode_varint(record.len() as i64);
    cell.extend(encode_varint(rowid));
    cell.extend_from_slice(&record[..local]);
    cell.extend_from_slice(&first_overflow_page.to_be_bytes());

    let mut pages = Vec::new();
    let chunks: Vec<&[u8]> = record[local..].chunks(PAGE_SIZE - 4).collect();
    for (i, chunk) in chunks.iter().enumerate() {
        let next = if i + 1 < chunks.len() {
            first_overflow_page + i as u32 + 1
        } else {
            0
        };
        let mut page = vec![0u8; PAGE_SIZE];
        page[0..4].copy_from_slice(&next.to_be_bytes());
        page[4..4 + chunk.len()].copy_from_slice(chunk);
        pages.push(page);
    }

    (cell, pages)
}

pub fn table_interior_cell(left_child: u32, rowid: i64) -> Vec<u8> {
    let mut cell = left_child.to_be_bytes().to_vec();
    cell.extend(encode_varint(rowid));
    cell
}

pub fn index_leaf_cell(record: &[u8]) -> Vec<u8> {
    let mut cell = encode_varint(record.len() as i64);
    cell.extend_from_slice(record);
    cell
}

pub fn index_interior_cell(left_child: u32, record: &[u8]) -> Vec<u8> {
    let mut cell = left_child.to_be_bytes().to_vec();
    cell.extend(encode_varint(record.len() as i64));
    cell.extend_from_slice(record);
    cell
}

/// Lays out one page: header, cell pointer array in cell order, cell
/// content packed against the end of the page. `first` leaves room for the
/// 100-byte file header.
pub fn build_page(kind: u8, cells: &[Vec<u8>], right_most: Option<u32>, first: bool) -> Vec<u8> {
    let mut page = vec![0u8; PAGE_SIZE];
    let area = if first { 100 } else { 0 };
    let header_size = if right_most.is_some() { 12 } else { 8 };

    let mut content_start = PAGE_SIZE;
    let mut pointers = Vec::with_capacity(cells.len());
    for cell in cells {
        content_start -= cell.len();
        page[content_start..content_start + cell.len()].copy_from_slice(cell);
        pointers.push(content_start as u16);
    }
    assert!(content_start >= area + header_size + 2 * cells.len());

    page[area] = kind;
    page[area + 3..area + 5].copy_from_slice(&(cells.len() as u16).to_be_bytes());
    page[area + 5..area + 7].copy_from_slice(&(content_start as u16).to_be_bytes());
    if let Some(right) = right_most {
        page[area + 8..area + 12].copy_from_slice(&right.to_be_bytes());
    }
    for (i, pointer) in pointers.iter().enumerate() {
        let at = area + header_size + 2 * i;
        page[at..at + 2].copy_from_slice(&pointer.to_be_bytes());
    }
    page
}

/// A schema-table row: `(type, name, tbl_name, rootpage, sql)`.
pub fn schema_entry(kind: &str, name: &str, tbl_name: &str, root_page: u32, sql: &str) -> Vec<Value> {
    vec![
        Value::Text(kind.into()),
        Value::Text(name.into()),
        Value::Text(tbl_name.into()),
        Value::Integer(root_page as i64),
        Value::Text(sql.into()),
    ]
}

/// Builds page 1 from schema rows.
pub fn schema_page(entries: &[Vec<Value>]) -> Vec<u8> {
    let cells: Vec<Vec<u8>> = entries
        .iter()
        .enumerate()
        .map(|(i, values)| table_leaf_cell(i as i64 + 1, &build_record(values)))
        .collect();
    build_page(LEAF_TABLE, &cells, None, true)
}

pub fn leaf_table_page(rows: &[(i64, Vec<Value>)]) -> Vec<u8> {
    let cells: Vec<Vec<u8>> = rows
        .iter()
        .map(|(rowid, values)| table_leaf_cell(*rowid, &build_record(values)))
        .collect();
    build_page(LEAF_TABLE, &cells, None, false)
}

pub fn interior_table_page(separators: &[(u32, i64)], right_most: u32) -> Vec<u8> {
    let cells: Vec<Vec<u8>> = separators
        .iter()
        .map(|(child, rowid)| table_interior_cell(*child, *rowid))
        .collect();
    build_page(INTERIOR_TABLE, &cells, Some(right_most), false)
}

pub fn leaf_index_page(entries: &[(&str, i64)]) -> Vec<u8> {
    let cells: Vec<Vec<u8>> = entries
        .iter()
        .map(|(key, rowid)| {
            index_leaf_cell(&build_record(&[
                Value::Text((*key).into()),
                Value::Integer(*rowid),
            ]))
        })
        .collect();
    build_page(LEAF_INDEX, &cells, None, false)
}

pub fn interior_index_page(separators: &[(u32, &str, i64)], right_most: u32) -> Vec<u8> {
    let cells: Vec<Vec<u8>> = separators
        .iter()
        .map(|(child, key, rowid)| {
            index_interior_cell(
                *child,
                &build_record(&[Value::Text((*key).into()), Value::Integer(*rowid)]),
            )
        })
        .collect();
    build_page(INTERIOR_INDEX, &cells, Some(right_most), false)
}

/// Assembles the file: stamps the 100-byte header into page 1 and writes
/// every page out. `pages[0]` is page 1.
pub fn write_db(mut pages: Vec<Vec<u8>>) -> NamedTempFile {
    let mut header = vec![0u8; 100];
    header[0..16].copy_from_slice(b"SQLite format 3\0");
    header[16..18].copy_from_slice(&(PAGE_SIZE as u16).to_be_bytes());
    header[18] = 1;
    header[19] = 1;
    header[28..32].copy_from_slice(&(pages.len() as u32).to_be_bytes());
    header[56..60].copy_from_slice(&1u32.to_be_bytes());

    pages[0][..100].copy_from_slice(&header);

    let mut file = NamedTempFile::new().expect("temp file");
    for page in &pages {
        assert_eq!(page.len(), PAGE_SIZE);
        file.write_all(page).expect("write page");
    }
    file.flush().expect("flush");
    file
}

/// Orchard database: three user tables and an index on `apples(color)`
/// (omitted when `with_index` is false, forcing the scan path).
///
/// - `apples` (root 2): 4 rows, columns `(id, name, color)`
/// - `grapes` (root 3): empty, column `(name)`
/// - `oranges` (root 4): 2 rows, columns `(name, flavor)`
/// - `idx_apples_color` (root 5)
pub fn orchard_db(with_index: bool) -> NamedTempFile {
    let mut entries = vec![
        schema_entry(
            "table",
            "apples",
            "apples",
            2,
            "CREATE TABLE apples (id integer primary key, name text, color text)",
        ),
        schema_entry("table", "grapes", "grapes", 3, "CREATE TABLE grapes (name text)"),
        schema_entry(
            "table",
            "oranges",
            "oranges",
            4,
            "CREATE TABLE oranges (name text, flavor text)",
        ),
    ];
    if with_index {
        entries.push(schema_entry(
            "index",
            "idx_apples_color",
            "apples",
            5,
            "CREATE INDEX idx_apples_color on apples (color)",
        ));
    }

    let apples = leaf_table_page(&[
        (1, vec![Value::Null, Value::Text("Fuji".into()), Value::Text("Red".into())]),
        (
            2,
            vec![
                Value::Null,
                Value::Text("Granny Smith".into()),
                Value::Text("Green".into()),
            ],
        ),
        (
            3,
            vec![
                Value::Null,
                Value::Text("Honeycrisp".into()),
                Value::Text("Red".into()),
            ],
        ),
        (
            4,
            vec![
                Value::Null,
                Value::Text("Golden Delicious".into()),
                Value::Text("Yellow".into()),
            ],
        ),
    ]);
    let grapes = leaf_table_page(&[]);
    let oranges = leaf_table_page(&[
        (
            1,
            vec![Value::Text("Valencia".into()), Value::Text("sweet".into())],
        ),
        (
            2,
            vec![Value::Text("Seville".into()), Value::Text("bitter".into())],
        ),
    ]);
    let index = leaf_index_page(&[("Green", 2), ("Red", 1), ("Red", 3), ("Yellow", 4)]);

    write_db(vec![schema_page(&entries), apples, grapes, oranges, index])
}

/// Database whose `logs` table and `idx_logs_k` index both have two-level
/// trees:
///
/// - root 2 (interior table): child 3 for rowids <= 2, right-most child 4
/// - root 5 (interior index): separator ("delta", 4), children 6 and 7
pub fn two_level_db() -> NamedTempFile {
    let entries = vec![
        schema_entry(
            "table",
            "logs",
            "logs",
            2,
            "CREATE TABLE logs (id integer primary key, k text)",
        ),
        schema_entry(
            "index",
            "idx_logs_k",
            "logs",
            5,
            "CREATE INDEX idx_logs_k on logs (k)",
        ),
    ];

    let root = interior_table_page(&[(3, 2)], 4);
    let left = leaf_table_page(&[
        (1, vec![Value::Null, Value::Text("alpha".into())]),
        (2, vec![Value::Null, Value::Text("beta".into())]),
    ]);
    let right = leaf_table_page(&[
        (3, vec![Value::Null, Value::Text("gamma".into())]),
        (4, vec![Value::Null, Value::Text("delta".into())]),
        (5, vec![Value::Null, Value::Text("unique".into())]),
    ]);

    let index_root = interior_index_page(&[(6, "delta", 4)], 7);
    let index_left = leaf_index_page(&[("alpha", 1), ("beta", 2)]);
    let index_right = leaf_index_page(&[("gamma", 3), ("unique", 5)]);

    write_db(vec![
        schema_page(&entries),
        root,
        left,
        right,
        index_root,
        index_left,
        index_right,
    ])
}

/// Database with one row whose text payload overflows onto a chain.
/// Returns the file and the oversized text.
pub fn overflow_db() -> (NamedTempFile, String) {
    let big_text: String = "abcdefghij".repeat(500);
    let entries = vec![schema_entry(
        "table",
        "blobs",
        "blobs",
        2,
        "CREATE TABLE blobs (id integer primary key, data text)",
    )];

    let record = build_record(&[Value::Null, Value::Text(big_text.clone())]);
    let (cell, overflow_pages) = table_leaf_cell_with_overflow(1, &record, 3);
    let table = build_page(LEAF_TABLE, &[cell], None, false);

    let mut pages = vec![schema_page(&entries), table];
    pages.extend(overflow_pages);
    (write_db(pages), big_text)
}
