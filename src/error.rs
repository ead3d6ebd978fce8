//! Error taxonomy for the engine.
//!
//! Four kinds cover everything the read path can hit:
//!
//! - [`Error::Io`]: the file is missing, unreadable, or shorter than a read
//!   requires.
//! - [`Error::Malformed`]: the bytes were readable but violate the file
//!   format (varint overruns, unknown serial types, bad page kinds, overflow
//!   cycles, inconsistent record headers).
//! - [`Error::Schema`]: a referenced table or index does not exist.
//! - [`Error::Syntax`]: the SQL text did not parse or uses an unsupported
//!   construct.
//!
//! Everything propagates to the caller except one case: a `Schema` error
//! while resolving an index for a `WHERE` clause, which the executor catches
//! and demotes to a full-table scan.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed database: {0}")]
    Malformed(String),

    #[error("schema error: {0}")]
    Schema(String),

    #[error("syntax error: {0}")]
    Syntax(String),
}

impl Error {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Error::Malformed(msg.into())
    }

    pub fn schema(msg: impl Into<String>) -> Self {
        Error::Schema(msg.into())
    }

    pub fn syntax(msg: impl Into<String>) -> Self {
        Error::Syntax(msg.into())
    }
}
