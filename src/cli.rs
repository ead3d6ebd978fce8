//! Command-line surface.
//!
//! Two positional arguments: a database file and a command. `.dbinfo` and
//! `.tables` are meta commands; anything else is taken as a SQL statement.

use anyhow::{anyhow, Result};
use std::{env, fmt::Display, path::PathBuf};

use crate::sqlite::core::record::{Row, Value};

/// Available commands for the CLI.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    DbInfo,
    Tables,
    Sql(String),
}

impl std::str::FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ".dbinfo" => Ok(Command::DbInfo),
            ".tables" => Ok(Command::Tables),
            _ => Ok(Command::Sql(s.to_string())),
        }
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::DbInfo => write!(f, ".dbinfo"),
            Command::Tables => write!(f, ".tables"),
            Command::Sql(sql) => write!(f, "{}", sql),
        }
    }
}

/// Command line arguments for the CLI.
#[derive(Debug)]
pub struct Args {
    pub file: PathBuf,
    pub command: Command,
}

impl Args {
    pub fn parse() -> Result<Self> {
        let args: Vec<String> = env::args().skip(1).collect();

        let [file, command] = args.as_slice() else {
            return Err(anyhow!("usage: <database path> <command>"));
        };

        let command = command
            .parse::<Command>()
            .map_err(|e| anyhow!(e))?;

        Ok(Args {
            file: PathBuf::from(file),
            command,
        })
    }
}

/// Renders one result row: cell values joined by `|`. Integers print in
/// decimal and text verbatim; NULL, blob and float cells render empty.
pub fn format_row(row: &Row) -> String {
    row.iter()
        .map(|value| match value {
            Value::Integer(n) => n.to_string(),
            Value::Text(s) => s.clone(),
            Value::Null | Value::Float(_) | Value::Blob(_) => String::new(),
        })
        .collect::<Vec<_>>()
        .join("|")
}
