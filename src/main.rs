use anyhow::Result;
use tracing::info;
use tracing_subscriber::fmt;

use rsqlite::cli::{self, Command};
use rsqlite::sqlite::db::Database;
use rsqlite::sqlite::statement::SelectStatement;

fn main() -> Result<()> {
    fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = cli::Args::parse()?;
    run(args)?;

    Ok(())
}

pub fn run(args: cli::Args) -> Result<()> {
    let mut db = Database::open(&args.file)?;

    match args.command {
        Command::DbInfo => {
            let info = db.info()?;
            println!("database page size: {}", info.page_size());
            println!("number of tables: {}", info.num_tables());
        }
        Command::Tables => {
            let tables = db.table_names()?;
            println!("{}", tables.join(" "));
        }
        Command::Sql(sql) => {
            let statement = SelectStatement::parse(&sql)?;
            info!("statement: {:?}", statement);
            let results = db.execute_select(&statement)?;
            for row in &results {
                println!("{}", cli::format_row(row));
            }
        }
    }
    Ok(())
}
