//! Extract → load → transform inside Athena, then download the joined table.

use anyhow::Result;
use std::path::PathBuf;
use tracing::info;

use crate::athena::ddl::{
    ECONOMY_TABLE, TableDef, create_database, create_economy_table, create_external_table,
    drop_table, select_economy,
};
use crate::athena::QueryRunner;
use crate::output::{parse_economy_csv, write_economy_csv};
use crate::series::SeriesKind;
use crate::storage::get_object_bytes;
use crate::transform::EconomyRow;

#[derive(Debug, Clone)]
pub struct EltOptions {
    pub database: String,
    pub bucket: String,
    pub raw_prefix: String,
    /// `s3://` prefix Athena writes results to.
    pub output_location: String,
    /// Drop and rebuild the `economy` table instead of keeping an existing one.
    pub refresh: bool,
    /// Local path the downloaded table is written to.
    pub output: PathBuf,
}

/// The statements that build the tables, in execution order.
///
/// Each entry carries whether it runs in the database context; `CREATE
/// DATABASE` runs before the database exists.
pub fn build_statements(opts: &EltOptions) -> Vec<(String, bool)> {
    let mut statements = vec![(create_database(&opts.database), false)];

    for kind in SeriesKind::ALL {
        let def = TableDef::for_series(kind, &opts.bucket, &opts.raw_prefix);
        statements.push((create_external_table(&opts.database, &def), true));
    }

    if opts.refresh {
        statements.push((drop_table(&opts.database, ECONOMY_TABLE), true));
    }
    statements.push((create_economy_table(&opts.database), true));
    statements
}

#[tracing::instrument(skip(runner, s3, opts), fields(database = %opts.database))]
pub async fn run_elt(
    runner: &QueryRunner,
    s3: &aws_sdk_s3::Client,
    opts: &EltOptions,
) -> Result<Vec<EconomyRow>> {
    for (sql, in_database) in build_statements(opts) {
        let database = in_database.then_some(opts.database.as_str());
        runner.run(&sql, database).await?;
    }
    info!(table = ECONOMY_TABLE, "Tables ready in Athena");

    let done = runner
        .run(&select_economy(&opts.database), Some(&opts.database))
        .await?;
    let location = done.result_location(&opts.output_location)?;
    info!(execution_id = %done.execution_id, location = %location, "Downloading query results");

    let bytes = get_object_bytes(s3, &location).await?;
    let rows = parse_economy_csv(&bytes)?;
    write_economy_csv(&opts.output, &rows)?;

    info!(rows = rows.len(), path = %opts.output.display(), "Economy table saved");
    Ok(rows)
}
