//! SQL text submitted to Athena.
//!
//! The external tables read the CSVs the ETL uploads, all columns besides
//! `date` are `DOUBLE`, and `date` stays a `STRING` because that is what the
//! join keys on.

use crate::series::SeriesKind;

/// Definition of an external table over a folder of CSV files.
#[derive(Debug, Clone, PartialEq)]
pub struct TableDef {
    pub name: String,
    pub columns: Vec<(String, String)>,
    pub location: String,
}

impl TableDef {
    /// Table over the CSVs of `kind` stored at `s3://{bucket}/{prefix}/{table}/`.
    pub fn for_series(kind: SeriesKind, bucket: &str, prefix: &str) -> Self {
        let mut columns = vec![
            ("date".to_string(), "STRING".to_string()),
            (kind.column().to_string(), "DOUBLE".to_string()),
        ];
        if kind == SeriesKind::PriceIndex {
            columns.push(("inflacion".to_string(), "DOUBLE".to_string()));
        }

        let prefix = prefix.trim_matches('/');
        let location = if prefix.is_empty() {
            format!("s3://{}/{}/", bucket, kind.table())
        } else {
            format!("s3://{}/{}/{}/", bucket, prefix, kind.table())
        };

        Self {
            name: kind.table().to_string(),
            columns,
            location,
        }
    }
}

pub fn create_database(database: &str) -> String {
    format!("CREATE DATABASE IF NOT EXISTS {database}")
}

pub fn create_external_table(database: &str, table: &TableDef) -> String {
    let columns = table
        .columns
        .iter()
        .map(|(name, ty)| format!("    {name} {ty}"))
        .collect::<Vec<_>>()
        .join(",\n");

    format!(
        "CREATE EXTERNAL TABLE IF NOT EXISTS {database}.{name} (\n{columns}\n)\n\
ROW FORMAT SERDE 'org.apache.hadoop.hive.serde2.OpenCSVSerde'\n\
WITH SERDEPROPERTIES (\"skip.header.line.count\" = \"1\")\n\
STORED AS TEXTFILE\n\
LOCATION '{location}'",
        name = table.name,
        location = table.location,
    )
}

pub fn drop_table(database: &str, table: &str) -> String {
    format!("DROP TABLE IF EXISTS {database}.{table}")
}

/// CTAS joining the three series on `date`, driven by the interest rate.
pub fn create_economy_table(database: &str) -> String {
    let rate = SeriesKind::InterestRate.table();
    let inflation = SeriesKind::PriceIndex.table();
    let fx = SeriesKind::ExchangeRate.table();

    format!(
        "CREATE TABLE IF NOT EXISTS {database}.{ECONOMY_TABLE} AS\n\
SELECT\n\
    t.date,\n\
    t.tasa_de_interes,\n\
    i.inflacion,\n\
    c.tipo_de_cambio\n\
FROM {database}.{rate} t\n\
JOIN {database}.{inflation} i ON t.date = i.date\n\
JOIN {database}.{fx} c ON t.date = c.date"
    )
}

pub fn select_economy(database: &str) -> String {
    format!("SELECT * FROM {database}.{ECONOMY_TABLE} ORDER BY date")
}

pub const ECONOMY_TABLE: &str = "economy";
