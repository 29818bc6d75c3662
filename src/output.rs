//! Flat-file persistence for extracted and transformed series.
//!
//! Every writer emits a header row and ISO (`YYYY-MM-DD`) dates, the format
//! the Athena tables expect.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

use crate::series::{MonthlyValue, Observation, SeriesKind};
use crate::transform::types::{EconomyRow, InflationPoint};

#[derive(Serialize)]
struct RawRow {
    timestamp: NaiveDate,
    value: Option<f64>,
}

/// Writes untransformed observations as `timestamp,value`.
pub fn write_raw_csv(path: &Path, observations: &[Observation]) -> Result<()> {
    let rows = observations.iter().map(|o| RawRow {
        timestamp: o.date,
        value: o.value,
    });
    write_rows(path, rows)
}

/// Writes a monthly series as `date,<column>`.
pub fn write_monthly_csv(path: &Path, kind: SeriesKind, values: &[MonthlyValue]) -> Result<()> {
    let file = create(path)?;
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);

    writer.write_record(["date", kind.column()])?;
    for v in values {
        writer.serialize((v.month, v.value))?;
    }
    writer.flush()?;

    info!(path = %path.display(), rows = values.len(), "Wrote monthly CSV");
    Ok(())
}

/// Writes the price index with its inflation rate as `date,inpc,inflacion`.
pub fn write_inflation_csv(path: &Path, points: &[InflationPoint]) -> Result<()> {
    write_rows(path, points.iter())
}

/// Writes the joined table as `date,tasa_de_interes,inflacion,tipo_de_cambio`.
pub fn write_economy_csv(path: &Path, rows: &[EconomyRow]) -> Result<()> {
    write_rows(path, rows.iter())
}

/// Reads `economy.csv`, whether written locally or downloaded from Athena.
pub fn read_economy_csv(path: &Path) -> Result<Vec<EconomyRow>> {
    let mut file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut content = Vec::new();
    file.read_to_end(&mut content)?;
    parse_economy_csv(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Parses `economy` rows from CSV bytes. Quoted fields (as Athena writes
/// them) are accepted.
pub fn parse_economy_csv(content: &[u8]) -> Result<Vec<EconomyRow>> {
    let mut rdr = csv::Reader::from_reader(content);
    let mut rows = Vec::new();

    for result in rdr.deserialize() {
        let record: EconomyRow = result?;
        rows.push(record);
    }

    debug!(rows = rows.len(), "Parsed economy CSV");
    Ok(rows)
}

fn write_rows<T: Serialize>(path: &Path, rows: impl IntoIterator<Item = T>) -> Result<()> {
    let file = create(path)?;
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(file);

    let mut count = 0usize;
    for row in rows {
        writer.serialize(row)?;
        count += 1;
    }
    writer.flush()?;

    info!(path = %path.display(), rows = count, "Wrote CSV");
    Ok(())
}

fn create(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    File::create(path).with_context(|| format!("Failed to create {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn month(m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, 1).unwrap()
    }

    #[test]
    fn test_monthly_csv_uses_series_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tipo_de_cambio.csv");
        let values = vec![MonthlyValue { month: month(1), value: 17.5 }];

        write_monthly_csv(&path, SeriesKind::ExchangeRate, &values).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "date,tipo_de_cambio\n2024-01-01,17.5\n");
    }

    #[test]
    fn test_raw_csv_leaves_missing_values_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw.csv");
        let observations = vec![
            Observation { date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), value: Some(1.5) },
            Observation { date: NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(), value: None },
        ];

        write_raw_csv(&path, &observations).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "timestamp,value\n2024-01-02,1.5\n2024-01-03,\n");
    }

    #[test]
    fn test_inflation_csv_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/inpc.csv");
        let points = vec![InflationPoint { month: month(1), index: 133.5, inflation: 4.88 }];

        write_inflation_csv(&path, &points).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "date,inpc,inflacion\n2024-01-01,133.5,4.88\n");
    }

    #[test]
    fn test_economy_csv_written_rows_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("economy.csv");
        let rows = vec![EconomyRow {
            month: month(2),
            interest_rate: 11.0,
            inflation: 4.4,
            exchange_rate: 17.1,
        }];

        write_economy_csv(&path, &rows).unwrap();
        let header = fs::read_to_string(&path).unwrap();
        assert!(header.starts_with("date,tasa_de_interes,inflacion,tipo_de_cambio\n"));
        assert_eq!(read_economy_csv(&path).unwrap(), rows);
    }

    #[test]
    fn test_parse_athena_quoted_result() {
        let content = b"\"date\",\"tasa_de_interes\",\"inflacion\",\"tipo_de_cambio\"\n\
\"2024-03-01\",\"11.0\",\"4.42\",\"16.78\"\n";

        let rows = parse_economy_csv(content).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].month, month(3));
        assert_eq!(rows[0].exchange_rate, 16.78);
    }

    #[test]
    fn test_read_missing_file_errors() {
        assert!(read_economy_csv(Path::new("/nonexistent/economy.csv")).is_err());
    }
}
