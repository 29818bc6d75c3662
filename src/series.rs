//! Domain types for the Banxico series handled by the pipeline.

use anyhow::{Result, bail};
use chrono::NaiveDate;
use serde::Serialize;

/// The three series the pipeline extracts.
///
/// Each kind carries the identifiers it is known by downstream: the Banxico
/// series id, the CSV value column, the Athena table / S3 folder, and the
/// local file name. These names are the data contract shared by the ETL and
/// ELT halves of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SeriesKind {
    ExchangeRate,
    InterestRate,
    PriceIndex,
}

/// How daily observations are reduced to one value per month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    /// Average of the month's observations (continuous-rate series).
    Mean,
    /// Latest observation in the month (series already published monthly).
    Last,
}

impl SeriesKind {
    pub const ALL: [SeriesKind; 3] = [
        SeriesKind::ExchangeRate,
        SeriesKind::InterestRate,
        SeriesKind::PriceIndex,
    ];

    /// Banxico SIE series identifier.
    pub fn series_id(&self) -> &'static str {
        match self {
            SeriesKind::ExchangeRate => "SF43718",
            SeriesKind::InterestRate => "SF282",
            SeriesKind::PriceIndex => "SP1",
        }
    }

    /// Name of the value column in the monthly CSV.
    pub fn column(&self) -> &'static str {
        match self {
            SeriesKind::ExchangeRate => "tipo_de_cambio",
            SeriesKind::InterestRate => "tasa_de_interes",
            SeriesKind::PriceIndex => "inpc",
        }
    }

    /// Athena table name, also the S3 folder the table reads from.
    pub fn table(&self) -> &'static str {
        match self {
            SeriesKind::ExchangeRate => "tipo_de_cambio",
            SeriesKind::InterestRate => "tasa_de_interes",
            SeriesKind::PriceIndex => "inflacion",
        }
    }

    /// Local file name of the transformed CSV.
    pub fn file_name(&self) -> &'static str {
        match self {
            SeriesKind::ExchangeRate => "tipo_de_cambio.csv",
            SeriesKind::InterestRate => "tasa_de_interes.csv",
            SeriesKind::PriceIndex => "inpc.csv",
        }
    }

    /// Local file name of the untransformed extract.
    pub fn raw_file_name(&self) -> String {
        format!("{}_raw.csv", self.column())
    }

    pub fn aggregation(&self) -> Aggregation {
        match self {
            SeriesKind::ExchangeRate | SeriesKind::InterestRate => Aggregation::Mean,
            SeriesKind::PriceIndex => Aggregation::Last,
        }
    }

    /// Human-readable label used in logs.
    pub fn label(&self) -> &'static str {
        match self {
            SeriesKind::ExchangeRate => "exchange rate (FIX)",
            SeriesKind::InterestRate => "interest rate (CETES 28)",
            SeriesKind::PriceIndex => "price index (INPC)",
        }
    }
}

impl std::fmt::Display for SeriesKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.column())
    }
}

/// A single observation as delivered by the source API.
///
/// `value` is `None` when the source publishes a placeholder such as `N/E`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

/// One fetched series.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub id: String,
    pub title: Option<String>,
    pub observations: Vec<Observation>,
}

impl Series {
    /// Number of observations carrying a numeric value.
    pub fn valid_count(&self) -> usize {
        self.observations.iter().filter(|o| o.value.is_some()).count()
    }
}

/// One value per calendar month; `month` is the first day of that month.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthlyValue {
    pub month: NaiveDate,
    pub value: f64,
}

/// Inclusive date window for a series request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            bail!("invalid date range: start {start} is after end {end}");
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_price_index_lands_in_inflacion_table() {
        let kind = SeriesKind::PriceIndex;
        assert_eq!(kind.series_id(), "SP1");
        assert_eq!(kind.table(), "inflacion");
        assert_eq!(kind.file_name(), "inpc.csv");
        assert_eq!(kind.aggregation(), Aggregation::Last);
    }

    #[test]
    fn test_rate_series_use_monthly_mean() {
        assert_eq!(SeriesKind::ExchangeRate.aggregation(), Aggregation::Mean);
        assert_eq!(SeriesKind::InterestRate.aggregation(), Aggregation::Mean);
    }

    #[test]
    fn test_raw_file_name() {
        assert_eq!(
            SeriesKind::ExchangeRate.raw_file_name(),
            "tipo_de_cambio_raw.csv"
        );
    }

    #[test]
    fn test_date_range_rejects_inverted_window() {
        assert!(DateRange::new(d(2024, 2, 1), d(2024, 1, 1)).is_err());
    }

    #[test]
    fn test_date_range_accepts_single_day() {
        let range = DateRange::new(d(2024, 1, 1), d(2024, 1, 1)).unwrap();
        assert_eq!(range.start(), range.end());
    }

    #[test]
    fn test_valid_count_skips_missing_values() {
        let series = Series {
            id: "SF43718".into(),
            title: None,
            observations: vec![
                Observation { date: d(2024, 1, 2), value: Some(17.0) },
                Observation { date: d(2024, 1, 3), value: None },
            ],
        };
        assert_eq!(series.valid_count(), 1);
    }
}
