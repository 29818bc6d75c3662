//! Row types shared by the transform, output and analysis stages.
//!
//! Field names are renamed to the column names of the CSV files and Athena
//! tables, which downstream consumers depend on.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One month of the price index with its year-over-year change.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InflationPoint {
    #[serde(rename = "date")]
    pub month: NaiveDate,
    #[serde(rename = "inpc")]
    pub index: f64,
    #[serde(rename = "inflacion")]
    pub inflation: f64,
}

/// One row of the joined `economy` table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EconomyRow {
    #[serde(rename = "date")]
    pub month: NaiveDate,
    #[serde(rename = "tasa_de_interes")]
    pub interest_rate: f64,
    #[serde(rename = "inflacion")]
    pub inflation: f64,
    #[serde(rename = "tipo_de_cambio")]
    pub exchange_rate: f64,
}
