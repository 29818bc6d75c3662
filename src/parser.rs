//! JSON parser for Banxico SIE series responses.

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::series::{Observation, Series};

/// Date format used by the SIE API (`dd/mm/yyyy`).
const SIE_DATE_FORMAT: &str = "%d/%m/%Y";

#[derive(Deserialize)]
struct Envelope {
    bmx: Option<Bmx>,
}

#[derive(Deserialize)]
struct Bmx {
    series: Option<Vec<RawSeries>>,
}

#[derive(Deserialize)]
struct RawSeries {
    #[serde(rename = "idSerie")]
    id: String,
    #[serde(rename = "titulo")]
    title: Option<String>,
    #[serde(rename = "datos")]
    data: Option<Vec<RawPoint>>,
}

#[derive(Deserialize)]
struct RawPoint {
    #[serde(rename = "fecha")]
    date: String,
    #[serde(rename = "dato")]
    value: String,
}

/// Decodes the first series of a SIE `datos` response.
///
/// # Errors
///
/// Returns an error if the bytes are not valid JSON, if the response carries
/// no series, if the series has no observations for the requested window, or
/// if a date cannot be parsed.
pub fn parse_series_response(bytes: &[u8]) -> Result<Series> {
    let envelope: Envelope =
        serde_json::from_slice(bytes).context("Failed to decode Banxico response JSON")?;

    let mut series = envelope
        .bmx
        .and_then(|b| b.series)
        .ok_or_else(|| anyhow!("No series found in Banxico response"))?;

    if series.is_empty() {
        return Err(anyhow!("No series found in Banxico response"));
    }
    let raw = series.swap_remove(0);

    let data = raw.data.unwrap_or_default();
    if data.is_empty() {
        return Err(anyhow!(
            "No data available for series {} in this date range",
            raw.id
        ));
    }

    let observations = data
        .into_iter()
        .map(|p| {
            let date = NaiveDate::parse_from_str(p.date.trim(), SIE_DATE_FORMAT)
                .with_context(|| format!("Invalid date '{}' in series {}", p.date, raw.id))?;
            Ok(Observation {
                date,
                value: parse_value(&p.value),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Series {
        id: raw.id,
        title: raw.title,
        observations,
    })
}

/// Parses a SIE value, coercing placeholders such as `N/E` to `None`.
pub fn parse_value(raw: &str) -> Option<f64> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    let v = cleaned.parse::<f64>().ok()?;
    v.is_finite().then_some(v)
}
