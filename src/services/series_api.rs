//! Trait for time-series providers.

use anyhow::Result;

use crate::series::{DateRange, Series};

/// Abstraction over a source of economic time series (e.g., Banxico SIE).
#[async_trait::async_trait]
pub trait SeriesApi {
    /// Returns every observation of `series_id` within `range`.
    async fn fetch_series(&self, series_id: &str, range: &DateRange) -> Result<Series>;
}
