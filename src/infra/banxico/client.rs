use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info};

use crate::fetch::auth::ApiKey;
use crate::fetch::{BasicClient, HttpClient, fetch_bytes};
use crate::parser::parse_series_response;
use crate::series::{DateRange, Series};
use crate::services::series_api::SeriesApi;

pub const DEFAULT_BASE_URL: &str = "https://www.banxico.org.mx/SieAPIRest/service/v1";

/// Client for the Banxico SIE REST API.
pub struct BanxicoClient<C = ApiKey<BasicClient>> {
    base_url: String,
    http: C,
}

impl BanxicoClient {
    /// Builds a client that authenticates every request with `token`.
    pub fn new(base_url: impl Into<String>, token: &str) -> Result<Self> {
        let http = ApiKey::banxico(BasicClient::new()?, token)?;
        Ok(Self::with_http(base_url, http))
    }
}

impl<C: HttpClient> BanxicoClient<C> {
    pub fn with_http(base_url: impl Into<String>, http: C) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, http }
    }

    /// `{base}/series/{id}/datos/{start}/{end}` with ISO dates.
    pub fn series_url(&self, series_id: &str, range: &DateRange) -> String {
        format!(
            "{}/series/{}/datos/{}/{}",
            self.base_url,
            series_id,
            range.start().format("%Y-%m-%d"),
            range.end().format("%Y-%m-%d"),
        )
    }
}

#[async_trait]
impl<C: HttpClient> SeriesApi for BanxicoClient<C> {
    #[tracing::instrument(skip(self, range), fields(start = %range.start(), end = %range.end()))]
    async fn fetch_series(&self, series_id: &str, range: &DateRange) -> Result<Series> {
        let url = self.series_url(series_id, range);
        debug!(url = %url, "Requesting series");

        let bytes = fetch_bytes(&self.http, &url)
            .await
            .with_context(|| format!("Banxico request for series {series_id} failed"))?;
        let series = parse_series_response(&bytes)?;

        info!(
            observations = series.observations.len(),
            valid = series.valid_count(),
            "Series fetched"
        );
        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_series_url_uses_iso_dates_and_trims_slash() {
        let client = BanxicoClient::new("https://example.test/sie/", "token").unwrap();
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2015, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        )
        .unwrap();

        assert_eq!(
            client.series_url("SF43718", &range),
            "https://example.test/sie/series/SF43718/datos/2015-01-01/2024-12-31"
        );
    }
}
