//! Extract → transform → load.

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::output::{write_economy_csv, write_inflation_csv, write_monthly_csv, write_raw_csv};
use crate::series::{DateRange, MonthlyValue, Series, SeriesKind};
use crate::services::series_api::SeriesApi;
use crate::storage::{delete_object, object_key, other_variant_key, upload_file};
use crate::transform::{
    EconomyRow, INFLATION_LAG_MONTHS, InflationPoint, compute_inflation, join_economy, to_monthly,
};

/// File name of the locally joined table.
pub const ECONOMY_FILE: &str = "economy.csv";

/// The three series as fetched, in [`SeriesKind::ALL`] order.
#[derive(Debug, Clone)]
pub struct Extracted {
    pub series: Vec<(SeriesKind, Series)>,
}

impl Extracted {
    fn get(&self, kind: SeriesKind) -> Result<&Series> {
        self.series
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, s)| s)
            .with_context(|| format!("{} was not extracted", kind.label()))
    }
}

/// Monthly shapes ready to be written.
#[derive(Debug, Clone)]
pub struct Transformed {
    pub exchange_rate: Vec<MonthlyValue>,
    pub interest_rate: Vec<MonthlyValue>,
    pub inflation: Vec<InflationPoint>,
    pub economy: Vec<EconomyRow>,
}

/// Where and how the transformed CSVs are uploaded.
#[derive(Debug, Clone)]
pub struct UploadTarget {
    pub bucket: String,
    pub prefix: String,
    pub gzip: bool,
}

/// Files produced (and keys uploaded) by one ETL run.
#[derive(Debug, Clone, Default)]
pub struct EtlSummary {
    pub files: Vec<PathBuf>,
    pub uploaded_keys: Vec<String>,
    pub economy_rows: usize,
}

/// Fetches all three series, one after the other.
pub async fn extract<A: SeriesApi>(api: &A, range: &DateRange) -> Result<Extracted> {
    let mut series = Vec::with_capacity(SeriesKind::ALL.len());

    for kind in SeriesKind::ALL {
        info!(series = kind.series_id(), label = kind.label(), "Extracting series");
        let fetched = api
            .fetch_series(kind.series_id(), range)
            .await
            .with_context(|| format!("Failed to extract {}", kind.label()))?;
        series.push((kind, fetched));
    }

    Ok(Extracted { series })
}

/// Writes the untransformed extracts as `<column>_raw.csv` files.
pub fn write_raw(dir: &Path, extracted: &Extracted) -> Result<Vec<PathBuf>> {
    extracted
        .series
        .iter()
        .map(|(kind, series)| {
            let path = dir.join(kind.raw_file_name());
            write_raw_csv(&path, &series.observations)?;
            Ok(path)
        })
        .collect()
}

/// Buckets to months, derives inflation, and joins the economy table.
pub fn transform(extracted: &Extracted) -> Result<Transformed> {
    let monthly = |kind: SeriesKind| -> Result<Vec<MonthlyValue>> {
        let series = extracted.get(kind)?;
        let values = to_monthly(&series.observations, kind.aggregation());
        if values.is_empty() {
            bail!("{} has no valid observations", kind.label());
        }
        info!(series = %kind, months = values.len(), "Aggregated to monthly");
        Ok(values)
    };

    let exchange_rate = monthly(SeriesKind::ExchangeRate)?;
    let interest_rate = monthly(SeriesKind::InterestRate)?;
    let price_index = monthly(SeriesKind::PriceIndex)?;

    let inflation = compute_inflation(&price_index, INFLATION_LAG_MONTHS);
    if inflation.is_empty() {
        bail!(
            "Price index covers {} months; at least {} are needed for year-over-year inflation",
            price_index.len(),
            INFLATION_LAG_MONTHS + 1
        );
    }
    info!(months = inflation.len(), "Computed annual inflation");

    let economy = join_economy(&interest_rate, &inflation, &exchange_rate);
    if economy.is_empty() {
        warn!("No month is common to all three series");
    }

    Ok(Transformed {
        exchange_rate,
        interest_rate,
        inflation,
        economy,
    })
}

/// Writes the three monthly CSVs plus the local economy table.
///
/// Returns the per-series paths in upload order; the economy file stays
/// local because Athena builds its own.
pub fn write_transformed(dir: &Path, t: &Transformed) -> Result<Vec<(SeriesKind, PathBuf)>> {
    let fx = dir.join(SeriesKind::ExchangeRate.file_name());
    write_monthly_csv(&fx, SeriesKind::ExchangeRate, &t.exchange_rate)?;

    let rate = dir.join(SeriesKind::InterestRate.file_name());
    write_monthly_csv(&rate, SeriesKind::InterestRate, &t.interest_rate)?;

    let inflation = dir.join(SeriesKind::PriceIndex.file_name());
    write_inflation_csv(&inflation, &t.inflation)?;

    write_economy_csv(&dir.join(ECONOMY_FILE), &t.economy)?;

    Ok(vec![
        (SeriesKind::ExchangeRate, fx),
        (SeriesKind::InterestRate, rate),
        (SeriesKind::PriceIndex, inflation),
    ])
}

/// Uploads each series CSV to the folder its Athena table reads from and
/// removes the copy left by a run with the other `gzip` setting.
pub async fn upload(
    client: &aws_sdk_s3::Client,
    target: &UploadTarget,
    files: &[(SeriesKind, PathBuf)],
) -> Result<Vec<String>> {
    let mut keys = Vec::with_capacity(files.len());
    for (kind, path) in files {
        let key = object_key(&target.prefix, *kind);
        keys.push(upload_file(client, &target.bucket, &key, path, target.gzip).await?);
        delete_object(client, &target.bucket, &other_variant_key(&key, target.gzip)).await?;
    }
    Ok(keys)
}

/// Options for one ETL run.
#[derive(Debug, Clone)]
pub struct EtlOptions {
    /// Directory the CSVs are written to.
    pub dir: PathBuf,
    /// Also write the untransformed extracts.
    pub keep_raw: bool,
    /// Upload destination; `None` keeps everything local.
    pub upload: Option<UploadTarget>,
}

/// Runs the whole ETL. An upload target requires an S3 client.
#[tracing::instrument(skip(api, range, opts, s3), fields(dir = %opts.dir.display()))]
pub async fn run_etl<A: SeriesApi>(
    api: &A,
    range: &DateRange,
    opts: &EtlOptions,
    s3: Option<&aws_sdk_s3::Client>,
) -> Result<EtlSummary> {
    let extracted = extract(api, range).await?;

    let mut files = Vec::new();
    if opts.keep_raw {
        files.extend(write_raw(&opts.dir, &extracted)?);
    }

    let transformed = transform(&extracted)?;
    let written = write_transformed(&opts.dir, &transformed)?;
    files.extend(written.iter().map(|(_, p)| p.clone()));
    files.push(opts.dir.join(ECONOMY_FILE));

    let uploaded_keys = match (&opts.upload, s3) {
        (Some(target), Some(client)) => {
            let keys = upload(client, target, &written).await?;
            info!(bucket = %target.bucket, uploaded = keys.len(), "All files uploaded");
            keys
        }
        (Some(_), None) => bail!("An S3 client is required to upload"),
        (None, _) => {
            info!("Upload skipped");
            Vec::new()
        }
    };

    Ok(EtlSummary {
        files,
        uploaded_keys,
        economy_rows: transformed.economy.len(),
    })
}
