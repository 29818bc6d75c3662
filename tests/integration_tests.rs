use anyhow::{Result, bail};
use async_trait::async_trait;
use chrono::NaiveDate;

use econ_pipeline::output::read_economy_csv;
use econ_pipeline::parser::parse_series_response;
use econ_pipeline::pipeline::{EtlOptions, UploadTarget, extract, run_etl, run_report, transform};
use econ_pipeline::series::{DateRange, Series, SeriesKind};
use econ_pipeline::services::series_api::SeriesApi;
use econ_pipeline::transform::{
    INFLATION_LAG_MONTHS, compute_inflation, join_economy, to_monthly,
};

/// Serves the recorded SIE responses instead of calling Banxico.
struct FixtureApi;

#[async_trait]
impl SeriesApi for FixtureApi {
    async fn fetch_series(&self, series_id: &str, _range: &DateRange) -> Result<Series> {
        let bytes: &[u8] = match series_id {
            "SF43718" => include_bytes!("fixtures/banxico_sf43718.json"),
            "SF282" => include_bytes!("fixtures/banxico_sf282.json"),
            "SP1" => include_bytes!("fixtures/banxico_sp1.json"),
            other => bail!("unexpected series {other}"),
        };
        parse_series_response(bytes)
    }
}

fn month(y: i32, m: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, 1).unwrap()
}

fn range() -> DateRange {
    DateRange::new(
        NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
    )
    .unwrap()
}

#[test]
fn test_fixture_series_to_economy_rows() {
    let fx = parse_series_response(include_bytes!("fixtures/banxico_sf43718.json")).unwrap();
    let rate = parse_series_response(include_bytes!("fixtures/banxico_sf282.json")).unwrap();
    let inpc = parse_series_response(include_bytes!("fixtures/banxico_sp1.json")).unwrap();

    assert_eq!(fx.id, "SF43718");
    // one N/E placeholder in May 2023
    assert_eq!(fx.observations.len(), 31);
    assert_eq!(fx.valid_count(), 30);

    let fx_monthly = to_monthly(&fx.observations, SeriesKind::ExchangeRate.aggregation());
    let rate_monthly = to_monthly(&rate.observations, SeriesKind::InterestRate.aggregation());
    let inpc_monthly = to_monthly(&inpc.observations, SeriesKind::PriceIndex.aggregation());
    assert_eq!(fx_monthly.len(), 15);
    assert_eq!(rate_monthly.len(), 15);
    assert_eq!(inpc_monthly.len(), 15);

    let inflation = compute_inflation(&inpc_monthly, INFLATION_LAG_MONTHS);
    assert_eq!(inflation.len(), 3);
    assert_eq!(inflation[0].month, month(2024, 1));
    assert!((inflation[0].inflation - 4.8).abs() < 1e-9);

    let economy = join_economy(&rate_monthly, &inflation, &fx_monthly);
    let months: Vec<_> = economy.iter().map(|r| r.month).collect();
    assert_eq!(months, vec![month(2024, 1), month(2024, 2), month(2024, 3)]);
    assert!((economy[0].exchange_rate - 17.8).abs() < 1e-9);
    assert!((economy[0].interest_rate - 11.1).abs() < 1e-9);
}

#[tokio::test]
async fn test_extract_and_transform_with_fixture_api() {
    let extracted = extract(&FixtureApi, &range()).await.unwrap();
    assert_eq!(extracted.series.len(), 3);
    assert_eq!(extracted.series[2].0, SeriesKind::PriceIndex);

    let transformed = transform(&extracted).unwrap();
    assert_eq!(transformed.exchange_rate.len(), 15);
    assert_eq!(transformed.inflation.len(), 3);
    assert_eq!(transformed.economy.len(), 3);
}

#[tokio::test]
async fn test_local_etl_then_report() {
    let dir = tempfile::tempdir().unwrap();
    let opts = EtlOptions {
        dir: dir.path().to_path_buf(),
        keep_raw: true,
        upload: None,
    };

    let summary = run_etl(&FixtureApi, &range(), &opts, None).await.unwrap();
    assert_eq!(summary.economy_rows, 3);
    assert!(summary.uploaded_keys.is_empty());
    // three raw extracts, three monthly files, economy.csv
    assert_eq!(summary.files.len(), 7);
    for path in &summary.files {
        assert!(path.exists(), "{} missing", path.display());
    }

    let fx_csv = std::fs::read_to_string(dir.path().join("tipo_de_cambio.csv")).unwrap();
    assert!(fx_csv.starts_with("date,tipo_de_cambio\n2023-01-01,"));
    let inpc_csv = std::fs::read_to_string(dir.path().join("inpc.csv")).unwrap();
    assert!(inpc_csv.starts_with("date,inpc,inflacion\n2024-01-01,"));

    let economy_path = dir.path().join("economy.csv");
    assert_eq!(read_economy_csv(&economy_path).unwrap().len(), 3);

    let export = dir.path().join("regressions.json");
    let text = run_report(&economy_path, 30, 8, Some(&export)).unwrap();
    assert!(text.contains("--- tipo_de_cambio ~ tasa_de_interes ---"));
    assert!(text.contains("Coefficient: -2.0000"));
    assert!(export.exists());
}

#[tokio::test]
async fn test_upload_without_client_fails() {
    let dir = tempfile::tempdir().unwrap();
    let opts = EtlOptions {
        dir: dir.path().to_path_buf(),
        keep_raw: false,
        upload: Some(UploadTarget {
            bucket: "bucket".into(),
            prefix: "raw".into(),
            gzip: false,
        }),
    };

    assert!(run_etl(&FixtureApi, &range(), &opts, None).await.is_err());
}
