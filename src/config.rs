//! Runtime settings read from the environment (and `.env`).
//!
//! | variable                | default                    |
//! |-------------------------|----------------------------|
//! | `BANXICO_TOKEN`         | required to fetch          |
//! | `BANXICO_BASE_URL`      | SIE REST v1                |
//! | `ECON_START_DATE`       | `2015-01-01`               |
//! | `ECON_END_DATE`         | today                      |
//! | `S3_BUCKET_NAME`        | required to load / query   |
//! | `S3_RAW_PREFIX`         | `raw`                      |
//! | `ATHENA_DATABASE`       | `econ`                     |
//! | `ATHENA_RESULTS_PREFIX` | `query-results/`           |
//! | `DATA_DIR`              | `data`                     |
//! | `AWS_ACCESS_KEY` / `AWS_SECRET_KEY` | default AWS chain |

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use std::path::PathBuf;

use crate::infra::banxico::client::DEFAULT_BASE_URL;
use crate::series::DateRange;

pub const DEFAULT_START_DATE: &str = "2015-01-01";

#[derive(Clone)]
pub struct Settings {
    pub banxico_token: Option<String>,
    pub banxico_base_url: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub s3_bucket: Option<String>,
    pub raw_prefix: String,
    pub athena_database: String,
    pub athena_results_prefix: String,
    pub data_dir: PathBuf,
    pub aws_credentials: Option<StaticCredentials>,
}

/// Access key pair supplied explicitly instead of through the AWS chain.
#[derive(Clone)]
pub struct StaticCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl Settings {
    /// Reads settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let start_date = parse_date(
            "ECON_START_DATE",
            &get("ECON_START_DATE").unwrap_or_else(|| DEFAULT_START_DATE.to_string()),
        )?;
        let end_date = get("ECON_END_DATE")
            .map(|v| parse_date("ECON_END_DATE", &v))
            .transpose()?;

        let aws_credentials = match (get("AWS_ACCESS_KEY"), get("AWS_SECRET_KEY")) {
            (Some(access_key_id), Some(secret_access_key)) => Some(StaticCredentials {
                access_key_id,
                secret_access_key,
            }),
            (None, None) => None,
            _ => {
                return Err(anyhow!(
                    "AWS_ACCESS_KEY and AWS_SECRET_KEY must be set together"
                ));
            }
        };

        Ok(Self {
            banxico_token: get("BANXICO_TOKEN"),
            banxico_base_url: get("BANXICO_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            start_date,
            end_date,
            s3_bucket: get("S3_BUCKET_NAME"),
            raw_prefix: get("S3_RAW_PREFIX").unwrap_or_else(|| "raw".to_string()),
            athena_database: get("ATHENA_DATABASE").unwrap_or_else(|| "econ".to_string()),
            athena_results_prefix: get("ATHENA_RESULTS_PREFIX")
                .unwrap_or_else(|| "query-results/".to_string()),
            data_dir: PathBuf::from(get("DATA_DIR").unwrap_or_else(|| "data".to_string())),
            aws_credentials,
        })
    }

    pub fn require_token(&self) -> Result<&str> {
        self.banxico_token
            .as_deref()
            .ok_or_else(|| anyhow!("BANXICO_TOKEN not found in environment (.env)"))
    }

    pub fn require_bucket(&self) -> Result<&str> {
        self.s3_bucket
            .as_deref()
            .ok_or_else(|| anyhow!("S3_BUCKET_NAME not found in environment (.env); pass --bucket"))
    }

    /// Request window; the end defaults to `today`.
    pub fn date_range(&self, today: NaiveDate) -> Result<DateRange> {
        DateRange::new(self.start_date, self.end_date.unwrap_or(today))
    }

    /// `s3://{bucket}/{results_prefix}` where Athena writes query results.
    pub fn athena_output_location(&self) -> Result<String> {
        let bucket = self.require_bucket()?;
        let prefix = self.athena_results_prefix.trim_matches('/');
        if prefix.is_empty() {
            return Ok(format!("s3://{bucket}/"));
        }
        Ok(format!("s3://{bucket}/{prefix}/"))
    }

    /// Loads the AWS SDK configuration, preferring explicit credentials.
    pub async fn aws_config(&self) -> aws_config::SdkConfig {
        let loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        match &self.aws_credentials {
            Some(creds) => {
                let credentials = aws_sdk_s3::config::Credentials::new(
                    &creds.access_key_id,
                    &creds.secret_access_key,
                    None,
                    None,
                    "econ_pipeline",
                );
                loader.credentials_provider(credentials).load().await
            }
            None => loader.load().await,
        }
    }
}

pub fn parse_date(name: &str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .with_context(|| format!("{name} must be a YYYY-MM-DD date, got '{value}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> Result<Settings> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn test_defaults() {
        let s = settings(&[]).unwrap();
        assert!(s.banxico_token.is_none());
        assert_eq!(s.start_date, NaiveDate::from_ymd_opt(2015, 1, 1).unwrap());
        assert_eq!(s.raw_prefix, "raw");
        assert_eq!(s.athena_database, "econ");
        assert_eq!(s.data_dir, PathBuf::from("data"));
        assert!(s.require_token().is_err());
        assert!(s.require_bucket().is_err());
    }

    #[test]
    fn test_empty_values_count_as_unset() {
        let s = settings(&[("BANXICO_TOKEN", "  "), ("S3_RAW_PREFIX", "")]).unwrap();
        assert!(s.banxico_token.is_none());
        assert_eq!(s.raw_prefix, "raw");
    }

    #[test]
    fn test_date_range_defaults_end_to_today() {
        let s = settings(&[("ECON_START_DATE", "2020-01-01")]).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        let range = s.date_range(today).unwrap();
        assert_eq!(range.end(), today);
    }

    #[test]
    fn test_invalid_date_is_rejected() {
        assert!(settings(&[("ECON_START_DATE", "01/01/2020")]).is_err());
    }

    #[test]
    fn test_half_set_credentials_rejected() {
        assert!(settings(&[("AWS_ACCESS_KEY", "AKIA")]).is_err());
        let s = settings(&[("AWS_ACCESS_KEY", "AKIA"), ("AWS_SECRET_KEY", "secret")]).unwrap();
        assert!(s.aws_credentials.is_some());
    }

    #[test]
    fn test_athena_output_location() {
        let s = settings(&[("S3_BUCKET_NAME", "bucket"), ("ATHENA_RESULTS_PREFIX", "/results/")]).unwrap();
        assert_eq!(s.athena_output_location().unwrap(), "s3://bucket/results/");
    }
}
