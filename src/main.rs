//! CLI entry point for the economic-data pipeline.
//!
//! Provides subcommands to extract the Banxico series, run the ETL into S3,
//! build the Athena tables, and render the regression dashboard.

use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use econ_pipeline::athena::{PollConfig, QueryRunner};
use econ_pipeline::config::{Settings, parse_date};
use econ_pipeline::infra::banxico::BanxicoClient;
use econ_pipeline::pipeline::{
    ECONOMY_FILE, EltOptions, EtlOptions, UploadTarget, extract, run_elt, run_etl, run_report,
    write_raw,
};
use econ_pipeline::storage::{list_buckets, list_objects};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "econ_pipeline")]
#[command(about = "Banxico series → S3 → Athena → regressions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the three series and save them untransformed
    Extract {
        #[command(flatten)]
        window: Window,

        /// Directory for the raw CSVs (defaults to DATA_DIR)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
    /// Fetch, transform to monthly CSVs, and upload them to S3
    Etl {
        #[command(flatten)]
        window: Window,

        /// Directory for the transformed CSVs (defaults to DATA_DIR)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// S3 bucket to upload to (defaults to S3_BUCKET_NAME)
        #[arg(long)]
        bucket: Option<String>,

        /// Key prefix the table folders live under (defaults to S3_RAW_PREFIX)
        #[arg(long)]
        prefix: Option<String>,

        /// Only write local files
        #[arg(long, default_value_t = false)]
        skip_upload: bool,

        /// Gzip compress CSV files before uploading
        #[arg(long, default_value_t = false)]
        gzip: bool,

        /// Also keep the untransformed extracts next to the monthly files
        #[arg(long, default_value_t = false)]
        keep_raw: bool,
    },
    /// List buckets and the objects under the raw prefix
    ListObjects {
        /// S3 bucket to inspect (defaults to S3_BUCKET_NAME)
        #[arg(long)]
        bucket: Option<String>,

        /// Key prefix to list (defaults to S3_RAW_PREFIX)
        #[arg(long)]
        prefix: Option<String>,
    },
    /// Register the tables in Athena, build `economy`, and download it
    Elt {
        /// S3 bucket holding the CSVs and query results (defaults to S3_BUCKET_NAME)
        #[arg(long)]
        bucket: Option<String>,

        /// Athena database (defaults to ATHENA_DATABASE)
        #[arg(long)]
        database: Option<String>,

        /// Where to write the downloaded table (defaults to DATA_DIR/economy.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Drop and rebuild the economy table
        #[arg(long, default_value_t = false)]
        refresh: bool,

        /// Seconds between query status checks
        #[arg(long, default_value_t = 1)]
        poll_interval: u64,

        /// Seconds to wait for a single query before giving up
        #[arg(long, default_value_t = 300)]
        timeout: u64,
    },
    /// Fit the regressions over economy.csv and print the dashboard
    Report {
        /// Economy table CSV (defaults to DATA_DIR/economy.csv)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Plot width in characters
        #[arg(long, default_value_t = 60)]
        width: usize,

        /// Plot height in rows
        #[arg(long, default_value_t = 16)]
        height: usize,

        /// Also write the regression results as JSON
        #[arg(long)]
        export: Option<PathBuf>,
    },
}

#[derive(clap::Args)]
struct Window {
    /// First day requested, YYYY-MM-DD (defaults to ECON_START_DATE or 2015-01-01)
    #[arg(long, value_parser = parse_start)]
    start: Option<NaiveDate>,

    /// Last day requested, YYYY-MM-DD (defaults to ECON_END_DATE or today)
    #[arg(long, value_parser = parse_end)]
    end: Option<NaiveDate>,
}

fn parse_start(s: &str) -> Result<NaiveDate> {
    parse_date("--start", s)
}

fn parse_end(s: &str) -> Result<NaiveDate> {
    parse_date("--end", s)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let _file_guard = init_logging();

    let cli = Cli::parse();
    let mut settings = Settings::from_env()?;

    match cli.command {
        Commands::Extract { window, output_dir } => {
            window.apply(&mut settings);
            let range = settings.date_range(today())?;
            let dir = output_dir.unwrap_or_else(|| settings.data_dir.clone());

            let client = BanxicoClient::new(&settings.banxico_base_url, settings.require_token()?)?;
            let extracted = extract(&client, &range).await?;
            let files = write_raw(&dir, &extracted)?;

            info!(files = files.len(), dir = %dir.display(), "Raw extracts saved");
        }
        Commands::Etl {
            window,
            output_dir,
            bucket,
            prefix,
            skip_upload,
            gzip,
            keep_raw,
        } => {
            window.apply(&mut settings);
            if bucket.is_some() {
                settings.s3_bucket = bucket;
            }
            if let Some(prefix) = prefix {
                settings.raw_prefix = prefix;
            }
            let range = settings.date_range(today())?;
            let dir = output_dir.unwrap_or_else(|| settings.data_dir.clone());

            let client = BanxicoClient::new(&settings.banxico_base_url, settings.require_token()?)?;
            info!(start = %range.start(), end = %range.end(), "Banxico token loaded");

            let upload = if skip_upload {
                None
            } else {
                Some(UploadTarget {
                    bucket: settings.require_bucket()?.to_string(),
                    prefix: settings.raw_prefix.clone(),
                    gzip,
                })
            };
            let s3 = match upload {
                Some(_) => Some(aws_sdk_s3::Client::new(&settings.aws_config().await)),
                None => None,
            };

            let opts = EtlOptions {
                dir,
                keep_raw,
                upload,
            };
            let summary = run_etl(&client, &range, &opts, s3.as_ref()).await?;
            info!(
                files = summary.files.len(),
                uploaded = summary.uploaded_keys.len(),
                economy_rows = summary.economy_rows,
                "ETL finished"
            );
        }
        Commands::ListObjects { bucket, prefix } => {
            if bucket.is_some() {
                settings.s3_bucket = bucket;
            }
            let bucket = settings.require_bucket()?.to_string();
            let prefix = prefix.unwrap_or_else(|| match settings.raw_prefix.trim_matches('/') {
                "" => String::new(),
                p => format!("{p}/"),
            });

            let config = settings.aws_config().await;
            let s3 = aws_sdk_s3::Client::new(&config);

            for name in list_buckets(&s3).await? {
                info!(bucket = %name, "Bucket found");
            }
            let objects = list_objects(&s3, &bucket, &prefix).await?;
            for obj in &objects {
                info!(key = %obj.key, size = obj.size, "Object");
            }
            info!(bucket = %bucket, prefix = %prefix, count = objects.len(), "Listing complete");
        }
        Commands::Elt {
            bucket,
            database,
            output,
            refresh,
            poll_interval,
            timeout,
        } => {
            if bucket.is_some() {
                settings.s3_bucket = bucket;
            }
            if let Some(database) = database {
                settings.athena_database = database;
            }

            let opts = EltOptions {
                database: settings.athena_database.clone(),
                bucket: settings.require_bucket()?.to_string(),
                raw_prefix: settings.raw_prefix.clone(),
                output_location: settings.athena_output_location()?,
                refresh,
                output: output.unwrap_or_else(|| settings.data_dir.join(ECONOMY_FILE)),
            };

            let config = settings.aws_config().await;
            let poll = PollConfig {
                interval: Duration::from_secs(poll_interval.max(1)),
                timeout: Duration::from_secs(timeout),
            };
            let runner = QueryRunner::new(&config, opts.output_location.clone(), poll);
            let s3 = aws_sdk_s3::Client::new(&config);

            let rows = run_elt(&runner, &s3, &opts).await?;
            info!(rows = rows.len(), "ELT finished");
        }
        Commands::Report {
            input,
            width,
            height,
            export,
        } => {
            let input = input.unwrap_or_else(|| settings.data_dir.join(ECONOMY_FILE));
            let text = run_report(&input, width, height, export.as_deref())?;
            println!("{text}");
        }
    }

    Ok(())
}

impl Window {
    fn apply(&self, settings: &mut Settings) {
        if let Some(start) = self.start {
            settings.start_date = start;
        }
        if self.end.is_some() {
            settings.end_date = self.end;
        }
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Logging setup: colored stderr + JSON rolling log file.
///
/// The returned guard flushes the file writer on drop and must be held for
/// the life of the program.
fn init_logging() -> WorkerGuard {
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/econ_pipeline.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("logs"))
        .to_path_buf();
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("econ_pipeline.log"))
        .to_os_string();

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(env_filter("RUST_LOG", "info"));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(env_filter("RUST_LOG_JSON", "debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    file_guard
}

/// Filter from `var`, falling back to `default` when unset or invalid.
fn env_filter(var: &str, default: &str) -> EnvFilter {
    EnvFilter::try_from_env(var).unwrap_or_else(|_| EnvFilter::new(default))
}
