//! Banxico macroeconomic series pipeline.
//!
//! Fetches the exchange rate, interest rate and price index from the SIE
//! API, reshapes them into monthly CSVs, loads them into S3, registers them
//! in Athena, and fits simple regressions over the joined table.

pub mod analysis;
pub mod athena;
pub mod config;
pub mod fetch;
pub mod infra;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod series;
pub mod services;
pub mod storage;
pub mod transform;
