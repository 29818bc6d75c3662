//! Data-shape transformations applied between extract and load.
//!
//! Daily observations are bucketed into calendar months, the price index is
//! turned into a year-over-year inflation rate, and the three monthly series
//! can be joined locally into the `economy` shape Athena produces.

pub mod inflation;
pub mod join;
pub mod monthly;
pub mod types;
pub mod utility;

pub use inflation::{INFLATION_LAG_MONTHS, compute_inflation};
pub use join::join_economy;
pub use monthly::{month_start, to_monthly};
pub use types::{EconomyRow, InflationPoint};
