//! Regressions over the joined `economy` table and their terminal dashboard.

pub mod plot;
pub mod regression;
pub mod report;

pub use regression::{EconomyVar, LinearFit, REGRESSIONS, RegressionSpec, fit_linear};
pub use report::{Dashboard, format_dashboard};
