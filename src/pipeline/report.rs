use anyhow::{Result, bail};
use std::path::Path;
use tracing::info;

use crate::analysis::{Dashboard, format_dashboard};
use crate::output::read_economy_csv;

/// Loads `economy.csv`, fits the regressions and renders the dashboard text.
///
/// When `export` is given the regression results are also written as JSON.
pub fn run_report(input: &Path, width: usize, height: usize, export: Option<&Path>) -> Result<String> {
    let rows = read_economy_csv(input)?;
    if rows.is_empty() {
        bail!("{} has no rows", input.display());
    }

    let dashboard = Dashboard::build(&rows)?;
    if let Some(path) = export {
        dashboard.write_json(path)?;
        info!(path = %path.display(), "Regression results exported");
    }

    Ok(format_dashboard(&dashboard, &rows, width, height))
}
