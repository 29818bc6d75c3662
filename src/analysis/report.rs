//! Dashboard assembly: summary statistics, regression results and plots.

use anyhow::{Result, bail};
use chrono::NaiveDate;
use serde::Serialize;
use std::path::Path;
use tracing::warn;

use crate::analysis::plot::render_scatter;
use crate::analysis::regression::{EconomyVar, LinearFit, REGRESSIONS, fit_linear};
use crate::transform::types::EconomyRow;
use crate::transform::utility::{Summary, summarize};

#[derive(Debug, Clone, Serialize)]
pub struct ColumnSummary {
    pub column: &'static str,
    pub summary: Summary,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegressionResult {
    pub title: String,
    pub response: &'static str,
    pub regressor: &'static str,
    /// `None` when the pair cannot be fitted, e.g. a constant regressor.
    pub fit: Option<LinearFit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Everything the dashboard shows, computed once.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub rows: usize,
    pub first_month: Option<NaiveDate>,
    pub last_month: Option<NaiveDate>,
    pub summaries: Vec<ColumnSummary>,
    pub regressions: Vec<RegressionResult>,
}

impl Dashboard {
    /// Fails only when there are too few rows for any fit; a single
    /// unfittable pair is recorded on its own result.
    pub fn build(rows: &[EconomyRow]) -> Result<Self> {
        if rows.len() < 2 {
            bail!("need at least two months to fit regressions, got {}", rows.len());
        }

        let summaries = EconomyVar::ALL
            .iter()
            .filter_map(|var| {
                summarize(&var.values(rows)).map(|summary| ColumnSummary {
                    column: var.column(),
                    summary,
                })
            })
            .collect();

        let regressions = REGRESSIONS
            .iter()
            .map(|reg| {
                let x = reg.regressor.values(rows);
                let y = reg.response.values(rows);
                let (fit, error) = match fit_linear(&x, &y) {
                    Ok(fit) => (Some(fit), None),
                    Err(e) => {
                        warn!(regression = %reg.title(), error = %e, "Regression skipped");
                        (None, Some(e.to_string()))
                    }
                };
                RegressionResult {
                    title: reg.title(),
                    response: reg.response.column(),
                    regressor: reg.regressor.column(),
                    fit,
                    error,
                }
            })
            .collect();

        Ok(Self {
            rows: rows.len(),
            first_month: rows.iter().map(|r| r.month).min(),
            last_month: rows.iter().map(|r| r.month).max(),
            summaries,
            regressions,
        })
    }

    /// Writes the computed results as pretty JSON.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Renders the dashboard as terminal text, with a scatter plot per regression.
pub fn format_dashboard(
    dashboard: &Dashboard,
    rows: &[EconomyRow],
    width: usize,
    height: usize,
) -> String {
    let mut out = String::new();

    out.push_str("=== Linear regressions: economy ===\n");
    match (dashboard.first_month, dashboard.last_month) {
        (Some(first), Some(last)) => out.push_str(&format!(
            "Months: {} ({} .. {})\n",
            dashboard.rows,
            first.format("%Y-%m"),
            last.format("%Y-%m")
        )),
        _ => out.push_str(&format!("Months: {}\n", dashboard.rows)),
    }

    out.push('\n');
    out.push_str(&format!(
        "{:<16} {:>6} {:>10} {:>10} {:>10} {:>10}\n",
        "column", "n", "mean", "std", "min", "max"
    ));
    for c in &dashboard.summaries {
        out.push_str(&format!(
            "{:<16} {:>6} {:>10.4} {:>10.4} {:>10.4} {:>10.4}\n",
            c.column, c.summary.count, c.summary.mean, c.summary.stddev, c.summary.min, c.summary.max
        ));
    }

    for (reg, result) in REGRESSIONS.iter().zip(&dashboard.regressions) {
        out.push('\n');
        out.push_str(&format!("--- {} ---\n", result.title));
        match &result.fit {
            Some(fit) => {
                out.push_str(&format!("Coefficient: {:.4}\n", fit.slope));
                out.push_str(&format!("Intercept: {:.4}\n", fit.intercept));
                out.push_str(&format!("R² Score: {:.4}\n", fit.r2));
            }
            None => out.push_str(&format!(
                "Not enough variation to fit: {}\n",
                result.error.as_deref().unwrap_or("unknown error")
            )),
        }
        out.push_str(&format!("x: {} | y: {}\n", result.regressor, result.response));

        let x = reg.regressor.values(rows);
        let y = reg.response.values(rows);
        out.push_str(&render_scatter(&x, &y, result.fit.as_ref(), width, height));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<EconomyRow> {
        (1..=6)
            .map(|m| {
                let t = m as f64;
                EconomyRow {
                    month: NaiveDate::from_ymd_opt(2024, m, 1).unwrap(),
                    interest_rate: 10.0 + t,
                    inflation: 3.0 + 0.5 * t,
                    exchange_rate: 20.0 - t,
                }
            })
            .collect()
    }

    #[test]
    fn test_build_fits_all_regressions() {
        let dashboard = Dashboard::build(&rows()).unwrap();

        assert_eq!(dashboard.rows, 6);
        assert_eq!(dashboard.summaries.len(), 3);
        assert_eq!(dashboard.regressions.len(), 3);

        // tipo_de_cambio = 30 - tasa_de_interes
        let fx_on_rate = dashboard.regressions[0].fit.as_ref().unwrap();
        assert!((fx_on_rate.slope + 1.0).abs() < 1e-9);
        assert!((fx_on_rate.intercept - 30.0).abs() < 1e-9);
        assert!((fx_on_rate.r2 - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_build_rejects_too_few_rows() {
        assert!(Dashboard::build(&rows()[..1]).is_err());
    }

    #[test]
    fn test_constant_regressor_skips_only_its_fits() {
        let rows: Vec<EconomyRow> = rows()
            .into_iter()
            .map(|r| EconomyRow {
                interest_rate: 11.0,
                ..r
            })
            .collect();
        let dashboard = Dashboard::build(&rows).unwrap();

        // tasa_de_interes is the regressor only in the first pair
        assert!(dashboard.regressions[0].fit.is_none());
        assert!(dashboard.regressions[0].error.is_some());
        assert!(dashboard.regressions[1].fit.is_some());
        assert!(dashboard.regressions[2].fit.is_some());

        let text = format_dashboard(&dashboard, &rows, 20, 6);
        assert!(text.contains("Not enough variation to fit: regressor has zero variance"));
        assert!(text.contains("--- tipo_de_cambio ~ inflacion ---"));
        assert!(text.contains("R² Score: 1.0000"));
    }

    #[test]
    fn test_format_contains_each_regression() {
        let rows = rows();
        let dashboard = Dashboard::build(&rows).unwrap();
        let text = format_dashboard(&dashboard, &rows, 20, 6);

        assert!(text.contains("Months: 6 (2024-01 .. 2024-06)"));
        assert!(text.contains("--- tipo_de_cambio ~ tasa_de_interes ---"));
        assert!(text.contains("--- tasa_de_interes ~ inflacion ---"));
        assert!(text.contains("--- tipo_de_cambio ~ inflacion ---"));
        assert!(text.contains("Coefficient: -1.0000"));
        assert!(text.contains("R² Score: 1.0000"));
    }

    #[test]
    fn test_write_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("regressions.json");
        Dashboard::build(&rows()).unwrap().write_json(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["regressions"][1]["title"], "tasa_de_interes ~ inflacion");
    }
}
