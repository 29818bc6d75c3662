//! Single-regressor ordinary least squares.

use anyhow::{Result, bail};
use serde::Serialize;

use crate::transform::types::EconomyRow;
use crate::transform::utility::mean;

/// Fitted line `y = intercept + slope * x`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    pub r2: f64,
    pub n: usize,
}

impl LinearFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Fits `y` on `x` by least squares.
///
/// R² follows the usual `1 - SS_res / SS_tot`; a constant `y` scores 1.0
/// when the fit is exact and 0.0 otherwise.
pub fn fit_linear(x: &[f64], y: &[f64]) -> Result<LinearFit> {
    if x.len() != y.len() {
        bail!("x and y have different lengths ({} vs {})", x.len(), y.len());
    }
    let n = x.len();
    if n < 2 {
        bail!("need at least two observations to fit a line, got {n}");
    }

    let x_mean = mean(x);
    let y_mean = mean(y);

    let sxx: f64 = x.iter().map(|xi| (xi - x_mean).powi(2)).sum();
    if sxx == 0.0 {
        bail!("regressor has zero variance");
    }
    let sxy: f64 = x
        .iter()
        .zip(y)
        .map(|(xi, yi)| (xi - x_mean) * (yi - y_mean))
        .sum();

    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;

    let ss_res: f64 = x
        .iter()
        .zip(y)
        .map(|(xi, yi)| (yi - (intercept + slope * xi)).powi(2))
        .sum();
    let ss_tot: f64 = y.iter().map(|yi| (yi - y_mean).powi(2)).sum();

    let r2 = if ss_tot == 0.0 {
        if ss_res == 0.0 { 1.0 } else { 0.0 }
    } else {
        1.0 - ss_res / ss_tot
    };

    Ok(LinearFit {
        slope,
        intercept,
        r2,
        n,
    })
}

/// Columns of the `economy` table available to regressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EconomyVar {
    InterestRate,
    Inflation,
    ExchangeRate,
}

impl EconomyVar {
    pub const ALL: [EconomyVar; 3] = [
        EconomyVar::InterestRate,
        EconomyVar::Inflation,
        EconomyVar::ExchangeRate,
    ];

    pub fn column(&self) -> &'static str {
        match self {
            EconomyVar::InterestRate => "tasa_de_interes",
            EconomyVar::Inflation => "inflacion",
            EconomyVar::ExchangeRate => "tipo_de_cambio",
        }
    }

    pub fn get(&self, row: &EconomyRow) -> f64 {
        match self {
            EconomyVar::InterestRate => row.interest_rate,
            EconomyVar::Inflation => row.inflation,
            EconomyVar::ExchangeRate => row.exchange_rate,
        }
    }

    pub fn values(&self, rows: &[EconomyRow]) -> Vec<f64> {
        rows.iter().map(|r| self.get(r)).collect()
    }
}

/// A `response ~ regressor` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegressionSpec {
    pub response: EconomyVar,
    pub regressor: EconomyVar,
}

impl RegressionSpec {
    pub fn title(&self) -> String {
        format!("{} ~ {}", self.response.column(), self.regressor.column())
    }
}

/// The regressions rendered by the dashboard.
pub const REGRESSIONS: [RegressionSpec; 3] = [
    RegressionSpec {
        response: EconomyVar::ExchangeRate,
        regressor: EconomyVar::InterestRate,
    },
    RegressionSpec {
        response: EconomyVar::InterestRate,
        regressor: EconomyVar::Inflation,
    },
    RegressionSpec {
        response: EconomyVar::ExchangeRate,
        regressor: EconomyVar::Inflation,
    },
];
