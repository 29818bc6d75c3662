use std::collections::HashMap;

use chrono::{Months, NaiveDate};

use crate::series::MonthlyValue;
use crate::transform::types::InflationPoint;

/// Year-over-year lag for a monthly index.
pub const INFLATION_LAG_MONTHS: u32 = 12;

/// Computes `100 * (index / index_lagged - 1)` for every month whose lagged
/// value exists.
///
/// The lag is taken in calendar months, not rows, so a gap in the index
/// drops the affected months instead of pairing the wrong periods. A zero
/// lagged value or a non-finite result is dropped as well.
pub fn compute_inflation(index: &[MonthlyValue], lag_months: u32) -> Vec<InflationPoint> {
    let by_month: HashMap<NaiveDate, f64> = index.iter().map(|m| (m.month, m.value)).collect();

    index
        .iter()
        .filter_map(|current| {
            let lagged_month = current.month.checked_sub_months(Months::new(lag_months))?;
            let lagged = *by_month.get(&lagged_month)?;
            if lagged == 0.0 {
                return None;
            }
            let inflation = 100.0 * (current.value / lagged - 1.0);
            inflation.is_finite().then_some(InflationPoint {
                month: current.month,
                index: current.value,
                inflation,
            })
        })
        .collect()
}
