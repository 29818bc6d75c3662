use std::collections::HashMap;

use chrono::NaiveDate;

use crate::series::MonthlyValue;
use crate::transform::types::{EconomyRow, InflationPoint};

/// Inner join of the three monthly series on month.
///
/// Mirrors the `economy` CTAS: rows are driven by the interest-rate series
/// and only months present in all three inputs survive. Output is ordered by
/// month.
pub fn join_economy(
    interest_rate: &[MonthlyValue],
    inflation: &[InflationPoint],
    exchange_rate: &[MonthlyValue],
) -> Vec<EconomyRow> {
    let inflation: HashMap<NaiveDate, f64> =
        inflation.iter().map(|p| (p.month, p.inflation)).collect();
    let exchange_rate: HashMap<NaiveDate, f64> =
        exchange_rate.iter().map(|m| (m.month, m.value)).collect();

    let mut rows: Vec<EconomyRow> = interest_rate
        .iter()
        .filter_map(|rate| {
            Some(EconomyRow {
                month: rate.month,
                interest_rate: rate.value,
                inflation: *inflation.get(&rate.month)?,
                exchange_rate: *exchange_rate.get(&rate.month)?,
            })
        })
        .collect();

    rows.sort_by_key(|r| r.month);
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn month(m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, 1).unwrap()
    }

    fn mv(m: u32, value: f64) -> MonthlyValue {
        MonthlyValue { month: month(m), value }
    }

    fn ip(m: u32, inflation: f64) -> InflationPoint {
        InflationPoint { month: month(m), index: 130.0, inflation }
    }

    #[test]
    fn test_only_common_months_survive() {
        let rates = vec![mv(1, 11.0), mv(2, 11.1), mv(3, 11.2)];
        let inflation = vec![ip(2, 4.5), ip(3, 4.4), ip(4, 4.3)];
        let fx = vec![mv(1, 17.0), mv(3, 16.9)];

        let rows = join_economy(&rates, &inflation, &fx);
        assert_eq!(
            rows,
            vec![EconomyRow {
                month: month(3),
                interest_rate: 11.2,
                inflation: 4.4,
                exchange_rate: 16.9,
            }]
        );
    }

    #[test]
    fn test_rows_sorted_by_month() {
        let rates = vec![mv(2, 2.0), mv(1, 1.0)];
        let inflation = vec![ip(1, 0.1), ip(2, 0.2)];
        let fx = vec![mv(1, 10.0), mv(2, 20.0)];

        let months: Vec<_> = join_economy(&rates, &inflation, &fx)
            .iter()
            .map(|r| r.month)
            .collect();
        assert_eq!(months, vec![month(1), month(2)]);
    }
}
