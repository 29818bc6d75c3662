use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use crate::series::{Aggregation, MonthlyValue, Observation};
use crate::transform::utility::mean;

/// First day of the month `date` falls in.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Reduces observations to one value per calendar month.
///
/// Missing values are ignored; months without any value are dropped. The
/// output is ordered by month. `Aggregation::Last` picks the latest dated
/// observation of the month, regardless of input order.
pub fn to_monthly(observations: &[Observation], aggregation: Aggregation) -> Vec<MonthlyValue> {
    let mut buckets: BTreeMap<NaiveDate, Vec<(NaiveDate, f64)>> = BTreeMap::new();

    for obs in observations {
        let Some(value) = obs.value else {
            continue;
        };
        buckets
            .entry(month_start(obs.date))
            .or_default()
            .push((obs.date, value));
    }

    buckets
        .into_iter()
        .filter_map(|(month, mut points)| {
            let value = match aggregation {
                Aggregation::Mean => {
                    let values: Vec<f64> = points.iter().map(|(_, v)| *v).collect();
                    mean(&values)
                }
                Aggregation::Last => {
                    points.sort_by_key(|(date, _)| *date);
                    points.last()?.1
                }
            };
            Some(MonthlyValue { month, value })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(y: i32, m: u32, d: u32, value: Option<f64>) -> Observation {
        Observation {
            date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            value,
        }
    }

    fn month(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    #[test]
    fn test_month_start() {
        assert_eq!(month_start(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()), month(2024, 2));
    }

    #[test]
    fn test_mean_per_month_ignores_missing() {
        let input = vec![
            obs(2024, 1, 2, Some(17.0)),
            obs(2024, 1, 3, None),
            obs(2024, 1, 4, Some(18.0)),
            obs(2024, 2, 1, Some(20.0)),
        ];

        let monthly = to_monthly(&input, Aggregation::Mean);
        assert_eq!(
            monthly,
            vec![
                MonthlyValue { month: month(2024, 1), value: 17.5 },
                MonthlyValue { month: month(2024, 2), value: 20.0 },
            ]
        );
    }

    #[test]
    fn test_months_without_values_are_dropped() {
        let input = vec![obs(2024, 1, 2, None), obs(2024, 2, 1, Some(1.0))];
        let monthly = to_monthly(&input, Aggregation::Mean);
        assert_eq!(monthly.len(), 1);
        assert_eq!(monthly[0].month, month(2024, 2));
    }

    #[test]
    fn test_output_sorted_even_if_input_is_not() {
        let input = vec![obs(2024, 3, 1, Some(3.0)), obs(2023, 12, 1, Some(1.0))];
        let months: Vec<_> = to_monthly(&input, Aggregation::Mean)
            .into_iter()
            .map(|m| m.month)
            .collect();
        assert_eq!(months, vec![month(2023, 12), month(2024, 3)]);
    }

    #[test]
    fn test_last_takes_latest_date_in_month() {
        let input = vec![
            obs(2024, 1, 31, Some(3.0)),
            obs(2024, 1, 1, Some(1.0)),
            obs(2024, 1, 15, None),
        ];
        let monthly = to_monthly(&input, Aggregation::Last);
        assert_eq!(monthly, vec![MonthlyValue { month: month(2024, 1), value: 3.0 }]);
    }

    #[test]
    fn test_empty_input() {
        assert!(to_monthly(&[], Aggregation::Mean).is_empty());
    }
}
