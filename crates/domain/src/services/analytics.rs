//! Time bucketing for analytics series.
//!
//! Persistence returns per-day totals; this module folds them into calendar
//! aligned buckets (UTC) and zero-fills gaps so charts get a dense series.

use chrono::{Datelike, Duration, NaiveDate, Utc};
use std::collections::BTreeMap;

use crate::errors::DomainError;
use crate::models::{AnalyticsQuery, DateRange, GroupBy, SeriesPoint};

/// Window used when the caller supplies no start date.
pub const DEFAULT_RANGE_DAYS: i64 = 30;

/// Longest window a caller may request.
pub const MAX_RANGE_DAYS: i64 = 366;

impl DateRange {
    /// Resolves the caller's optional bounds against `now`.
    pub fn resolve(
        query: &AnalyticsQuery,
        now: chrono::DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let end = query.end_date.unwrap_or(now);
        let start = query
            .start_date
            .unwrap_or_else(|| end - Duration::days(DEFAULT_RANGE_DAYS));

        if start > end {
            return Err(DomainError::InvalidInput(
                "startDate must not be after endDate".to_string(),
            ));
        }
        if end - start > Duration::days(MAX_RANGE_DAYS) {
            return Err(DomainError::InvalidInput(format!(
                "Date range must not exceed {} days",
                MAX_RANGE_DAYS
            )));
        }
        Ok(Self { start, end })
    }
}

/// First day of the bucket containing `date`.
pub fn bucket_start(date: NaiveDate, group_by: GroupBy) -> NaiveDate {
    match group_by {
        GroupBy::Day => date,
        GroupBy::Week => date - Duration::days(date.weekday().num_days_from_monday() as i64),
        GroupBy::Month => date.with_day(1).unwrap_or(date),
    }
}

fn next_bucket(start: NaiveDate, group_by: GroupBy) -> NaiveDate {
    match group_by {
        GroupBy::Day => start + Duration::days(1),
        GroupBy::Week => start + Duration::days(7),
        GroupBy::Month => {
            let (year, month) = if start.month() == 12 {
                (start.year() + 1, 1)
            } else {
                (start.year(), start.month() + 1)
            };
            NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(start + Duration::days(31))
        }
    }
}

/// Folds daily totals into buckets covering `range`, ascending and zero-filled.
///
/// Days outside the range are ignored.
pub fn bucket_series(
    daily: &[(NaiveDate, i64)],
    range: &DateRange,
    group_by: GroupBy,
) -> Vec<SeriesPoint> {
    let first_day = range.start.date_naive();
    let last_day = range.end.date_naive();

    let mut buckets: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    let mut cursor = bucket_start(first_day, group_by);
    while cursor <= last_day {
        buckets.insert(cursor, 0);
        cursor = next_bucket(cursor, group_by);
    }

    for (day, value) in daily {
        if *day < first_day || *day > last_day {
            continue;
        }
        *buckets.entry(bucket_start(*day, group_by)).or_insert(0) += value;
    }

    buckets
        .into_iter()
        .map(|(period, value)| SeriesPoint { period, value })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use chrono::TimeZone;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn range(start: NaiveDate, end: NaiveDate) -> DateRange {
        DateRange {
            start: Utc.from_utc_datetime(&start.and_hms_opt(0, 0, 0).unwrap()),
            end: Utc.from_utc_datetime(&end.and_hms_opt(23, 59, 59).unwrap()),
        }
    }

    #[test]
    fn test_default_range_is_thirty_days() {
        let now = Utc::now();
        let range = DateRange::resolve(&AnalyticsQuery::default(), now).unwrap();
        assert_eq!(range.end, now);
        assert_eq!(range.end - range.start, Duration::days(30));
    }

    #[test]
    fn test_inverted_and_oversized_ranges_rejected() {
        let now = Utc::now();
        let inverted = AnalyticsQuery {
            start_date: Some(now),
            end_date: Some(now - Duration::days(1)),
            group_by: None,
        };
        assert_eq!(
            DateRange::resolve(&inverted, now).unwrap_err().kind(),
            ErrorKind::InvalidInput
        );

        let oversized = AnalyticsQuery {
            start_date: Some(now - Duration::days(400)),
            end_date: Some(now),
            group_by: None,
        };
        assert!(DateRange::resolve(&oversized, now).is_err());
    }

    #[test]
    fn test_bucket_start() {
        // 2024-03-14 is a Thursday.
        assert_eq!(bucket_start(day(2024, 3, 14), GroupBy::Day), day(2024, 3, 14));
        assert_eq!(bucket_start(day(2024, 3, 14), GroupBy::Week), day(2024, 3, 11));
        assert_eq!(bucket_start(day(2024, 3, 11), GroupBy::Week), day(2024, 3, 11));
        assert_eq!(bucket_start(day(2024, 3, 14), GroupBy::Month), day(2024, 3, 1));
    }

    #[test]
    fn test_daily_series_zero_filled() {
        let series = bucket_series(
            &[(day(2024, 1, 2), 5), (day(2024, 1, 4), 7)],
            &range(day(2024, 1, 1), day(2024, 1, 5)),
            GroupBy::Day,
        );
        let values: Vec<i64> = series.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![0, 5, 0, 7, 0]);
        assert_eq!(series[0].period, day(2024, 1, 1));
    }

    #[test]
    fn test_monthly_series_crosses_year() {
        let series = bucket_series(
            &[
                (day(2023, 12, 15), 100),
                (day(2023, 12, 31), 50),
                (day(2024, 1, 1), 25),
            ],
            &range(day(2023, 11, 20), day(2024, 2, 3)),
            GroupBy::Month,
        );
        let points: Vec<(NaiveDate, i64)> = series.iter().map(|p| (p.period, p.value)).collect();
        assert_eq!(
            points,
            vec![
                (day(2023, 11, 1), 0),
                (day(2023, 12, 1), 150),
                (day(2024, 1, 1), 25),
                (day(2024, 2, 1), 0),
            ]
        );
    }

    #[test]
    fn test_weekly_series_sums_and_ignores_out_of_range() {
        let series = bucket_series(
            &[
                (day(2024, 3, 10), 999),
                (day(2024, 3, 11), 1),
                (day(2024, 3, 17), 2),
                (day(2024, 3, 18), 4),
            ],
            &range(day(2024, 3, 11), day(2024, 3, 20)),
            GroupBy::Week,
        );
        let values: Vec<i64> = series.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![3, 4]);
    }

    #[test]
    fn test_series_total_is_preserved() {
        let daily: Vec<(NaiveDate, i64)> = (0..60)
            .map(|i| (day(2024, 1, 1) + Duration::days(i), i))
            .collect();
        let r = range(day(2024, 1, 1), day(2024, 2, 29));
        let expected: i64 = daily.iter().map(|(_, v)| v).sum();
        for group_by in [GroupBy::Day, GroupBy::Week, GroupBy::Month] {
            let series = bucket_series(&daily, &r, group_by);
            assert_eq!(series.iter().map(|p| p.value).sum::<i64>(), expected);
            assert!(series.windows(2).all(|w| w[0].period < w[1].period));
        }
    }
}
