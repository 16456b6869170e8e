//! Adaptive time bucketing for the activity chart.
//!
//! Granularity is chosen from the spread of the whole input, not from the
//! requested window: a day of data inside a month-long window is still
//! bucketed by hour.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Granularity {
    Minute,
    Hour,
    Day,
}

impl Granularity {
    /// Zero-padded, most significant field first, so that lexical order of
    /// labels is chronological order.
    pub fn label_format(&self) -> &'static str {
        match self {
            Granularity::Minute => "%Y-%m-%d %H:%M",
            Granularity::Hour => "%Y-%m-%d %H:00",
            Granularity::Day => "%Y-%m-%d",
        }
    }

    /// UTC label of the bucket containing `instant`.
    pub fn label(&self, instant: &DateTime<Utc>) -> String {
        instant.format(self.label_format()).to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeBucket {
    pub label: String,
    pub count: u64,
}

/// Thresholds for picking a granularity from a timestamp spread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeBucketPolicy {
    /// Spreads up to this use minute buckets
    pub hourly_threshold: Duration,
    /// Spreads up to this (and above `hourly_threshold`) use hour buckets
    pub daily_threshold: Duration,
}

impl Default for TimeBucketPolicy {
    fn default() -> Self {
        Self {
            hourly_threshold: Duration::minutes(60),
            daily_threshold: Duration::hours(48),
        }
    }
}

impl TimeBucketPolicy {
    pub fn granularity_for(&self, range: Duration) -> Granularity {
        if range <= self.hourly_threshold {
            Granularity::Minute
        } else if range <= self.daily_threshold {
            Granularity::Hour
        } else {
            Granularity::Day
        }
    }

    /// Granularity for the spread of `timestamps`; `None` when empty.
    pub fn granularity_of(&self, timestamps: &[DateTime<Utc>]) -> Option<Granularity> {
        let min = timestamps.iter().min()?;
        let max = timestamps.iter().max()?;
        Some(self.granularity_for(*max - *min))
    }

    /// Buckets ordered by label ascending. Counts sum to `timestamps.len()`.
    pub fn aggregate(&self, timestamps: &[DateTime<Utc>]) -> Vec<TimeBucket> {
        let Some(granularity) = self.granularity_of(timestamps) else {
            return Vec::new();
        };

        let mut counts: BTreeMap<String, u64> = BTreeMap::new();
        for instant in timestamps {
            *counts.entry(granularity.label(instant)).or_default() += 1;
        }

        counts
            .into_iter()
            .map(|(label, count)| TimeBucket { label, count })
            .collect()
    }
}

/// [`TimeBucketPolicy::aggregate`] with the default thresholds.
pub fn aggregate(timestamps: &[DateTime<Utc>]) -> Vec<TimeBucket> {
    TimeBucketPolicy::default().aggregate(timestamps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 28, 23, 58, 30).unwrap()
    }

    fn total(buckets: &[TimeBucket]) -> u64 {
        buckets.iter().map(|b| b.count).sum()
    }

    #[test]
    fn test_empty_input_gives_no_buckets() {
        assert!(aggregate(&[]).is_empty());
    }

    #[test]
    fn test_ninety_seconds_uses_minute_buckets() {
        let timestamps: Vec<_> = [0, 20, 45, 70, 90]
            .iter()
            .map(|s| t0() + Duration::seconds(*s))
            .collect();

        let buckets = aggregate(&timestamps);
        assert_eq!(total(&buckets), 5);
        assert_eq!(
            buckets,
            vec![
                TimeBucket { label: "2024-02-28 23:58".to_string(), count: 2 },
                TimeBucket { label: "2024-02-28 23:59".to_string(), count: 2 },
                TimeBucket { label: "2024-02-29 00:00".to_string(), count: 1 },
            ]
        );
    }

    #[test]
    fn test_ten_days_uses_day_buckets() {
        let timestamps: Vec<_> = [0, 1, 5, 9, 10]
            .iter()
            .map(|d| t0() + Duration::days(*d))
            .collect();

        let buckets = aggregate(&timestamps);
        assert_eq!(total(&buckets), 5);
        assert!(buckets.iter().all(|b| b.label.len() == "2024-02-28".len()));
        assert_eq!(buckets[0].label, "2024-02-28");
        assert_eq!(buckets[1].label, "2024-02-29");
    }

    #[test]
    fn test_hour_buckets_between_thresholds() {
        let timestamps = vec![t0(), t0() + Duration::hours(5)];
        let buckets = aggregate(&timestamps);
        assert_eq!(buckets[0].label, "2024-02-28 23:00");
        assert_eq!(buckets[1].label, "2024-02-29 04:00");
    }

    #[test]
    fn test_thresholds_are_inclusive() {
        let policy = TimeBucketPolicy::default();
        assert_eq!(policy.granularity_for(Duration::minutes(60)), Granularity::Minute);
        assert_eq!(
            policy.granularity_for(Duration::minutes(60) + Duration::milliseconds(1)),
            Granularity::Hour
        );
        assert_eq!(policy.granularity_for(Duration::hours(48)), Granularity::Hour);
        assert_eq!(
            policy.granularity_for(Duration::hours(48) + Duration::milliseconds(1)),
            Granularity::Day
        );
    }

    #[test]
    fn test_granularity_is_monotonic_in_range() {
        let policy = TimeBucketPolicy::default();
        let mut previous = Granularity::Minute;
        for minutes in (0..=5 * 24 * 60).step_by(7) {
            let current = policy.granularity_for(Duration::minutes(minutes));
            assert!(current >= previous, "granularity went down at {minutes} minutes");
            previous = current;
        }
    }

    #[test]
    fn test_labels_strictly_increase_and_counts_sum() {
        let timestamps: Vec<_> = (0..200)
            .map(|i| t0() + Duration::minutes((i * 37) % 1500))
            .collect();

        let buckets = aggregate(&timestamps);
        assert_eq!(total(&buckets), 200);
        assert!(buckets.windows(2).all(|w| w[0].label < w[1].label));
    }

    #[test]
    fn test_single_timestamp_is_one_minute_bucket() {
        let buckets = aggregate(&[t0()]);
        assert_eq!(
            buckets,
            vec![TimeBucket { label: "2024-02-28 23:58".to_string(), count: 1 }]
        );
    }

    #[test]
    fn test_custom_policy() {
        let policy = TimeBucketPolicy {
            hourly_threshold: Duration::minutes(1),
            daily_threshold: Duration::minutes(2),
        };
        assert_eq!(policy.granularity_for(Duration::minutes(3)), Granularity::Day);
        assert_eq!(Granularity::Day.to_string(), "day");
    }
}
