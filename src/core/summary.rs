//! One-shot daily summary built on the store's sample query.

use crate::health::{HealthError, HealthStore, MetricKind, TimePredicate};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Heart-rate statistics over a window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartRateStats {
    pub samples: usize,
    pub latest: f64,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

/// Totals for the window ending at `until`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub since: DateTime<Utc>,
    pub until: DateTime<Utc>,
    pub steps: f64,
    pub heart_rate: Option<HeartRateStats>,
}

/// Read both metrics once for the `window` preceding `until`.
pub fn summarize(
    store: &dyn HealthStore,
    until: DateTime<Utc>,
    window: Duration,
) -> Result<DailySummary, HealthError> {
    let since = until
        .checked_sub_signed(window)
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let predicate = TimePredicate::between(since, until);

    let steps: f64 = store
        .execute_sample_query(MetricKind::StepCount, predicate)?
        .iter()
        .map(|s| s.value)
        .sum();

    let readings = store.execute_sample_query(MetricKind::HeartRate, predicate)?;
    let values: Vec<f64> = readings.iter().map(|s| s.value).collect();
    let heart_rate = readings.first().map(|latest| HeartRateStats {
        samples: values.len(),
        latest: latest.value,
        mean: Statistics::mean(&values),
        min: Statistics::min(&values),
        max: Statistics::max(&values),
    });

    Ok(DailySummary {
        since,
        until,
        steps,
        heart_rate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::{MemoryHealthStore, MetricSample, NoopHealthStore};

    #[test]
    fn test_summary_over_window() {
        let store = MemoryHealthStore::new();
        let now = Utc::now();
        store.append_samples(vec![
            MetricSample::new(MetricKind::StepCount, 500.0, now - Duration::hours(30)),
            MetricSample::new(MetricKind::StepCount, 120.0, now - Duration::hours(3)),
            MetricSample::new(MetricKind::StepCount, 80.0, now - Duration::hours(1)),
            MetricSample::new(MetricKind::HeartRate, 60.0, now - Duration::hours(2)),
            MetricSample::new(MetricKind::HeartRate, 90.0, now - Duration::minutes(5)),
        ]);

        let summary = summarize(&store, now, Duration::hours(24)).unwrap();
        assert_eq!(summary.steps, 200.0);

        let hr = summary.heart_rate.unwrap();
        assert_eq!(hr.samples, 2);
        assert_eq!(hr.latest, 90.0);
        assert!((hr.mean - 75.0).abs() < 1e-9);
        assert_eq!(hr.min, 60.0);
        assert_eq!(hr.max, 90.0);
    }

    #[test]
    fn test_summary_with_oversized_window() {
        let store = MemoryHealthStore::new();
        let now = Utc::now();
        store.append_samples(vec![MetricSample::new(
            MetricKind::StepCount,
            42.0,
            now - Duration::days(3650),
        )]);

        let summary = summarize(&store, now, Duration::days(365 * 400_000)).unwrap();
        assert_eq!(summary.since, DateTime::<Utc>::MIN_UTC);
        assert_eq!(summary.steps, 42.0);
    }

    #[test]
    fn test_summary_without_heart_rate() {
        let store = MemoryHealthStore::new();
        let summary = summarize(&store, Utc::now(), Duration::hours(24)).unwrap();
        assert_eq!(summary.steps, 0.0);
        assert!(summary.heart_rate.is_none());
    }

    #[test]
    fn test_summary_on_unavailable_store() {
        let result = summarize(&NoopHealthStore::new(), Utc::now(), Duration::hours(24));
        assert_eq!(result, Err(HealthError::ServiceUnavailable));
    }
}
