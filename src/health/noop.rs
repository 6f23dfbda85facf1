//! Store for platforms without a health-data service.
//!
//! Every call fails with `ServiceUnavailable`, so the monitor can run and
//! show its unavailable notice instead of refusing to build.

use crate::health::types::{
    AnchoredQuery, BiologicalSex, BloodType, DataType, MetricKind, MetricSample, QueryHandle,
    TimePredicate,
};
use crate::health::{AuthorizationCallback, DeliveryHandler, HealthError, HealthStore};
use chrono::NaiveDate;

/// A store that never has data.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHealthStore;

impl NoopHealthStore {
    pub fn new() -> Self {
        Self
    }
}

impl HealthStore for NoopHealthStore {
    fn is_available(&self) -> bool {
        false
    }

    fn request_authorization(&self, _read_types: &[DataType], completion: AuthorizationCallback) {
        completion(Err(HealthError::ServiceUnavailable));
    }

    fn start_anchored_query(
        &self,
        _query: AnchoredQuery,
        _handler: DeliveryHandler,
    ) -> Result<QueryHandle, HealthError> {
        Err(HealthError::ServiceUnavailable)
    }

    fn stop_query(&self, handle: QueryHandle) -> Result<(), HealthError> {
        Err(HealthError::QueryNotFound(handle))
    }

    fn execute_sample_query(
        &self,
        _kind: MetricKind,
        _predicate: TimePredicate,
    ) -> Result<Vec<MetricSample>, HealthError> {
        Err(HealthError::ServiceUnavailable)
    }

    fn date_of_birth(&self) -> Result<NaiveDate, HealthError> {
        Err(HealthError::ServiceUnavailable)
    }

    fn biological_sex(&self) -> Result<BiologicalSex, HealthError> {
        Err(HealthError::ServiceUnavailable)
    }

    fn blood_type(&self) -> Result<BloodType, HealthError> {
        Err(HealthError::ServiceUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::types::{Cursor, READ_TYPES};
    use crossbeam_channel::unbounded;

    #[test]
    fn test_noop_store_is_unavailable() {
        let store = NoopHealthStore::new();
        assert!(!store.is_available());

        let query = AnchoredQuery {
            kind: MetricKind::HeartRate,
            predicate: TimePredicate::unbounded(),
            cursor: Cursor::initial(),
        };
        let result = store.start_anchored_query(query, Box::new(|_| {}));
        assert_eq!(result, Err(HealthError::ServiceUnavailable));
    }

    #[test]
    fn test_noop_authorization_fails() {
        let store = NoopHealthStore::new();
        let (tx, rx) = unbounded();
        store.request_authorization(
            &READ_TYPES,
            Box::new(move |result| {
                let _ = tx.send(result);
            }),
        );
        assert_eq!(rx.recv().unwrap(), Err(HealthError::ServiceUnavailable));
    }
}
