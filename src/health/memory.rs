//! In-process health-data store with anchored delivery.
//!
//! Samples are appended by a producer (the simulator, or a test) and every
//! running anchored query whose metric changed receives a delivery on the
//! producer's thread. Positions start at 1 so that `Cursor::initial()`
//! precedes every stored sample.
//!
//! Handlers run one batch at a time, in cursor order, with the state lock
//! released. A handler may read the store or stop its query but must not
//! append, delete or start a query on the same store.

use crate::health::types::{
    AnchoredQuery, BiologicalSex, BloodType, CharacteristicKind, Cursor, DataType, Delivery,
    MetricKind, MetricSample, QueryHandle, TimePredicate,
};
use crate::health::{AuthorizationCallback, DeliveryHandler, HealthError, HealthStore};
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Outcome of the most recent authorization request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationStatus {
    NotDetermined,
    Granted,
    Denied,
}

struct StoredSample {
    position: u64,
    sample: MetricSample,
}

struct Deletion {
    position: u64,
    kind: MetricKind,
    id: Uuid,
}

struct RunningQuery {
    kind: MetricKind,
    predicate: TimePredicate,
    /// Last position delivered to this query
    cursor: Cursor,
    handler: Arc<dyn Fn(Delivery) + Send + Sync>,
}

struct Inner {
    available: bool,
    grant_on_request: bool,
    authorization: AuthorizationStatus,
    supported: HashSet<MetricKind>,
    samples: Vec<StoredSample>,
    deletions: Vec<Deletion>,
    last_position: u64,
    queries: HashMap<QueryHandle, RunningQuery>,
    date_of_birth: Option<NaiveDate>,
    sex: Option<BiologicalSex>,
    blood_type: Option<BloodType>,
}

impl Inner {
    fn check_readable(&self, kind: MetricKind) -> Result<(), HealthError> {
        if !self.available {
            return Err(HealthError::ServiceUnavailable);
        }
        if self.authorization == AuthorizationStatus::Denied {
            return Err(HealthError::AuthorizationDenied);
        }
        if !self.supported.contains(&kind) {
            return Err(HealthError::MissingMetricType(kind));
        }
        Ok(())
    }

    fn check_characteristics(&self) -> Result<(), HealthError> {
        if !self.available {
            return Err(HealthError::ServiceUnavailable);
        }
        if self.authorization == AuthorizationStatus::Denied {
            return Err(HealthError::AuthorizationDenied);
        }
        Ok(())
    }

    /// Build the delivery a query at `cursor` is owed right now.
    fn delivery_since(&self, kind: MetricKind, predicate: &TimePredicate, cursor: Cursor) -> Delivery {
        let mut samples: Vec<MetricSample> = self
            .samples
            .iter()
            .filter(|s| s.position > cursor.position())
            .filter(|s| s.sample.kind == kind && predicate.matches(s.sample.timestamp))
            .map(|s| s.sample.clone())
            .collect();
        samples.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        let deleted = self
            .deletions
            .iter()
            .filter(|d| d.position > cursor.position() && d.kind == kind)
            .map(|d| d.id)
            .collect();

        Delivery {
            samples,
            deleted,
            cursor: Cursor::from_position(self.last_position),
            error: None,
        }
    }

    /// Advance every query of `kind` and collect what to hand to each handler.
    fn pending_deliveries(
        &mut self,
        kind: MetricKind,
    ) -> Vec<(Arc<dyn Fn(Delivery) + Send + Sync>, Delivery)> {
        let mut pending = Vec::new();
        let handles: Vec<QueryHandle> = self
            .queries
            .iter()
            .filter(|(_, q)| q.kind == kind)
            .map(|(handle, _)| *handle)
            .collect();

        for handle in handles {
            let Some(query) = self.queries.get(&handle) else {
                continue;
            };
            let delivery = self.delivery_since(query.kind, &query.predicate, query.cursor);
            let handler = query.handler.clone();
            if let Some(query) = self.queries.get_mut(&handle) {
                query.cursor = delivery.cursor;
            }
            pending.push((handler, delivery));
        }
        pending
    }
}

/// An in-memory store shared between a producer and the monitor.
pub struct MemoryHealthStore {
    inner: Mutex<Inner>,
    /// Held from cursor assignment until the handlers have returned.
    delivering: Mutex<()>,
}

impl MemoryHealthStore {
    /// Create an available store that supports both metrics and grants
    /// authorization when asked.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                available: true,
                grant_on_request: true,
                authorization: AuthorizationStatus::NotDetermined,
                supported: [MetricKind::HeartRate, MetricKind::StepCount]
                    .into_iter()
                    .collect(),
                samples: Vec::new(),
                deletions: Vec::new(),
                last_position: 0,
                queries: HashMap::new(),
                date_of_birth: None,
                sex: None,
                blood_type: None,
            }),
            delivering: Mutex::new(()),
        }
    }

    /// Mark the whole service as present or absent.
    pub fn with_availability(self, available: bool) -> Self {
        self.lock().available = available;
        self
    }

    /// Decide how the simulated user answers the permission prompt.
    pub fn with_authorization_answer(self, grant: bool) -> Self {
        self.lock().grant_on_request = grant;
        self
    }

    /// Restrict the metric types this store can resolve.
    pub fn with_supported_metrics(self, kinds: &[MetricKind]) -> Self {
        self.lock().supported = kinds.iter().copied().collect();
        self
    }

    /// Set the static characteristics returned by the profile reads.
    pub fn with_profile(
        self,
        date_of_birth: Option<NaiveDate>,
        sex: Option<BiologicalSex>,
        blood_type: Option<BloodType>,
    ) -> Self {
        {
            let mut inner = self.lock();
            inner.date_of_birth = date_of_birth;
            inner.sex = sex;
            inner.blood_type = blood_type;
        }
        self
    }

    /// Change the stored authorization outside of a request, as a user
    /// editing permissions in system settings would.
    pub fn set_authorization(&self, status: AuthorizationStatus) {
        self.lock().authorization = status;
    }

    pub fn authorization(&self) -> AuthorizationStatus {
        self.lock().authorization
    }

    /// Append samples and notify every running query of the affected metrics.
    ///
    /// Returns the position after the append.
    pub fn append_samples(&self, samples: Vec<MetricSample>) -> Cursor {
        let _delivering = self.lock_delivery();
        let (cursor, pending) = {
            let mut inner = self.lock();
            let mut kinds = Vec::new();
            for sample in samples {
                inner.last_position += 1;
                let position = inner.last_position;
                if !kinds.contains(&sample.kind) {
                    kinds.push(sample.kind);
                }
                inner.samples.push(StoredSample { position, sample });
            }

            let mut pending = Vec::new();
            for kind in kinds {
                pending.extend(inner.pending_deliveries(kind));
            }
            (Cursor::from_position(inner.last_position), pending)
        };

        for (handler, delivery) in pending {
            handler(delivery);
        }
        cursor
    }

    /// Remove a sample. Running queries of its metric see it in `deleted`.
    pub fn delete_sample(&self, id: Uuid) -> bool {
        let _delivering = self.lock_delivery();
        let pending = {
            let mut inner = self.lock();
            let Some(index) = inner.samples.iter().position(|s| s.sample.id == id) else {
                return false;
            };
            let removed = inner.samples.remove(index);
            inner.last_position += 1;
            let position = inner.last_position;
            inner.deletions.push(Deletion {
                position,
                kind: removed.sample.kind,
                id,
            });
            inner.pending_deliveries(removed.sample.kind)
        };

        for (handler, delivery) in pending {
            handler(delivery);
        }
        true
    }

    /// Number of anchored queries currently registered.
    pub fn running_query_count(&self) -> usize {
        self.lock().queries.len()
    }

    pub fn is_running(&self, handle: QueryHandle) -> bool {
        self.lock().queries.contains_key(&handle)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_delivery(&self) -> MutexGuard<'_, ()> {
        self.delivering
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemoryHealthStore {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthStore for MemoryHealthStore {
    fn is_available(&self) -> bool {
        self.lock().available
    }

    fn request_authorization(&self, read_types: &[DataType], completion: AuthorizationCallback) {
        let result = {
            let mut inner = self.lock();
            if !inner.available {
                Err(HealthError::ServiceUnavailable)
            } else if inner.authorization == AuthorizationStatus::Denied {
                // The prompt is only shown once; a denial sticks until changed in settings.
                Err(HealthError::AuthorizationDenied)
            } else if inner.grant_on_request {
                inner.authorization = AuthorizationStatus::Granted;
                Ok(())
            } else {
                inner.authorization = AuthorizationStatus::Denied;
                Err(HealthError::AuthorizationDenied)
            }
        };
        tracing::debug!(
            types = read_types.len(),
            granted = result.is_ok(),
            "authorization requested"
        );
        completion(result);
    }

    fn start_anchored_query(
        &self,
        query: AnchoredQuery,
        handler: DeliveryHandler,
    ) -> Result<QueryHandle, HealthError> {
        let handler: Arc<dyn Fn(Delivery) + Send + Sync> = Arc::from(handler);
        let handle = QueryHandle::new();

        let _delivering = self.lock_delivery();
        let initial = {
            let mut inner = self.lock();
            inner.check_readable(query.kind)?;
            let delivery = inner.delivery_since(query.kind, &query.predicate, query.cursor);
            inner.queries.insert(
                handle,
                RunningQuery {
                    kind: query.kind,
                    predicate: query.predicate,
                    cursor: delivery.cursor,
                    handler: handler.clone(),
                },
            );
            delivery
        };

        handler(initial);
        Ok(handle)
    }

    fn stop_query(&self, handle: QueryHandle) -> Result<(), HealthError> {
        self.lock()
            .queries
            .remove(&handle)
            .map(|_| ())
            .ok_or(HealthError::QueryNotFound(handle))
    }

    fn execute_sample_query(
        &self,
        kind: MetricKind,
        predicate: TimePredicate,
    ) -> Result<Vec<MetricSample>, HealthError> {
        let inner = self.lock();
        inner.check_readable(kind)?;
        Ok(inner
            .delivery_since(kind, &predicate, Cursor::initial())
            .samples)
    }

    fn date_of_birth(&self) -> Result<NaiveDate, HealthError> {
        let inner = self.lock();
        inner.check_characteristics()?;
        inner
            .date_of_birth
            .ok_or(HealthError::CharacteristicUnavailable(
                CharacteristicKind::DateOfBirth,
            ))
    }

    fn biological_sex(&self) -> Result<BiologicalSex, HealthError> {
        let inner = self.lock();
        inner.check_characteristics()?;
        inner.sex.ok_or(HealthError::CharacteristicUnavailable(
            CharacteristicKind::BiologicalSex,
        ))
    }

    fn blood_type(&self) -> Result<BloodType, HealthError> {
        let inner = self.lock();
        inner.check_characteristics()?;
        inner.blood_type.ok_or(HealthError::CharacteristicUnavailable(
            CharacteristicKind::BloodType,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use crossbeam_channel::{unbounded, Receiver};

    fn collecting_handler() -> (DeliveryHandler, Receiver<Delivery>) {
        let (tx, rx) = unbounded();
        let handler: DeliveryHandler = Box::new(move |delivery| {
            let _ = tx.send(delivery);
        });
        (handler, rx)
    }

    fn heart_rate_query(cursor: Cursor) -> AnchoredQuery {
        AnchoredQuery {
            kind: MetricKind::HeartRate,
            predicate: TimePredicate::unbounded(),
            cursor,
        }
    }

    #[test]
    fn test_initial_delivery_contains_history() {
        let store = MemoryHealthStore::new();
        let now = Utc::now();
        store.append_samples(vec![
            MetricSample::new(MetricKind::HeartRate, 60.0, now - Duration::minutes(2)),
            MetricSample::new(MetricKind::HeartRate, 70.0, now - Duration::minutes(1)),
        ]);

        let (handler, rx) = collecting_handler();
        store
            .start_anchored_query(heart_rate_query(Cursor::initial()), handler)
            .unwrap();

        let delivery = rx.try_recv().unwrap();
        assert_eq!(delivery.samples.len(), 2);
        // Most recent first
        assert_eq!(delivery.samples[0].value, 70.0);
        assert_eq!(delivery.cursor, Cursor::from_position(2));
    }

    #[test]
    fn test_resume_from_cursor_skips_delivered_samples() {
        let store = MemoryHealthStore::new();
        let cursor = store.append_samples(vec![MetricSample::new(
            MetricKind::HeartRate,
            60.0,
            Utc::now(),
        )]);

        let (handler, rx) = collecting_handler();
        store
            .start_anchored_query(heart_rate_query(cursor), handler)
            .unwrap();
        assert!(rx.try_recv().unwrap().is_empty());

        store.append_samples(vec![MetricSample::new(
            MetricKind::HeartRate,
            80.0,
            Utc::now(),
        )]);
        let update = rx.try_recv().unwrap();
        assert_eq!(update.samples.len(), 1);
        assert_eq!(update.samples[0].value, 80.0);
    }

    #[test]
    fn test_other_metric_does_not_notify() {
        let store = MemoryHealthStore::new();
        let (handler, rx) = collecting_handler();
        store
            .start_anchored_query(heart_rate_query(Cursor::initial()), handler)
            .unwrap();
        let _ = rx.try_recv();

        store.append_samples(vec![MetricSample::new(
            MetricKind::StepCount,
            12.0,
            Utc::now(),
        )]);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_concurrent_append_waits_for_initial_delivery() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::thread;

        let store = Arc::new(MemoryHealthStore::new());
        store.append_samples(vec![MetricSample::new(
            MetricKind::StepCount,
            5000.0,
            Utc::now() - Duration::hours(1),
        )]);

        let (tx, rx) = unbounded();
        let (entered_tx, entered_rx) = unbounded();
        let first = AtomicBool::new(true);
        let handler: DeliveryHandler = Box::new(move |delivery| {
            if first.swap(false, Ordering::SeqCst) {
                let _ = entered_tx.send(());
                thread::sleep(std::time::Duration::from_millis(100));
            }
            let _ = tx.send(delivery);
        });

        let starter = {
            let store = store.clone();
            thread::spawn(move || {
                let query = AnchoredQuery {
                    kind: MetricKind::StepCount,
                    predicate: TimePredicate::since(Utc::now() - Duration::hours(24)),
                    cursor: Cursor::initial(),
                };
                store.start_anchored_query(query, handler).unwrap();
            })
        };

        // The initial delivery is in flight when the producer appends.
        entered_rx.recv().unwrap();
        let producer = {
            let store = store.clone();
            thread::spawn(move || {
                store.append_samples(vec![MetricSample::new(
                    MetricKind::StepCount,
                    7.0,
                    Utc::now(),
                )]);
            })
        };
        starter.join().unwrap();
        producer.join().unwrap();

        let deliveries: Vec<Delivery> = rx.try_iter().collect();
        assert_eq!(deliveries.len(), 2);
        assert_eq!(deliveries[0].samples[0].value, 5000.0);
        assert_eq!(deliveries[1].samples[0].value, 7.0);
        assert!(deliveries[0].cursor < deliveries[1].cursor);
    }

    #[test]
    fn test_stop_query_ends_delivery() {
        let store = MemoryHealthStore::new();
        let (handler, rx) = collecting_handler();
        let handle = store
            .start_anchored_query(heart_rate_query(Cursor::initial()), handler)
            .unwrap();
        let _ = rx.try_recv();

        store.stop_query(handle).unwrap();
        assert_eq!(
            store.stop_query(handle),
            Err(HealthError::QueryNotFound(handle))
        );

        store.append_samples(vec![MetricSample::new(
            MetricKind::HeartRate,
            90.0,
            Utc::now(),
        )]);
        assert!(rx.try_recv().is_err());
        assert_eq!(store.running_query_count(), 0);
    }

    #[test]
    fn test_deletion_is_delivered() {
        let store = MemoryHealthStore::new();
        let sample = MetricSample::new(MetricKind::StepCount, 5.0, Utc::now());
        let id = sample.id;
        store.append_samples(vec![sample]);

        let (handler, rx) = collecting_handler();
        let query = AnchoredQuery {
            kind: MetricKind::StepCount,
            predicate: TimePredicate::unbounded(),
            cursor: Cursor::initial(),
        };
        store.start_anchored_query(query, handler).unwrap();
        let _ = rx.try_recv();

        assert!(store.delete_sample(id));
        let delivery = rx.try_recv().unwrap();
        assert!(delivery.is_empty());
        assert_eq!(delivery.deleted, vec![id]);
    }

    #[test]
    fn test_denied_authorization_blocks_queries() {
        let store = MemoryHealthStore::new().with_authorization_answer(false);
        let (tx, rx) = unbounded();
        store.request_authorization(
            &crate::health::READ_TYPES,
            Box::new(move |result| {
                let _ = tx.send(result);
            }),
        );
        assert_eq!(rx.recv().unwrap(), Err(HealthError::AuthorizationDenied));
        assert_eq!(store.authorization(), AuthorizationStatus::Denied);

        let (handler, _rx) = collecting_handler();
        let result = store.start_anchored_query(heart_rate_query(Cursor::initial()), handler);
        assert_eq!(result, Err(HealthError::AuthorizationDenied));
    }

    #[test]
    fn test_unsupported_metric() {
        let store = MemoryHealthStore::new().with_supported_metrics(&[MetricKind::StepCount]);
        let (handler, _rx) = collecting_handler();
        let result = store.start_anchored_query(heart_rate_query(Cursor::initial()), handler);
        assert_eq!(
            result,
            Err(HealthError::MissingMetricType(MetricKind::HeartRate))
        );
    }

    #[test]
    fn test_sample_query_filters_by_predicate() {
        let store = MemoryHealthStore::new();
        let now = Utc::now();
        store.append_samples(vec![
            MetricSample::new(MetricKind::StepCount, 100.0, now - Duration::hours(30)),
            MetricSample::new(MetricKind::StepCount, 40.0, now - Duration::hours(2)),
        ]);

        let samples = store
            .execute_sample_query(
                MetricKind::StepCount,
                TimePredicate::since(now - Duration::hours(24)),
            )
            .unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].value, 40.0);
    }

    #[test]
    fn test_missing_characteristic() {
        let store = MemoryHealthStore::new().with_profile(None, Some(BiologicalSex::Female), None);
        assert_eq!(store.biological_sex(), Ok(BiologicalSex::Female));
        assert_eq!(
            store.blood_type(),
            Err(HealthError::CharacteristicUnavailable(
                CharacteristicKind::BloodType
            ))
        );
    }
}
