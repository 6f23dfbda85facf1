//! Health-data store access for the monitor.
//!
//! The store is an external collaborator: it owns sampling, authorization
//! and anchor bookkeeping. This module defines the subset of its surface the
//! monitor uses, plus two in-process backends.

pub mod memory;
pub mod noop;
pub mod simulator;
pub mod types;

use chrono::NaiveDate;

// Re-export commonly used types
pub use memory::MemoryHealthStore;
pub use noop::NoopHealthStore;
pub use simulator::{SampleSimulator, SimulatorConfig};
pub use types::{
    AnchoredQuery, BiologicalSex, BloodType, CharacteristicKind, Cursor, DataType, Delivery,
    MetricKind, MetricSample, ProfileCharacteristics, QueryHandle, TimePredicate, READ_TYPES,
};

/// Callback invoked by the store, on the store's own thread, for every delivery.
pub type DeliveryHandler = Box<dyn Fn(Delivery) + Send + Sync>;

/// Completion for an authorization request.
pub type AuthorizationCallback = Box<dyn FnOnce(Result<(), HealthError>) + Send>;

/// The operations the monitor issues against a health-data store.
pub trait HealthStore: Send + Sync {
    /// Whether this platform has a health-data service at all.
    fn is_available(&self) -> bool;

    /// Ask the user for read access. The completion may run on any thread.
    fn request_authorization(&self, read_types: &[DataType], completion: AuthorizationCallback);

    /// Register an incremental query. The store delivers everything after
    /// `query.cursor` immediately, then every later change, until stopped.
    fn start_anchored_query(
        &self,
        query: AnchoredQuery,
        handler: DeliveryHandler,
    ) -> Result<QueryHandle, HealthError>;

    /// Cancel a running query.
    fn stop_query(&self, handle: QueryHandle) -> Result<(), HealthError>;

    /// One-shot read of every matching sample, most recent first.
    fn execute_sample_query(
        &self,
        kind: MetricKind,
        predicate: TimePredicate,
    ) -> Result<Vec<MetricSample>, HealthError>;

    fn date_of_birth(&self) -> Result<NaiveDate, HealthError>;

    fn biological_sex(&self) -> Result<BiologicalSex, HealthError>;

    fn blood_type(&self) -> Result<BloodType, HealthError>;
}

/// Errors reported by a health-data store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthError {
    ServiceUnavailable,
    AuthorizationDenied,
    MissingMetricType(MetricKind),
    QueryNotFound(QueryHandle),
    CharacteristicUnavailable(CharacteristicKind),
}

impl std::fmt::Display for HealthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthError::ServiceUnavailable => write!(f, "Health data is not available"),
            HealthError::AuthorizationDenied => {
                write!(f, "Read access to health data was denied")
            }
            HealthError::MissingMetricType(kind) => {
                write!(f, "Metric type {kind} is not supported by this store")
            }
            HealthError::QueryNotFound(handle) => write!(f, "No running query {handle}"),
            HealthError::CharacteristicUnavailable(kind) => {
                write!(f, "Characteristic {kind} is not set")
            }
        }
    }
}

impl std::error::Error for HealthError {}
