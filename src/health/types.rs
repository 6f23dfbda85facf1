//! Sample, query and characteristic types exchanged with a health-data store.

use crate::health::HealthError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A continuously sampled metric the monitor can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    HeartRate,
    StepCount,
}

impl MetricKind {
    /// Unit the store reports this metric in.
    pub fn unit(&self) -> &'static str {
        match self {
            MetricKind::HeartRate => "count/min",
            MetricKind::StepCount => "count",
        }
    }

    /// Stable identifier used in authorization requests and logs.
    pub fn identifier(&self) -> &'static str {
        match self {
            MetricKind::HeartRate => "heart_rate",
            MetricKind::StepCount => "step_count",
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.identifier())
    }
}

/// A static user attribute, read once rather than sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharacteristicKind {
    DateOfBirth,
    BiologicalSex,
    BloodType,
}

impl CharacteristicKind {
    pub fn identifier(&self) -> &'static str {
        match self {
            CharacteristicKind::DateOfBirth => "date_of_birth",
            CharacteristicKind::BiologicalSex => "biological_sex",
            CharacteristicKind::BloodType => "blood_type",
        }
    }
}

impl std::fmt::Display for CharacteristicKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.identifier())
    }
}

/// Any data type a store can be asked to authorize for reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Quantity(MetricKind),
    Characteristic(CharacteristicKind),
}

impl DataType {
    pub fn identifier(&self) -> &'static str {
        match self {
            DataType::Quantity(kind) => kind.identifier(),
            DataType::Characteristic(kind) => kind.identifier(),
        }
    }
}

/// Everything the monitor reads: three characteristics and two metrics.
pub const READ_TYPES: [DataType; 5] = [
    DataType::Characteristic(CharacteristicKind::DateOfBirth),
    DataType::Characteristic(CharacteristicKind::BloodType),
    DataType::Characteristic(CharacteristicKind::BiologicalSex),
    DataType::Quantity(MetricKind::HeartRate),
    DataType::Quantity(MetricKind::StepCount),
];

/// A single reading produced by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricSample {
    /// Store-assigned identifier
    pub id: Uuid,
    /// Which metric this sample belongs to
    pub kind: MetricKind,
    /// Numeric value in `unit`
    pub value: f64,
    pub unit: String,
    /// When the reading was taken
    pub timestamp: DateTime<Utc>,
    /// Device or app that produced the reading
    pub source: String,
}

impl MetricSample {
    /// Create a sample in the metric's native unit.
    pub fn new(kind: MetricKind, value: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            value,
            unit: kind.unit().to_string(),
            timestamp,
            source: String::from("unknown"),
        }
    }

    /// Set the producing source.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }
}

/// Opaque progress token into a store's change stream.
///
/// Tokens are totally ordered: a later position always compares greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cursor(u64);

impl Cursor {
    /// The token that precedes every delivered sample.
    pub fn initial() -> Self {
        Cursor(0)
    }

    /// Build a token from a store's internal position.
    pub fn from_position(position: u64) -> Self {
        Cursor(position)
    }

    /// The store position this token stands for.
    pub fn position(&self) -> u64 {
        self.0
    }

    pub fn is_initial(&self) -> bool {
        self.0 == 0
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Self::initial()
    }
}

/// Time restriction applied to a query. Open ends are unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimePredicate {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl TimePredicate {
    /// Matches every sample.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Matches samples taken at or after `start`.
    pub fn since(start: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: None,
        }
    }

    /// Matches samples in `[start, end)`.
    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn matches(&self, timestamp: DateTime<Utc>) -> bool {
        self.start.map_or(true, |start| timestamp >= start)
            && self.end.map_or(true, |end| timestamp < end)
    }
}

/// An incremental query: deliver everything after `cursor` that matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchoredQuery {
    pub kind: MetricKind,
    pub predicate: TimePredicate,
    pub cursor: Cursor,
}

/// One callback invocation of an anchored query.
#[derive(Debug, Clone, Default)]
pub struct Delivery {
    /// New samples, most recent first
    pub samples: Vec<MetricSample>,
    /// Samples removed from the store since the previous delivery
    pub deleted: Vec<Uuid>,
    /// Position to resume from
    pub cursor: Cursor,
    /// Set when the store failed to produce results but still moved the cursor
    pub error: Option<HealthError>,
}

impl Delivery {
    /// A delivery that carries only a failure and the new cursor.
    pub fn failed(error: HealthError, cursor: Cursor) -> Self {
        Self {
            cursor,
            error: Some(error),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Identity of a running anchored query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryHandle(Uuid);

impl QueryHandle {
    pub fn new() -> Self {
        QueryHandle(Uuid::new_v4())
    }
}

impl Default for QueryHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for QueryHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Biological sex as recorded by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BiologicalSex {
    NotSet,
    Female,
    Male,
    Other,
}

impl std::fmt::Display for BiologicalSex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            BiologicalSex::NotSet => "Not Set",
            BiologicalSex::Female => "Female",
            BiologicalSex::Male => "Male",
            BiologicalSex::Other => "Other",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BloodType {
    NotSet,
    APositive,
    ANegative,
    BPositive,
    BNegative,
    AbPositive,
    AbNegative,
    OPositive,
    ONegative,
}

impl std::fmt::Display for BloodType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            BloodType::NotSet => "Not Set",
            BloodType::APositive => "A+",
            BloodType::ANegative => "A-",
            BloodType::BPositive => "B+",
            BloodType::BNegative => "B-",
            BloodType::AbPositive => "AB+",
            BloodType::AbNegative => "AB-",
            BloodType::OPositive => "O+",
            BloodType::ONegative => "O-",
        };
        f.write_str(text)
    }
}

/// The four values shown on the profile screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileCharacteristics {
    pub date_of_birth: Option<NaiveDate>,
    pub age: Option<u32>,
    pub sex: Option<BiologicalSex>,
    pub blood_type: Option<BloodType>,
}

/// Whole years between `date_of_birth` and `today`.
pub fn age_on(date_of_birth: NaiveDate, today: NaiveDate) -> Option<u32> {
    today.years_since(date_of_birth)
}
