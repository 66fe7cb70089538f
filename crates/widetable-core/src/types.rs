use crate::{
    model::column::ColumnType,
    traits::FieldValue,
    value::Value,
};
use derive_more::{Add, AddAssign, Deref, Display, From};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

///
/// Counter
///
/// Counter column. Written through `set`/`update` it becomes an increment by
/// the wrapped amount rather than an overwrite.
///

#[derive(
    Add,
    AddAssign,
    Clone,
    Copy,
    Debug,
    Default,
    Deref,
    Deserialize,
    Display,
    Eq,
    From,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
pub struct Counter(pub i64);

impl FieldValue for Counter {
    fn column_type() -> ColumnType {
        ColumnType::Counter
    }

    fn to_value(&self) -> Value {
        Value::Counter(self.0)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Counter(v) | Value::Int(v) => Some(Self(*v)),
            Value::Null => Some(Self::default()),
            _ => None,
        }
    }
}

impl From<Counter> for Value {
    fn from(counter: Counter) -> Self {
        Self::Counter(counter.0)
    }
}

///
/// Timestamp
///
/// Milliseconds since the unix epoch.
///

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deref,
    Deserialize,
    Display,
    Eq,
    From,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Current wall-clock time; clocks before the epoch read as zero.
    #[must_use]
    pub fn now() -> Self {
        let elapsed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO);

        Self(i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
    }
}

impl FieldValue for Timestamp {
    fn column_type() -> ColumnType {
        ColumnType::Timestamp
    }

    fn to_value(&self) -> Value {
        Value::Timestamp(self.0)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Timestamp(v) => Some(Self(*v)),
            Value::Null => Some(Self::default()),
            _ => None,
        }
    }
}

impl From<Timestamp> for Value {
    fn from(ts: Timestamp) -> Self {
        Self::Timestamp(ts.0)
    }
}
