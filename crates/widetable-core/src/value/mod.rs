mod compare;


use crate::CLUSTERING_SENTINEL;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// re-exports
pub use compare::canonical_cmp;

///
/// FieldMap
///
/// Field-name → value mapping exchanged with the execution engine.
/// Sorted keys give every consumer the same deterministic field order.
///

pub type FieldMap = BTreeMap<String, Value>;

///
/// Value
///
/// Dynamic cell value bound into statements and produced by row iterators.
///
/// Null       → the column is absent / unset in the store.
/// Counter    → a counter cell; in update payloads it becomes an increment.
///

#[remain::sorted]
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub enum Value {
    Blob(Vec<u8>),
    Bool(bool),
    Counter(i64),
    Double(f64),
    Int(i64),
    /// Ordered list of values; order is preserved.
    List(Vec<Self>),
    /// Map entries; producers keep them sorted by canonical key order.
    Map(Vec<(Self, Self)>),
    Null,
    /// Set members; producers keep them sorted and unique.
    Set(Vec<Self>),
    Text(String),
    /// Milliseconds since the unix epoch.
    Timestamp(i64),
}

impl Value {
    /// Short variant label used in diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Blob(_) => "blob",
            Self::Bool(_) => "bool",
            Self::Counter(_) => "counter",
            Self::Double(_) => "double",
            Self::Int(_) => "int",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Null => "null",
            Self::Set(_) => "set",
            Self::Text(_) => "text",
            Self::Timestamp(_) => "timestamp",
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// True for containers the store persists as null when empty.
    ///
    /// Any scalar (including `Null`) or non-empty container returns false.
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        match self {
            Self::Blob(v) => v.is_empty(),
            Self::List(v) | Self::Set(v) => v.is_empty(),
            Self::Map(v) => v.is_empty(),
            _ => false,
        }
    }

    /// True when a lookup argument should be treated as "not supplied".
    #[must_use]
    pub fn is_absent(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Substitute the clustering sentinel for an empty text or blob.
    #[must_use]
    pub fn with_sentinel(self) -> Self {
        match self {
            Self::Text(s) if s.is_empty() => Self::Text(CLUSTERING_SENTINEL.to_string()),
            Self::Blob(b) if b.is_empty() => Self::Blob(CLUSTERING_SENTINEL.as_bytes().to_vec()),
            other => other,
        }
    }

    /// Rewrite a clustering sentinel back to the empty text or blob.
    #[must_use]
    pub fn without_sentinel(self) -> Self {
        match self {
            Self::Text(s) if s == CLUSTERING_SENTINEL => Self::Text(String::new()),
            Self::Blob(b) if b == CLUSTERING_SENTINEL.as_bytes() => Self::Blob(Vec::new()),
            other => other,
        }
    }

    /// Borrow the text payload, if any.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Build a canonical set value: sorted and de-duplicated.
    #[must_use]
    pub fn set_from(items: impl IntoIterator<Item = Self>) -> Self {
        let mut items: Vec<Self> = items.into_iter().collect();
        items.sort_by(canonical_cmp);
        items.dedup();

        Self::Set(items)
    }

    /// Build a canonical map value: entries sorted by key, last key wins.
    #[must_use]
    pub fn map_from(entries: impl IntoIterator<Item = (Self, Self)>) -> Self {
        let mut entries: Vec<(Self, Self)> = entries.into_iter().collect();
        entries.sort_by(|a, b| canonical_cmp(&a.0, &b.0));

        let mut out: Vec<(Self, Self)> = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            match out.last_mut() {
                Some(last) if last.0 == key => last.1 = value,
                _ => out.push((key, value)),
            }
        }

        Self::Map(out)
    }
}

// ----------------------------------------------------------------------
// Conversions
// ----------------------------------------------------------------------

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Self::Blob(value)
    }
}

///
/// lookup
///
/// Case-insensitive field lookup; exact matches are preferred.
///

#[must_use]
pub fn lookup<'a>(map: &'a FieldMap, field: &str) -> Option<&'a Value> {
    map.get(field).or_else(|| {
        map.iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(field))
            .map(|(_, value)| value)
    })
}

///
/// normalize_fields
///
/// Lower-case every field name. Later duplicates (by case) win.
///

#[must_use]
pub fn normalize_fields(map: FieldMap) -> FieldMap {
    map.into_iter()
        .map(|(name, value)| (name.to_ascii_lowercase(), value))
        .collect()
}
